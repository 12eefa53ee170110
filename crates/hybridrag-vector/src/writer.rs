use anyhow::Result;
use arrow_array::{FixedSizeListArray, RecordBatch, RecordBatchIterator, StringArray};
use indicatif::{ProgressBar, ProgressStyle};
use lancedb::{connect, Connection};
use std::path::Path;
use std::sync::Arc;

use hybridrag_core::traits::Embedder;
use hybridrag_core::{Chunk, ChunkStore};

use crate::schema::build_arrow_schema;

const BATCH_SIZE: usize = 256;

/// Embeds chunks and appends them to a LanceDB table.
///
/// A table holds one corpus generation; write a new generation to a fresh
/// table name rather than appending to an old one.
pub struct LanceWriter { db: Connection, table_name: String, embedder: Arc<dyn Embedder> }

impl LanceWriter {
	pub async fn new(db_path: &Path, table_name: &str, embedder: Arc<dyn Embedder>) -> Result<Self> {
		let db = connect(db_path.to_string_lossy().as_ref()).execute().await?;
		Ok(Self { db, table_name: table_name.to_string(), embedder })
	}

	pub async fn write(&self, store: &ChunkStore) -> Result<usize> {
		if store.is_empty() { tracing::info!(table = %self.table_name, "no chunks to index"); return Ok(0); }
		tracing::info!(chunks = store.len(), table = %self.table_name, "indexing chunks into LanceDB");
		let pb = ProgressBar::new(store.len() as u64);
		pb.set_style(ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}")?.progress_chars("#>-"));
		let chunks: Vec<&Arc<Chunk>> = store.iter().collect();
		let mut processed = 0usize;
		for batch in chunks.chunks(BATCH_SIZE) {
			let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
			let embeddings = self.embedder.embed_batch(&texts)?;
			anyhow::ensure!(embeddings.len() == batch.len(), "embedder returned {} vectors for {} texts", embeddings.len(), batch.len());
			self.insert_batch(batch, &embeddings).await?;
			processed += batch.len();
			pb.set_position(processed as u64);
		}
		pb.finish_with_message("LanceDB indexing completed");
		tracing::info!(chunks = processed, table = %self.table_name, "LanceDB table written");
		Ok(processed)
	}

	async fn insert_batch(&self, chunks: &[&Arc<Chunk>], embeddings: &[Vec<f32>]) -> Result<()> {
		let record_batch = self.to_record_batch(chunks, embeddings)?; let schema = record_batch.schema();
		let reader = Box::new(RecordBatchIterator::new(vec![Ok(record_batch)].into_iter(), schema));
		if self.db.table_names().execute().await?.contains(&self.table_name) {
			self.db.open_table(&self.table_name).execute().await?.add(reader).execute().await?;
		} else {
			self.db.create_table(&self.table_name, reader).execute().await?;
		}
		Ok(())
	}

	fn to_record_batch(&self, chunks: &[&Arc<Chunk>], embeddings: &[Vec<f32>]) -> Result<RecordBatch> {
		let dim = i32::try_from(self.embedder.dim())?;
		let mut ids = Vec::with_capacity(chunks.len()); let mut sources = Vec::with_capacity(chunks.len()); let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::with_capacity(chunks.len());
		for (chunk, embedding) in chunks.iter().zip(embeddings) {
			anyhow::ensure!(embedding.len() == self.embedder.dim(), "embedding for '{}' has dim {}, expected {}", chunk.id, embedding.len(), dim);
			ids.push(chunk.id.clone()); sources.push(chunk.source.clone()); vectors.push(Some(embedding.iter().map(|&x| Some(x)).collect()));
		}
		let record_batch = RecordBatch::try_new(build_arrow_schema(dim), vec![
			Arc::new(StringArray::from(ids)),
			Arc::new(StringArray::from(sources)),
			Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(vectors.into_iter(), dim)),
		])?;
		Ok(record_batch)
	}
}
