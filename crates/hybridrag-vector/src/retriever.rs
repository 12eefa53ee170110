use anyhow::{anyhow, Result};
use arrow_array::{Float32Array, StringArray};
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{connect, Connection};
use std::path::Path;
use std::sync::Arc;

use hybridrag_core::traits::{Embedder, VectorRetriever};
use hybridrag_core::SearchHit;

use crate::schema::{DISTANCE_COLUMN, ID_COLUMN};

/// Flat vector search over a table written by `LanceWriter`.
///
/// Score is `1 / (1 + distance)`: in (0, 1], 1 for an exact match, so a
/// real hit never scores below a chunk the vector channel did not return.
pub struct LanceRetriever { db: Connection, table_name: String, embedder: Arc<dyn Embedder> }

impl LanceRetriever {
	pub async fn new(db_path: &Path, table_name: &str, embedder: Arc<dyn Embedder>) -> Result<Self> {
		let db = connect(db_path.to_string_lossy().as_ref()).execute().await?;
		Ok(Self { db, table_name: table_name.to_string(), embedder })
	}
}

#[async_trait]
impl VectorRetriever for LanceRetriever {
	async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>> {
		if k == 0 { return Ok(Vec::new()); }
		if !self.db.table_names().execute().await?.contains(&self.table_name) {
			tracing::debug!(table = %self.table_name, "vector table missing; returning no hits");
			return Ok(Vec::new());
		}
		let query_embedding = self
			.embedder
			.embed_batch(&[query.to_string()])?
			.pop()
			.ok_or_else(|| anyhow!("embedder returned no vector for the query"))?;
		let table = self.db.open_table(&self.table_name).execute().await?;
		let mut stream = table.vector_search(query_embedding)?.limit(k).execute().await?;
		let mut hits = Vec::new();
		while let Some(batch) = stream.try_next().await? {
			let ids = batch
				.column_by_name(ID_COLUMN)
				.and_then(|c| c.as_any().downcast_ref::<StringArray>())
				.ok_or_else(|| anyhow!("result batch has no utf8 '{}' column", ID_COLUMN))?;
			let distances = batch
				.column_by_name(DISTANCE_COLUMN)
				.and_then(|c| c.as_any().downcast_ref::<Float32Array>())
				.ok_or_else(|| anyhow!("result batch has no f32 '{}' column", DISTANCE_COLUMN))?;
			for i in 0..batch.num_rows() {
				hits.push(SearchHit::new(ids.value(i), similarity(distances.value(i))));
			}
		}
		hits.sort_by(|a, b| b.score.total_cmp(&a.score));
		hits.truncate(k);
		Ok(hits)
	}
}

fn similarity(distance: f32) -> f32 { 1.0 / (1.0 + distance.max(0.0)) }
