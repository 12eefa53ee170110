use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, Occur, Query, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, Value};
use tantivy::tokenizer::{TextAnalyzer, TokenStream};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};

use hybridrag_core::{ChunkStore, Error, Result};

use crate::tantivy_utils::{build_schema, chunk_analyzer, register_tokenizer, SEQ_FIELD, TEXT_FIELD};

const WRITER_MEMORY_BYTES: usize = 50_000_000;

/// BM25 statistics over every chunk of one store, built once.
///
/// Read-only after `build`; `score` and `top` take `&self` and are safe to
/// call from many threads.
pub struct LexicalIndex {
	reader: IndexReader,
	analyzer: TextAnalyzer,
	seq_field: Field,
	text_field: Field,
	num_docs: usize,
	queries: AtomicU64,
}

fn lexical(e: tantivy::TantivyError) -> Error { Error::Lexical(e.to_string()) }

impl LexicalIndex {
	pub fn build(store: &ChunkStore) -> Result<Self> {
		let schema = build_schema();
		let index = Index::create_in_ram(schema.clone());
		register_tokenizer(&index);
		let seq_field = schema.get_field(SEQ_FIELD).map_err(lexical)?;
		let text_field = schema.get_field(TEXT_FIELD).map_err(lexical)?;

		// One indexing thread keeps a single segment for small corpora.
		let mut writer: IndexWriter = index.writer_with_num_threads(1, WRITER_MEMORY_BYTES).map_err(lexical)?;
		for (pos, chunk) in store.iter().enumerate() {
			writer.add_document(doc!(
				seq_field => pos as u64,
				text_field => chunk.text.clone(),
			)).map_err(lexical)?;
		}
		writer.commit().map_err(lexical)?;

		let reader = index.reader_builder().reload_policy(ReloadPolicy::Manual).try_into().map_err(lexical)?;
		tracing::debug!(chunks = store.len(), "lexical index built");
		Ok(Self { reader, analyzer: chunk_analyzer(), seq_field, text_field, num_docs: store.len(), queries: AtomicU64::new(0) })
	}

	pub fn len(&self) -> usize { self.num_docs }

	pub fn is_empty(&self) -> bool { self.num_docs == 0 }

	/// Number of scoring passes served since the index was built.
	pub fn query_count(&self) -> u64 { self.queries.load(Ordering::Relaxed) }

	/// Same tokenization the chunks were indexed with.
	pub fn tokenize(&self, text: &str) -> Vec<String> {
		let mut analyzer = self.analyzer.clone();
		let mut stream = analyzer.token_stream(text);
		let mut tokens = Vec::new();
		while stream.advance() { tokens.push(stream.token().text.clone()); }
		tokens
	}

	/// BM25 score per store position, for every chunk sharing a term with
	/// `tokens`. Chunks with no overlap are absent.
	pub fn score(&self, tokens: &[String]) -> Result<HashMap<usize, f32>> {
		self.queries.fetch_add(1, Ordering::Relaxed);
		if tokens.is_empty() || self.num_docs == 0 { return Ok(HashMap::new()); }
		let clauses: Vec<(Occur, Box<dyn Query>)> = tokens
			.iter()
			.map(|t| {
				let term = Term::from_field_text(self.text_field, t);
				(Occur::Should, Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs)) as Box<dyn Query>)
			})
			.collect();
		let query = BooleanQuery::new(clauses);
		let searcher = self.reader.searcher();
		let top_docs = searcher.search(&query, &TopDocs::with_limit(self.num_docs)).map_err(lexical)?;
		let mut scores = HashMap::with_capacity(top_docs.len());
		for (score, addr) in top_docs {
			let doc: TantivyDocument = searcher.doc(addr).map_err(lexical)?;
			let pos = doc
				.get_first(self.seq_field)
				.and_then(|v| v.as_u64())
				.ok_or_else(|| Error::Lexical("indexed document without seq".into()))?;
			scores.insert(pos as usize, score);
		}
		Ok(scores)
	}

	/// The best `n` chunks of the whole corpus by BM25, missing scores as 0.
	///
	/// Ties (including the zero tail) go to the lower store position. An
	/// empty token list yields nothing: no chunk is lexically relevant then.
	pub fn top(&self, tokens: &[String], n: usize) -> Result<Vec<(usize, f32)>> {
		if tokens.is_empty() || n == 0 { return Ok(Vec::new()); }
		let mut ranked: Vec<(usize, f32)> = self.score(tokens)?.into_iter().collect();
		ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
		if ranked.len() < n {
			let seen: HashSet<usize> = ranked.iter().map(|(pos, _)| *pos).collect();
			let missing = n - ranked.len();
			ranked.extend((0..self.num_docs).filter(|pos| !seen.contains(pos)).take(missing).map(|pos| (pos, 0.0)));
		}
		ranked.truncate(n);
		Ok(ranked)
	}
}
