//! Domain types shared by the lexical, vector and fusion stages.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub type ChunkId = String;

/// An indexed passage of a source document.
///
/// - `id`: unique within a corpus generation
/// - `text`: raw content used for lexical scoring and reranking
/// - `source`: originating document name
/// - `page`: page number inside the source, when known
/// - `sequence`: insertion order; the final tie-break of every ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub text: String,
    pub source: String,
    pub page: Option<u32>,
    pub sequence: usize,
}

impl Chunk {
    /// First `max_chars` characters of the text, cut on a char boundary.
    pub fn preview(&self, max_chars: usize) -> String {
        match self.text.char_indices().nth(max_chars) {
            Some((end, _)) => self.text[..end].to_string(),
            None => self.text.clone(),
        }
    }
}

/// The minimal surface returned by a vector retriever.
///
/// `id` matches `Chunk::id`. `score` is retriever-specific but higher is
/// always better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: ChunkId,
    pub score: f32,
}

impl SearchHit {
    pub fn new(id: impl Into<ChunkId>, score: f32) -> Self {
        Self { id: id.into(), score }
    }
}

/// A chunk with the per-channel scores it accumulated during one query.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Arc<Chunk>,
    pub vector_score: f32,
    pub lexical_score: f32,
    pub combined_score: f32,
    pub rerank_score: Option<f32>,
}

impl ScoredChunk {
    /// Score the caller sees: the cross-encoder's when reranked, else the fused one.
    pub fn final_score(&self) -> f32 {
        self.rerank_score.unwrap_or(self.combined_score)
    }
}

/// What `search` hands back to the answer layer. Also the cached form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub chunk_id: ChunkId,
    pub source: String,
    pub page: Option<u32>,
    pub text_preview: String,
    pub score: f32,
}

impl SearchResult {
    pub fn from_scored(scored: &ScoredChunk, preview_chars: usize) -> Self {
        Self {
            chunk_id: scored.chunk.id.clone(),
            source: scored.chunk.source.clone(),
            page: scored.chunk.page,
            text_preview: scored.chunk.preview(preview_chars),
            score: scored.final_score(),
        }
    }
}
