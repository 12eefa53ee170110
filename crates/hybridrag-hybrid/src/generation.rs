use std::sync::Arc;

use hybridrag_core::{Chunk, ChunkStore, Result};
use hybridrag_text::LexicalIndex;

/// One immutable corpus snapshot: the chunks and the BM25 index over them.
///
/// Queries hold an `Arc<Generation>` for their whole run, so a concurrent
/// reload never shows them a half-built index.
pub struct Generation {
    pub id: u64,
    pub store: Arc<ChunkStore>,
    pub lexical: LexicalIndex,
}

impl Generation {
    pub fn build(id: u64, chunks: Vec<Chunk>) -> Result<Self> {
        let store = ChunkStore::from_chunks(chunks)?;
        let lexical = LexicalIndex::build(&store)?;
        Ok(Self { id, store: Arc::new(store), lexical })
    }

    pub fn fingerprint(&self) -> &str { self.store.fingerprint() }
}
