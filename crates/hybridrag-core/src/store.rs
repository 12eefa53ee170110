use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::Chunk;

/// Ordered, immutable collection of the chunks of one corpus generation.
///
/// Positions (`0..len`) are what the lexical index refers to; they follow
/// `Chunk::sequence`. Everything downstream holds `Arc<Chunk>` or a position,
/// never a copy of the text.
#[derive(Debug, Default)]
pub struct ChunkStore {
    chunks: Vec<Arc<Chunk>>,
    by_id: HashMap<String, usize>,
    fingerprint: String,
}

impl ChunkStore {
    /// Build a store, ordering by `sequence` and rejecting duplicate ids.
    /// Chunks sharing a sequence keep their input order, so store positions
    /// are always a strict order.
    pub fn from_chunks(mut chunks: Vec<Chunk>) -> Result<Self> {
        chunks.sort_by_key(|c| c.sequence);
        let mut by_id = HashMap::with_capacity(chunks.len());
        let mut hasher = blake3::Hasher::new();
        for (pos, chunk) in chunks.iter().enumerate() {
            if chunk.id.is_empty() {
                return Err(Error::InvalidParameter(format!("chunk at sequence {} has an empty id", chunk.sequence)));
            }
            if by_id.insert(chunk.id.clone(), pos).is_some() {
                return Err(Error::InvalidParameter(format!("duplicate chunk id '{}'", chunk.id)));
            }
            hasher.update(chunk.id.as_bytes());
            hasher.update(&[0x1f]);
            hasher.update(chunk.text.as_bytes());
            hasher.update(&[0x1e]);
        }
        let fingerprint = hasher.finalize().to_hex().to_string();
        let chunks = chunks.into_iter().map(Arc::new).collect();
        Ok(Self { chunks, by_id, fingerprint })
    }

    pub fn len(&self) -> usize { self.chunks.len() }

    pub fn is_empty(&self) -> bool { self.chunks.is_empty() }

    pub fn get(&self, pos: usize) -> Option<&Arc<Chunk>> { self.chunks.get(pos) }

    pub fn position(&self, id: &str) -> Option<usize> { self.by_id.get(id).copied() }

    pub fn by_id(&self, id: &str) -> Option<&Arc<Chunk>> { self.position(id).and_then(|p| self.chunks.get(p)) }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Chunk>> { self.chunks.iter() }

    /// Stable digest of ids and texts in order. Same corpus, same fingerprint.
    pub fn fingerprint(&self) -> &str { &self.fingerprint }
}
