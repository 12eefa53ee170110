use std::collections::HashMap;

use hybridrag_core::{ChunkStore, Error, Result, ScoredChunk, SearchHit};

pub fn validate_alpha(alpha: f32) -> Result<()> {
    if alpha.is_finite() && (0.0..=1.0).contains(&alpha) {
        Ok(())
    } else {
        Err(Error::InvalidParameter(format!("alpha must be in [0, 1], got {alpha}")))
    }
}

#[derive(Default)]
struct Channels {
    vector: f32,
    lexical: f32,
    /// Seen by the vector channel or matched at least one query term.
    found: bool,
}

/// Weighted union of the vector and lexical channels, best `k` first.
///
/// `lexical_hits` are (store position, BM25) pairs. A chunk found by one
/// channel only scores 0 on the other. `combined = alpha * vector +
/// (1 - alpha) * lexical`; ties go to the earlier store position.
///
/// Zero-score lexical padding only fills the tail: it never displaces a chunk
/// either channel actually found, whatever the sign of the vector scores.
pub fn fuse(
    store: &ChunkStore,
    vector_hits: &[SearchHit],
    lexical_hits: &[(usize, f32)],
    k: usize,
    alpha: f32,
) -> Result<Vec<ScoredChunk>> {
    validate_alpha(alpha)?;
    let mut channels: HashMap<usize, Channels> = HashMap::with_capacity(vector_hits.len() + lexical_hits.len());

    for hit in vector_hits {
        if !hit.score.is_finite() {
            tracing::warn!(id = %hit.id, score = hit.score, "dropping vector hit with non-finite score");
            continue;
        }
        let Some(pos) = store.position(&hit.id) else {
            tracing::debug!(id = %hit.id, "vector hit not in the current generation");
            continue;
        };
        let slot = channels.entry(pos).or_insert(Channels { vector: f32::NEG_INFINITY, ..Channels::default() });
        slot.vector = slot.vector.max(hit.score);
        slot.found = true;
    }
    for &(pos, score) in lexical_hits {
        if pos < store.len() {
            let slot = channels.entry(pos).or_default();
            slot.lexical = score;
            slot.found |= score > 0.0;
        }
    }

    let mut fused: Vec<(usize, bool, ScoredChunk)> = channels
        .into_iter()
        .filter_map(|(pos, ch)| {
            store.get(pos).map(|chunk| {
                let scored = ScoredChunk {
                    chunk: chunk.clone(),
                    vector_score: ch.vector,
                    lexical_score: ch.lexical,
                    combined_score: alpha * ch.vector + (1.0 - alpha) * ch.lexical,
                    rerank_score: None,
                };
                (pos, ch.found, scored)
            })
        })
        .collect();
    fused.sort_by(|(pos_a, found_a, a), (pos_b, found_b, b)| {
        found_b
            .cmp(found_a)
            .then_with(|| b.combined_score.total_cmp(&a.combined_score))
            .then_with(|| pos_a.cmp(pos_b))
    });
    fused.truncate(k);
    Ok(fused.into_iter().map(|(_, _, scored)| scored).collect())
}
