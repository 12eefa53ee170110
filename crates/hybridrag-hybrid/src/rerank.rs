use std::sync::Arc;
use std::time::Duration;

use hybridrag_core::traits::CrossEncoder;
use hybridrag_core::{Error, Result, ScoredChunk};

/// Reorders an already-retrieved shortlist with a cross-encoder.
///
/// Output is always a subsequence of the input of length
/// `min(top_k, candidates.len())`. A missing or failing scorer degrades to
/// plain truncation; only a scorer that overruns its deadline fails the call.
pub struct Reranker {
    scorer: Option<Arc<dyn CrossEncoder>>,
    timeout: Duration,
}

impl Reranker {
    pub fn new(scorer: Option<Arc<dyn CrossEncoder>>, timeout: Duration) -> Self {
        Self { scorer, timeout }
    }

    pub fn disabled() -> Self { Self::new(None, Duration::ZERO) }

    pub fn is_available(&self) -> bool { self.scorer.is_some() }

    pub fn timeout(&self) -> Duration { self.timeout }

    pub async fn rerank(&self, query: &str, candidates: Vec<ScoredChunk>, top_k: usize) -> Result<Vec<ScoredChunk>> {
        self.rerank_within(query, candidates, top_k, self.timeout).await
    }

    pub async fn rerank_within(
        &self,
        query: &str,
        mut candidates: Vec<ScoredChunk>,
        top_k: usize,
        timeout: Duration,
    ) -> Result<Vec<ScoredChunk>> {
        let Some(scorer) = &self.scorer else {
            tracing::debug!("no cross-encoder configured; keeping fused order");
            candidates.truncate(top_k);
            return Ok(candidates);
        };
        if candidates.is_empty() || top_k == 0 {
            candidates.truncate(top_k);
            return Ok(candidates);
        }

        let outcome = {
            let texts: Vec<&str> = candidates.iter().map(|c| c.chunk.text.as_str()).collect();
            tokio::time::timeout(timeout, scorer.score_batch(query, &texts)).await
        };
        let scores = match outcome {
            Err(_) => return Err(Error::RetrievalTimeout { stage: "rerank", after: timeout }),
            Ok(Err(e)) => return Ok(degrade(candidates, top_k, &Error::RerankUnavailable(e.to_string()))),
            Ok(Ok(scores)) if scores.len() != candidates.len() => {
                let reason = format!("scorer returned {} scores for {} candidates", scores.len(), candidates.len());
                return Ok(degrade(candidates, top_k, &Error::RerankUnavailable(reason)));
            }
            Ok(Ok(scores)) => scores,
        };

        let mut reranked: Vec<ScoredChunk> = candidates
            .into_iter()
            .zip(scores)
            .map(|(mut c, s)| {
                c.rerank_score = Some(finite_score(s));
                c
            })
            .collect();
        // Stable: equal scores keep their fused order.
        reranked.sort_by(|a, b| b.final_score().total_cmp(&a.final_score()));
        reranked.truncate(top_k);
        tracing::debug!(kept = reranked.len(), "reranked candidates");
        Ok(reranked)
    }
}

/// Scores end up in persisted cache entries, where JSON has no NaN or
/// infinity. NaN sorts last.
fn finite_score(score: f32) -> f32 {
    if score.is_nan() { f32::MIN } else { score.clamp(f32::MIN, f32::MAX) }
}

fn degrade(mut candidates: Vec<ScoredChunk>, top_k: usize, err: &Error) -> Vec<ScoredChunk> {
    tracing::warn!(error = %err, "reranking skipped");
    candidates.truncate(top_k);
    candidates
}
