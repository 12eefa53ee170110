use async_trait::async_trait;

use crate::types::SearchHit;

pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Nearest-neighbour search over chunk embeddings.
///
/// Returns at most `k` hits, best first. Scores are only assumed monotonic.
#[async_trait]
pub trait VectorRetriever: Send + Sync {
    async fn similarity_search(&self, query: &str, k: usize) -> anyhow::Result<Vec<SearchHit>>;
}

/// Joint (query, passage) relevance scorer.
#[async_trait]
pub trait CrossEncoder: Send + Sync {
    async fn score(&self, query: &str, text: &str) -> anyhow::Result<f32>;

    /// Scores in the order of `texts`. Defaults to concurrent single scores.
    async fn score_batch(&self, query: &str, texts: &[&str]) -> anyhow::Result<Vec<f32>> {
        futures::future::try_join_all(texts.iter().map(|t| self.score(query, t))).await
    }
}
