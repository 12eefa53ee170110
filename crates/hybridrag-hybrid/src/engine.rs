use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use hybridrag_cache::{CacheConfig, CacheParams, CacheStats, ResultCache, SweepReport};
use hybridrag_core::config::RetrievalSettings;
use hybridrag_core::traits::{CrossEncoder, VectorRetriever};
use hybridrag_core::{Chunk, Error, Result, ScoredChunk, SearchResult};

use crate::fusion::{self, validate_alpha};
use crate::generation::Generation;
use crate::rerank::Reranker;

pub type ResultsCache = ResultCache<Vec<SearchResult>>;

/// One retrieval call. `rerank: None` follows the configured default;
/// `timeout` overrides both the vector and the rerank deadline.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
    pub k: usize,
    pub alpha: f32,
    pub use_cache: bool,
    pub rerank: Option<bool>,
    pub timeout: Option<Duration>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, k: usize, alpha: f32) -> Self {
        Self { query: query.into(), k, alpha, use_cache: true, rerank: None, timeout: None }
    }

    pub fn without_cache(mut self) -> Self {
        self.use_cache = false;
        self
    }

    pub fn with_rerank(mut self, rerank: bool) -> Self {
        self.rerank = Some(rerank);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Hybrid vector + BM25 retrieval over the current corpus generation.
///
/// Both channels are asked for `oversample * k` candidates and run
/// concurrently: the vector call under its deadline, the BM25 pass on the
/// blocking pool. Results are fused, optionally reranked, and cached per
/// (query, k, alpha, rerank, corpus fingerprint).
pub struct HybridSearchEngine {
    generation: RwLock<Option<Arc<Generation>>>,
    generations: AtomicU64,
    vector: Arc<dyn VectorRetriever>,
    reranker: Reranker,
    cache: Option<Arc<ResultsCache>>,
    settings: RetrievalSettings,
}

impl HybridSearchEngine {
    pub fn new(vector: Arc<dyn VectorRetriever>, settings: RetrievalSettings) -> Self {
        let reranker = Reranker::new(None, settings.rerank_timeout());
        Self {
            generation: RwLock::new(None),
            generations: AtomicU64::new(0),
            vector,
            reranker,
            cache: None,
            settings,
        }
    }

    pub fn with_cross_encoder(mut self, scorer: Arc<dyn CrossEncoder>) -> Self {
        self.reranker = Reranker::new(Some(scorer), self.settings.rerank_timeout());
        self
    }

    pub fn with_cache(mut self, cache: Arc<ResultsCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Attach the cache described by `retrieval.cache`, if it is enabled.
    pub fn with_configured_cache(self) -> Result<Self> {
        if !self.settings.cache.enabled {
            tracing::info!("result cache disabled");
            return Ok(self);
        }
        let cache = ResultCache::new(CacheConfig::from(&self.settings.cache))?;
        Ok(self.with_cache(Arc::new(cache)))
    }

    pub fn settings(&self) -> &RetrievalSettings { &self.settings }

    pub fn reranker(&self) -> &Reranker { &self.reranker }

    /// Build a new generation from `chunks` and make it current.
    ///
    /// The index is built before the lock is taken; in-flight queries keep
    /// the generation they started with. Returns the new generation id.
    pub fn load_corpus(&self, chunks: Vec<Chunk>) -> Result<u64> {
        let id = self.generations.fetch_add(1, Ordering::SeqCst) + 1;
        let generation = Arc::new(Generation::build(id, chunks)?);
        tracing::info!(generation = id, chunks = generation.store.len(), fingerprint = %generation.fingerprint(), "corpus loaded");
        let mut slot = self.generation.write().map_err(|_| Error::Operation("generation lock poisoned".into()))?;
        *slot = Some(generation);
        Ok(id)
    }

    pub fn generation(&self) -> Option<Arc<Generation>> {
        self.generation.read().ok().and_then(|g| g.clone())
    }

    pub async fn search(&self, query: &str, k: usize, alpha: f32, use_cache: bool) -> Result<Vec<SearchResult>> {
        let mut request = SearchRequest::new(query, k, alpha);
        request.use_cache = use_cache;
        self.search_with(request).await
    }

    pub async fn search_with(&self, req: SearchRequest) -> Result<Vec<SearchResult>> {
        validate_k(req.k)?;
        validate_alpha(req.alpha)?;
        let generation = self.current()?;
        if generation.store.is_empty() {
            return Ok(Vec::new());
        }

        let rerank = req.rerank.unwrap_or(self.settings.rerank) && self.reranker.is_available();
        let params = CacheParams { k: req.k, alpha: req.alpha, rerank, corpus: generation.fingerprint().to_string() };
        let cache = if req.use_cache { self.cache.as_deref() } else { None };
        if let Some(cache) = cache {
            if let Some(hit) = cache.get(&req.query, &params) {
                tracing::debug!(k = req.k, alpha = req.alpha, "served from cache");
                return Ok(hit);
            }
        }

        let pool = if rerank { req.k.max(self.settings.rerank_candidates) } else { req.k };
        let vector_timeout = req.timeout.unwrap_or_else(|| self.settings.vector_timeout());
        let mut scored = self.fuse_in(&generation, &req.query, pool, req.alpha, vector_timeout).await?;
        if rerank {
            let rerank_timeout = req.timeout.unwrap_or_else(|| self.reranker.timeout());
            scored = self.reranker.rerank_within(&req.query, scored, req.k, rerank_timeout).await?;
        }

        let results: Vec<SearchResult> =
            scored.iter().map(|s| SearchResult::from_scored(s, self.settings.preview_chars)).collect();
        if let Some(cache) = cache {
            cache.put(&req.query, &params, results.clone());
        }
        tracing::debug!(k = req.k, alpha = req.alpha, rerank, returned = results.len(), "search finished");
        Ok(results)
    }

    /// Fused candidates for `query` without caching or reranking.
    pub async fn fuse(&self, query: &str, k: usize, alpha: f32) -> Result<Vec<ScoredChunk>> {
        validate_k(k)?;
        validate_alpha(alpha)?;
        let generation = self.current()?;
        if generation.store.is_empty() {
            return Ok(Vec::new());
        }
        self.fuse_in(&generation, query, k, alpha, self.settings.vector_timeout()).await
    }

    pub async fn rerank(&self, query: &str, candidates: Vec<ScoredChunk>, top_k: usize) -> Result<Vec<ScoredChunk>> {
        self.reranker.rerank(query, candidates, top_k).await
    }

    /// Drop every cached result. Returns the number of entries removed.
    pub fn invalidate_cache(&self) -> usize {
        self.cache.as_ref().map_or(0, |c| c.invalidate())
    }

    pub fn sweep_expired(&self) -> SweepReport {
        self.cache.as_ref().map(|c| c.sweep()).unwrap_or_default()
    }

    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(|c| c.stats())
    }

    fn current(&self) -> Result<Arc<Generation>> {
        let slot = self.generation.read().map_err(|_| Error::Operation("generation lock poisoned".into()))?;
        slot.clone().ok_or(Error::IndexUnavailable)
    }

    async fn fuse_in(
        &self,
        generation: &Arc<Generation>,
        query: &str,
        k: usize,
        alpha: f32,
        vector_timeout: Duration,
    ) -> Result<Vec<ScoredChunk>> {
        let fetch = k.saturating_mul(self.settings.oversample.max(1));
        let tokens = generation.lexical.tokenize(query);

        let lexical_gen = Arc::clone(generation);
        let lexical = tokio::task::spawn_blocking(move || lexical_gen.lexical.top(&tokens, fetch));
        let vector = tokio::time::timeout(vector_timeout, self.vector.similarity_search(query, fetch));
        let (vector, lexical) = tokio::join!(vector, lexical);

        let vector_hits = match vector {
            Err(_) => return Err(Error::RetrievalTimeout { stage: "vector", after: vector_timeout }),
            Ok(Err(e)) => return Err(Error::Retriever(format!("{e:#}"))),
            Ok(Ok(hits)) => hits,
        };
        let lexical_hits = lexical.map_err(|e| Error::Operation(format!("lexical pass failed: {e}")))??;
        tracing::debug!(
            generation = generation.id,
            vector = vector_hits.len(),
            lexical = lexical_hits.len(),
            fetch,
            "channels retrieved"
        );
        fusion::fuse(&generation.store, &vector_hits, &lexical_hits, k, alpha)
    }
}

fn validate_k(k: usize) -> Result<()> {
    if k == 0 {
        return Err(Error::InvalidParameter("k must be > 0".into()));
    }
    Ok(())
}
