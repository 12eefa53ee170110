//! hybridrag-hybrid
//!
//! The retrieval path: corpus generations, weighted vector/BM25 fusion,
//! cross-encoder reranking and the cached `search` entry point.
pub mod engine;
pub mod eval;
pub mod fusion;
pub mod generation;
pub mod rerank;

pub use engine::{HybridSearchEngine, SearchRequest};
pub use fusion::{fuse, validate_alpha};
pub use generation::Generation;
pub use rerank::Reranker;
