//! hybridrag-core
//!
//! Shared domain types, the chunk store, collaborator traits, errors and
//! configuration for the hybrid retrieval crates.
#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod config;
pub mod corpus;
pub mod error;
pub mod store;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use store::ChunkStore;
pub use types::{Chunk, ChunkId, ScoredChunk, SearchHit, SearchResult};
