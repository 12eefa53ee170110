//! hybridrag-vector
//!
//! LanceDB adapter for the vector channel: `LanceWriter` embeds a chunk store
//! into a table and `LanceRetriever` answers `VectorRetriever` queries
//! against it. `HashEmbedder` is a deterministic stand-in model.
pub mod embed;
pub mod retriever;
pub mod schema;
pub mod writer;

pub use embed::HashEmbedder;
pub use retriever::LanceRetriever;
pub use writer::LanceWriter;
