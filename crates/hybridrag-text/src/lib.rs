//! hybridrag-text
//!
//! BM25 lexical index over a chunk store, backed by an in-RAM Tantivy index.
//! See `index` for the scoring surface and `tantivy_utils` for the schema and
//! tokenizer.
pub mod index;
pub mod tantivy_utils;

pub use index::LexicalIndex;
