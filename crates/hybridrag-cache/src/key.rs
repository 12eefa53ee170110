use serde::{Deserialize, Serialize};

/// Everything besides the query text that changes what a search returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheParams {
    pub k: usize,
    pub alpha: f32,
    pub rerank: bool,
    /// Fingerprint of the corpus generation the result was computed against.
    pub corpus: String,
}

/// Trim and collapse runs of whitespace. Case is preserved.
pub fn normalize_query(query: &str) -> String {
    query.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Hex blake3 digest of the normalized query and every parameter.
pub fn cache_key(query: &str, params: &CacheParams) -> String {
    // -0.0 and 0.0 must share a key.
    let alpha = if params.alpha == 0.0 { 0.0f32 } else { params.alpha };
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"hybridrag-result\0");
    hasher.update(normalize_query(query).as_bytes());
    hasher.update(&[0]);
    hasher.update(&(params.k as u64).to_le_bytes());
    hasher.update(&alpha.to_bits().to_le_bytes());
    hasher.update(&[u8::from(params.rerank)]);
    hasher.update(params.corpus.as_bytes());
    hasher.finalize().to_hex().to_string()
}
