use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::key::CacheParams;

/// Bumped whenever the persisted layout changes; other versions read as corrupt.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub version: u32,
    pub key: String,
    pub query: String,
    pub params: CacheParams,
    pub result: T,
    pub created_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    pub fn new(key: String, query: &str, params: CacheParams, result: T, created_at: DateTime<Utc>) -> Self {
        Self { version: FORMAT_VERSION, key, query: query.to_string(), params, result, created_at }
    }

    /// Valid for reads only while `now - created_at < ttl`.
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now.signed_duration_since(self.created_at) < ttl
    }
}
