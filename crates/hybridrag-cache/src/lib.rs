//! hybridrag-cache
//!
//! Result cache keyed by a digest of (query, parameters), with TTL expiry,
//! an invalidation sweep and optional write-through persistence as versioned
//! JSON documents.
pub mod clock;
pub mod entry;
pub mod key;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use key::{cache_key, normalize_query, CacheParams};
pub use store::{CacheConfig, CacheStats, ResultCache, SweepReport};
