use chrono::Duration as ChronoDuration;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hybridrag_core::config::CacheSettings;
use hybridrag_core::{Error, Result};

use crate::clock::{Clock, SystemClock};
use crate::entry::{CacheEntry, FORMAT_VERSION};
use crate::key::{cache_key, CacheParams};

const ENTRY_EXT: &str = "json";

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub ttl: Duration,
    /// Write-through directory; `None` keeps the cache in memory only.
    pub dir: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl: Duration::from_secs(24 * 60 * 60), dir: None }
    }
}

impl From<&CacheSettings> for CacheConfig {
    fn from(settings: &CacheSettings) -> Self {
        Self { ttl: settings.ttl(), dir: settings.resolved_dir() }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Outcome of a `sweep`, counted in distinct keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub expired: usize,
    pub corrupt: usize,
    pub retained: usize,
}

/// Concurrent (query, params) → result cache with TTL expiry.
///
/// The in-memory map is sharded, so requests on different keys do not
/// contend. With a directory configured every `put` is also written as
/// `<key>.json` through a temp file and rename; `get` falls back to that
/// file on a memory miss, which is how entries survive restarts.
pub struct ResultCache<T> {
    entries: DashMap<String, CacheEntry<T>>,
    ttl: ChronoDuration,
    dir: Option<PathBuf>,
    clock: Arc<dyn Clock>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<T> ResultCache<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync,
{
    pub fn new(config: CacheConfig) -> Result<Self> {
        let ttl = ChronoDuration::from_std(config.ttl).map_err(|e| Error::InvalidConfig(format!("cache ttl: {e}")))?;
        if ttl <= ChronoDuration::zero() {
            return Err(Error::InvalidConfig("cache ttl must be > 0".into()));
        }
        if let Some(dir) = &config.dir {
            fs::create_dir_all(dir)?;
        }
        Ok(Self {
            entries: DashMap::new(),
            ttl,
            dir: config.dir,
            clock: Arc::new(SystemClock),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn ttl(&self) -> Duration { self.ttl.to_std().unwrap_or_default() }

    /// Fresh result for (query, params), or `None`. Stale and corrupt
    /// entries found on the way are deleted.
    ///
    /// File removals happen under the key's shard lock, the same lock `put`
    /// holds while persisting, so a concurrent `put` is never unlinked.
    pub fn get(&self, query: &str, params: &CacheParams) -> Option<T> {
        let key = cache_key(query, params);
        let now = self.clock.now();

        let in_memory = self.entries.get(&key).map(|e| e.is_fresh(now, self.ttl).then(|| e.result.clone()));
        match in_memory {
            Some(Some(result)) => return Some(self.hit(result)),
            Some(None) => {
                self.entries.remove_if(&key, |_, e| {
                    let stale = !e.is_fresh(now, self.ttl);
                    if stale {
                        self.remove_file(&key);
                    }
                    stale
                });
                tracing::debug!(key = %key, "cache entry expired");
                return self.miss();
            }
            None => {}
        }
        if self.dir.is_none() {
            return self.miss();
        }

        match self.entries.entry(key.clone()) {
            Entry::Occupied(current) => {
                // A put landed since the lookup above.
                if current.get().is_fresh(now, self.ttl) {
                    let result = current.get().result.clone();
                    return Some(self.hit(result));
                }
                self.miss()
            }
            Entry::Vacant(slot) => match self.load_file(&key) {
                Some(entry) if entry.is_fresh(now, self.ttl) => {
                    let result = entry.result.clone();
                    slot.insert(entry);
                    Some(self.hit(result))
                }
                Some(_) => {
                    self.remove_file(&key);
                    self.miss()
                }
                None => self.miss(),
            },
        }
    }

    /// Store `result` stamped with the current time, replacing any entry
    /// under the same key. Persistence failures are logged, never returned.
    pub fn put(&self, query: &str, params: &CacheParams, result: T) {
        let key = cache_key(query, params);
        let entry = CacheEntry::new(key.clone(), query, params.clone(), result, self.clock.now());
        let slot = self.entries.entry(key);
        if let Err(e) = self.write_file(&entry) {
            tracing::warn!(key = %entry.key, error = %e, "failed to persist cache entry; keeping it in memory");
        }
        slot.insert(entry);
    }

    /// Remove every stale entry, and every persisted entry that no longer
    /// deserializes.
    pub fn sweep(&self) -> SweepReport {
        let now = self.clock.now();
        let mut expired: HashSet<String> = HashSet::new();
        let mut corrupt = 0usize;
        let mut retained: HashSet<String> = HashSet::new();

        self.entries.retain(|key, entry| {
            if entry.is_fresh(now, self.ttl) {
                retained.insert(key.clone());
                true
            } else {
                expired.insert(key.clone());
                false
            }
        });

        for (key, path) in self.entry_files() {
            match self.read_file(&key, &path) {
                Ok(entry) if entry.is_fresh(now, self.ttl) => { retained.insert(key); }
                Ok(_) => {
                    // Only unlink when no put has claimed the key meanwhile.
                    if let Entry::Vacant(_slot) = self.entries.entry(key.clone()) {
                        remove_quietly(&path);
                        expired.insert(key);
                    } else {
                        retained.insert(key);
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "removing corrupt cache entry");
                    remove_quietly(&path);
                    corrupt += 1;
                }
            }
        }

        let report = SweepReport { expired: expired.len(), corrupt, retained: retained.len() };
        tracing::info!(expired = report.expired, corrupt = report.corrupt, retained = report.retained, "cache sweep finished");
        report
    }

    /// Drop everything, in memory and on disk. Returns distinct keys removed.
    pub fn invalidate(&self) -> usize {
        let mut removed: HashSet<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        self.entries.clear();
        for (key, path) in self.entry_files() {
            remove_quietly(&path);
            removed.insert(key);
        }
        tracing::info!(removed = removed.len(), "cache invalidated");
        removed.len()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.len(),
        }
    }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    fn hit(&self, result: T) -> T {
        self.hits.fetch_add(1, Ordering::Relaxed);
        result
    }

    fn miss(&self) -> Option<T> {
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    fn path_for(&self, key: &str) -> Option<PathBuf> {
        self.dir.as_ref().map(|d| d.join(format!("{key}.{ENTRY_EXT}")))
    }

    fn write_file(&self, entry: &CacheEntry<T>) -> io::Result<()> {
        let (Some(dir), Some(path)) = (self.dir.as_ref(), self.path_for(&entry.key)) else { return Ok(()) };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer(&mut tmp, entry)?;
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok(())
    }

    fn load_file(&self, key: &str) -> Option<CacheEntry<T>> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return None;
        }
        match self.read_file(key, &path) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(error = %e, "removing corrupt cache entry");
                remove_quietly(&path);
                None
            }
        }
    }

    fn read_file(&self, key: &str, path: &Path) -> Result<CacheEntry<T>> {
        let corrupt = |reason: String| Error::CacheCorrupt { key: key.to_string(), reason };
        let bytes = fs::read(path)?;
        let entry: CacheEntry<T> = serde_json::from_slice(&bytes).map_err(|e| corrupt(e.to_string()))?;
        if entry.version != FORMAT_VERSION {
            return Err(corrupt(format!("format version {} (expected {})", entry.version, FORMAT_VERSION)));
        }
        if entry.key != key {
            return Err(corrupt(format!("stored under key {}", entry.key)));
        }
        Ok(entry)
    }

    fn remove_file(&self, key: &str) {
        if let Some(path) = self.path_for(key) {
            remove_quietly(&path);
        }
    }

    /// (key, path) of every persisted entry. Temp files are skipped.
    fn entry_files(&self) -> Vec<(String, PathBuf)> {
        let Some(dir) = self.dir.as_ref() else { return Vec::new() };
        let read_dir = match fs::read_dir(dir) {
            Ok(rd) => rd,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "cannot list cache directory");
                return Vec::new();
            }
        };
        read_dir
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && p.extension().and_then(|s| s.to_str()) == Some(ENTRY_EXT))
            .filter_map(|p| {
                let key = p.file_stem()?.to_str()?.to_string();
                Some((key, p))
            })
            .collect()
    }
}

fn remove_quietly(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != io::ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove cache file");
        }
    }
}
