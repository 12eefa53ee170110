//! Layered configuration and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (`__` separates nested keys, e.g.
//! `APP_RETRIEVAL__CACHE__TTL_SECS=60`). Provides helpers to expand `~` and
//! `${VAR}` and to resolve relative paths against a known base directory.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = defaults().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.validate_for_env(&env_name)?;
        Ok(config)
    }

    /// Layer an arbitrary provider stack over the built-in defaults.
    pub fn from_figment(figment: Figment) -> Self {
        Self { figment: defaults().merge(figment) }
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// The typed `retrieval` section, validated.
    pub fn retrieval(&self) -> Result<RetrievalSettings> {
        let settings: RetrievalSettings = self
            .figment
            .extract_inner("retrieval")
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate_for_env(&self, env: &str) -> anyhow::Result<()> {
        let settings = self.retrieval()?;
        match env {
            "prod" | "production" => {
                if settings.cache.enabled && settings.cache.dir.is_none() {
                    tracing::warn!("result cache is memory-only in production; set retrieval.cache.dir to persist it");
                }
            }
            "dev" | "development" | "test" | "testing" => {}
            _ => {}
        }
        Ok(())
    }
}

fn defaults() -> Figment {
    Figment::from(Serialized::default("retrieval", RetrievalSettings::default()))
}

/// Tunables of the retrieval path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub default_k: usize,
    pub default_alpha: f32,
    /// Candidates requested per channel = `oversample * k`.
    pub oversample: usize,
    pub preview_chars: usize,
    pub vector_timeout_ms: u64,
    pub rerank_timeout_ms: u64,
    pub rerank: bool,
    pub rerank_candidates: usize,
    pub cache: CacheSettings,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            default_k: 5,
            default_alpha: 0.5,
            oversample: 2,
            preview_chars: 200,
            vector_timeout_ms: 10_000,
            rerank_timeout_ms: 10_000,
            rerank: false,
            rerank_candidates: 20,
            cache: CacheSettings::default(),
        }
    }
}

impl RetrievalSettings {
    pub fn vector_timeout(&self) -> Duration { Duration::from_millis(self.vector_timeout_ms) }

    pub fn rerank_timeout(&self) -> Duration { Duration::from_millis(self.rerank_timeout_ms) }

    pub fn validate(&self) -> Result<()> {
        if self.default_k == 0 {
            return Err(Error::InvalidConfig("retrieval.default_k must be > 0".into()));
        }
        if !(0.0..=1.0).contains(&self.default_alpha) {
            return Err(Error::InvalidConfig(format!("retrieval.default_alpha must be in [0, 1], got {}", self.default_alpha)));
        }
        if self.oversample == 0 {
            return Err(Error::InvalidConfig("retrieval.oversample must be > 0".into()));
        }
        if self.cache.ttl_secs == 0 {
            return Err(Error::InvalidConfig("retrieval.cache.ttl_secs must be > 0".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,
    pub ttl_secs: u64,
    /// Directory for persisted entries; memory-only when unset.
    pub dir: Option<String>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self { enabled: true, ttl_secs: 24 * 60 * 60, dir: None }
    }
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration { Duration::from_secs(self.ttl_secs) }

    pub fn resolved_dir(&self) -> Option<PathBuf> { self.dir.as_deref().map(expand_path) }
}

/// `~` and `$VAR` / `${VAR}` expansion. Unknown variables are left as written.
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
