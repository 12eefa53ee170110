//! Shared plumbing for the hybridrag binaries.
use std::path::PathBuf;

use hybridrag_core::config::{expand_path, Config};
use tracing_subscriber::EnvFilter;

/// Where the binaries find their data, from the `data` config section.
pub struct DataPaths {
    pub corpus: PathBuf,
    pub lancedb: PathBuf,
    pub table: String,
    pub embedding_dim: usize,
}

impl DataPaths {
    pub fn from_config(config: &Config) -> Self {
        let corpus: String = config.get("data.corpus_path").unwrap_or_else(|_| "data/chunks.jsonl".to_string());
        let lancedb: String = config.get("data.lancedb_dir").unwrap_or_else(|_| "data/indexes/lancedb".to_string());
        Self {
            corpus: expand_path(corpus),
            lancedb: expand_path(lancedb),
            table: config.get("data.table").unwrap_or_else(|_| "chunks".to_string()),
            embedding_dim: config.get("data.embedding_dim").unwrap_or(384),
        }
    }
}

/// `RUST_LOG` wins; otherwise info, or warn when `quiet`.
pub fn init_tracing(quiet: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(if quiet { "warn" } else { "info" }));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

/// Value following `flag`, parsed, or exit with a usage error.
pub fn flag_value<T: std::str::FromStr>(args: &[String], i: usize, flag: &str) -> T {
    match args.get(i + 1).map(|v| v.parse::<T>()) {
        Some(Ok(v)) => v,
        _ => {
            eprintln!("Error: {flag} requires a value");
            std::process::exit(2);
        }
    }
}
