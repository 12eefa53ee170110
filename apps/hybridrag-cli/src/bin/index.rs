use std::sync::Arc;
use std::{env, fs, path::PathBuf};

use hybridrag_cli::{flag_value, init_tracing, DataPaths};
use hybridrag_core::config::Config;
use hybridrag_core::corpus::load_jsonl;
use hybridrag_core::traits::Embedder;
use hybridrag_core::ChunkStore;
use hybridrag_vector::{HashEmbedder, LanceWriter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing(false);
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let mut paths = DataPaths::from_config(&config);

    let args: Vec<String> = env::args().skip(1).collect();
    let mut fresh = false;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--fresh" => fresh = true,
            "--table" => { paths.table = flag_value(&args, i, "--table"); i += 1; }
            "--dim" => { paths.embedding_dim = flag_value(&args, i, "--dim"); i += 1; }
            "--db" => { paths.lancedb = PathBuf::from(flag_value::<String>(&args, i, "--db")); i += 1; }
            "-h" | "--help" => {
                println!("Usage: hybridrag-index [corpus.jsonl] [--table NAME] [--dim N] [--db DIR] [--fresh]");
                return Ok(());
            }
            a if !a.starts_with('-') => paths.corpus = PathBuf::from(a),
            other => tracing::warn!(flag = other, "ignoring unknown flag"),
        }
        i += 1;
    }

    println!("hybridrag indexer\n=================");
    println!("Corpus: {}", paths.corpus.display());
    println!("LanceDB: {} (table '{}', dim {})", paths.lancedb.display(), paths.table, paths.embedding_dim);

    let store = ChunkStore::from_chunks(load_jsonl(&paths.corpus)?)?;
    if store.is_empty() {
        println!("Corpus is empty; nothing to index.");
        return Ok(());
    }

    if fresh && paths.lancedb.exists() { fs::remove_dir_all(&paths.lancedb)?; }
    fs::create_dir_all(&paths.lancedb)?;

    let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::new(paths.embedding_dim));
    let writer = LanceWriter::new(&paths.lancedb, &paths.table, embedder).await?;
    let written = writer.write(&store).await?;

    println!("\nIndexed {} chunks (corpus fingerprint {})", written, store.fingerprint());
    println!("To search, use: cargo run --bin hybridrag-search -- '<query>'");
    Ok(())
}
