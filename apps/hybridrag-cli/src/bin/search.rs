use std::sync::Arc;
use std::{env, path::PathBuf};

use hybridrag_cli::{flag_value, init_tracing, DataPaths};
use hybridrag_core::config::Config;
use hybridrag_core::corpus::load_jsonl;
use hybridrag_hybrid::eval::source_accuracy;
use hybridrag_hybrid::{HybridSearchEngine, SearchRequest};
use hybridrag_vector::{HashEmbedder, LanceRetriever};

enum Command {
    Query(String),
    Sweep,
    Invalidate,
}

fn usage() {
    eprintln!("Usage: hybridrag-search <query> [-k N] [--alpha A] [--no-cache] [--corpus FILE] [--expect SOURCE]...");
    eprintln!("       hybridrag-search --sweep | --invalidate");
    eprintln!("Example: hybridrag-search 'rain water storage' -k 5 --alpha 0.3");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        usage();
        std::process::exit(1);
    }
    init_tracing(args.iter().any(|a| a == "--quiet" || a == "-q"));

    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let settings = config.retrieval()?;
    let mut paths = DataPaths::from_config(&config);

    let mut command = None;
    let mut k = settings.default_k;
    let mut alpha = settings.default_alpha;
    let mut use_cache = true;
    let mut expected: Vec<String> = Vec::new();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-k" | "--k" => { k = flag_value(&args, i, "-k"); i += 1; }
            "--alpha" => { alpha = flag_value(&args, i, "--alpha"); i += 1; }
            "--corpus" => { paths.corpus = PathBuf::from(flag_value::<String>(&args, i, "--corpus")); i += 1; }
            "--expect" => { expected.push(flag_value(&args, i, "--expect")); i += 1; }
            "--no-cache" => use_cache = false,
            "--sweep" => command = Some(Command::Sweep),
            "--invalidate" => command = Some(Command::Invalidate),
            "--quiet" | "-q" => {}
            "-h" | "--help" => { usage(); return Ok(()); }
            a if !a.starts_with('-') => command = Some(Command::Query(a.to_string())),
            other => tracing::warn!(flag = other, "ignoring unknown flag"),
        }
        i += 1;
    }
    let Some(command) = command else {
        usage();
        std::process::exit(1);
    };

    let embedder = Arc::new(HashEmbedder::new(paths.embedding_dim));
    let retriever = LanceRetriever::new(&paths.lancedb, &paths.table, embedder).await?;
    let engine = HybridSearchEngine::new(Arc::new(retriever), settings).with_configured_cache()?;

    match command {
        Command::Sweep => {
            let report = engine.sweep_expired();
            println!("Cache sweep: {} expired, {} corrupt, {} retained", report.expired, report.corrupt, report.retained);
        }
        Command::Invalidate => {
            println!("Cache invalidated: {} entries removed", engine.invalidate_cache());
        }
        Command::Query(query) => {
            engine.load_corpus(load_jsonl(&paths.corpus)?)?;
            let mut request = SearchRequest::new(query.as_str(), k, alpha);
            request.use_cache = use_cache;
            let results = engine.search_with(request).await?;

            println!("Query: {}  (k={}, alpha={})", query, k, alpha);
            println!("\nFound {} results", results.len());
            for (n, r) in results.iter().enumerate() {
                let page = r.page.map(|p| format!(" p.{p}")).unwrap_or_default();
                println!("\n  {}. score={:.4}  id={}  source={}{}", n + 1, r.score, r.chunk_id, r.source, page);
                println!("     {}", r.text_preview.replace('\n', " "));
            }
            if !expected.is_empty() {
                let wanted: Vec<&str> = expected.iter().map(String::as_str).collect();
                println!("\nSource accuracy: {:.2}", source_accuracy(&results, &wanted));
            }
            if let Some(stats) = engine.cache_stats() {
                tracing::info!(hits = stats.hits, misses = stats.misses, entries = stats.entries, "cache stats");
            }
        }
    }
    Ok(())
}
