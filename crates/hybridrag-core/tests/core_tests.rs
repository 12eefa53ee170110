use std::fs;
use std::path::PathBuf;

use figment::providers::{Format, Toml};
use figment::Figment;
use tempfile::TempDir;

use hybridrag_core::config::{expand_path, Config, RetrievalSettings};
use hybridrag_core::corpus::{load_jsonl, read_jsonl};
use hybridrag_core::{Chunk, ChunkStore, Error};

fn chunk(id: &str, text: &str, sequence: usize) -> Chunk {
    Chunk { id: id.to_string(), text: text.to_string(), source: "doc.pdf".to_string(), page: Some(1), sequence }
}

#[test]
fn store_orders_by_sequence_and_indexes_ids() {
    let store = ChunkStore::from_chunks(vec![chunk("b", "second", 1), chunk("a", "first", 0)]).expect("store");
    assert_eq!(store.len(), 2);
    assert_eq!(store.get(0).expect("pos 0").id, "a");
    assert_eq!(store.position("b"), Some(1));
    assert_eq!(store.by_id("b").expect("b").text, "second");
    assert!(store.by_id("missing").is_none());
}

#[test]
fn store_rejects_duplicate_ids() {
    let err = ChunkStore::from_chunks(vec![chunk("a", "x", 0), chunk("a", "y", 1)]).expect_err("duplicate");
    assert!(matches!(err, Error::InvalidParameter(_)));
}

#[test]
fn fingerprint_tracks_corpus_content() {
    let a = ChunkStore::from_chunks(vec![chunk("a", "cats", 0)]).expect("a");
    let same = ChunkStore::from_chunks(vec![chunk("a", "cats", 0)]).expect("same");
    let edited = ChunkStore::from_chunks(vec![chunk("a", "dogs", 0)]).expect("edited");
    assert_eq!(a.fingerprint(), same.fingerprint());
    assert_ne!(a.fingerprint(), edited.fingerprint());
}

#[test]
fn preview_cuts_on_char_boundary() {
    let c = chunk("a", "héllo wörld", 0);
    assert_eq!(c.preview(4), "héll");
    assert_eq!(c.preview(100), "héllo wörld");
}

#[test]
fn jsonl_assigns_sequence_and_fallback_ids() {
    let input = r#"{"id": "x", "text": "cats are mammals", "source": "zoo.pdf", "page": 2}

{"text": "dogs are loyal", "source": "zoo.pdf"}
"#;
    let chunks = read_jsonl(input.as_bytes()).expect("parse");
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].id, "x");
    assert_eq!(chunks[0].page, Some(2));
    assert_eq!(chunks[1].id, "zoo.pdf:3");
    assert_eq!(chunks[1].sequence, 1);
    assert_eq!(chunks[1].page, None);
}

#[test]
fn jsonl_reports_bad_line() {
    let err = read_jsonl("{\"text\": 1}\n".as_bytes()).expect_err("bad record");
    assert!(err.to_string().contains("line 1"), "{err}");
}

#[test]
fn load_jsonl_from_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("corpus.jsonl");
    fs::write(&path, "{\"text\": \"planets orbit stars\", \"source\": \"sky.pdf\"}\n").unwrap();
    let chunks = load_jsonl(&path).expect("load");
    assert_eq!(chunks[0].source, "sky.pdf");
}

#[test]
fn retrieval_settings_default_when_unconfigured() {
    let config = Config::from_figment(Figment::new());
    let settings = config.retrieval().expect("settings");
    assert_eq!(settings, RetrievalSettings::default());
    assert_eq!(settings.cache.ttl_secs, 86_400);
    assert_eq!(settings.default_k, 5);
}

#[test]
fn retrieval_settings_merge_partial_toml() {
    let toml = r#"
        [retrieval]
        default_alpha = 0.7
        [retrieval.cache]
        ttl_secs = 60
        dir = "/tmp/hybridrag-cache"
    "#;
    let config = Config::from_figment(Figment::new().merge(Toml::string(toml)));
    let settings = config.retrieval().expect("settings");
    assert!((settings.default_alpha - 0.7).abs() < 1e-6);
    assert_eq!(settings.cache.ttl_secs, 60);
    assert_eq!(settings.default_k, 5, "unset keys keep defaults");
    assert_eq!(settings.cache.resolved_dir().expect("dir").to_string_lossy(), "/tmp/hybridrag-cache");
}

#[test]
fn retrieval_settings_reject_out_of_range_alpha() {
    let config = Config::from_figment(Figment::new().merge(Toml::string("[retrieval]\ndefault_alpha = 1.5\n")));
    assert!(matches!(config.retrieval(), Err(Error::InvalidConfig(_))));
}

#[test]
fn expand_path_substitutes_env_vars() {
    std::env::set_var("HYBRIDRAG_TEST_ROOT", "/srv/rag");
    assert_eq!(expand_path("${HYBRIDRAG_TEST_ROOT}/cache"), PathBuf::from("/srv/rag/cache"));
    assert_eq!(expand_path("$HYBRIDRAG_TEST_ROOT"), PathBuf::from("/srv/rag"));
    assert_eq!(expand_path("relative/dir"), PathBuf::from("relative/dir"));
}

#[test]
fn store_keeps_input_order_for_equal_sequences() {
    let store = ChunkStore::from_chunks(vec![chunk("b", "first", 0), chunk("a", "second", 0), chunk("c", "third", 1)]).expect("store");
    assert_eq!(store.get(0).expect("chunk").id, "b");
    assert_eq!(store.position("a"), Some(1));
    assert_eq!(store.position("c"), Some(2));
}
