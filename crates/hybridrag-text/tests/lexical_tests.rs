use hybridrag_core::{Chunk, ChunkStore};
use hybridrag_text::LexicalIndex;

fn store(texts: &[&str]) -> ChunkStore {
    let chunks = texts
        .iter()
        .enumerate()
        .map(|(i, t)| Chunk { id: format!("c{i}"), text: t.to_string(), source: "test.pdf".into(), page: None, sequence: i })
        .collect();
    ChunkStore::from_chunks(chunks).expect("store")
}

#[test]
fn tokenizes_lowercase_on_punctuation() {
    let index = LexicalIndex::build(&store(&["x"])).expect("index");
    assert_eq!(index.tokenize("Cats, DOGS; and-birds!"), vec!["cats", "dogs", "and", "birds"]);
    assert!(index.tokenize("  ...  ").is_empty());
}

#[test]
fn only_overlapping_chunks_are_scored() {
    let index = LexicalIndex::build(&store(&["cats are mammals", "dogs are loyal", "planets orbit stars"])).expect("index");
    let scores = index.score(&index.tokenize("mammals")).expect("score");
    assert_eq!(scores.len(), 1);
    assert!(scores[&0] > 0.0);
}

#[test]
fn rarer_terms_weigh_more() {
    let index = LexicalIndex::build(&store(&["cats are mammals", "dogs are loyal", "planets orbit stars"])).expect("index");
    let scores = index.score(&index.tokenize("are mammals")).expect("score");
    assert_eq!(scores.len(), 2);
    assert!(scores[&0] > scores[&1], "chunk matching the rare term ranks higher: {scores:?}");
}

#[test]
fn shorter_chunk_wins_equal_term_frequency() {
    let index = LexicalIndex::build(&store(&[
        "rust compiler internals explained in great depth with many words",
        "rust compiler",
        "gardening tips",
    ]))
    .expect("index");
    let top = index.top(&index.tokenize("compiler"), 2).expect("top");
    assert_eq!(top[0].0, 1, "length normalization favours the short chunk: {top:?}");
    assert_eq!(top[1].0, 0);
}

#[test]
fn top_pads_with_zero_scores_in_insertion_order() {
    let index = LexicalIndex::build(&store(&["alpha", "beta", "gamma", "beta beta"])).expect("index");
    let top = index.top(&index.tokenize("gamma"), 3).expect("top");
    assert_eq!(top.len(), 3);
    assert_eq!(top[0].0, 2);
    assert_eq!(top[1], (0, 0.0));
    assert_eq!(top[2], (1, 0.0));
}

#[test]
fn empty_query_and_empty_corpus_yield_nothing() {
    let index = LexicalIndex::build(&store(&["alpha"])).expect("index");
    assert!(index.top(&[], 5).expect("top").is_empty());

    let empty = LexicalIndex::build(&store(&[])).expect("empty index");
    assert!(empty.is_empty());
    assert!(empty.score(&["alpha".to_string()]).expect("score").is_empty());
    assert!(empty.top(&["alpha".to_string()], 5).expect("top").is_empty());
}

#[test]
fn counts_scoring_passes() {
    let index = LexicalIndex::build(&store(&["alpha"])).expect("index");
    assert_eq!(index.query_count(), 0);
    index.top(&index.tokenize("alpha"), 1).expect("top");
    index.score(&index.tokenize("beta")).expect("score");
    assert_eq!(index.query_count(), 2);
}
