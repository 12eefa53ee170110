use hybridrag_core::SearchResult;

/// Fraction of `expected` sources that appear in at least one result.
///
/// Matching is by substring so `"manual"` matches `"manual.pdf"`. An empty
/// expectation is trivially satisfied.
pub fn source_accuracy(results: &[SearchResult], expected: &[&str]) -> f32 {
    if expected.is_empty() {
        return 1.0;
    }
    let found = expected
        .iter()
        .filter(|want| results.iter().any(|r| r.source.contains(**want)))
        .count();
    found as f32 / expected.len() as f32
}
