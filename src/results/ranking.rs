//! Ranking and deduplication of the merged result pool

use super::types::SearchResult;
use std::collections::HashSet;

/// Rank the combined pool and drop duplicates.
///
/// Results are ordered by `relevance_score`, highest first. The sort is
/// stable, so equal scores keep their pool order (source registration order,
/// then the order each source returned them). Afterwards only the first
/// occurrence of each `(title, source)` pair is kept, which is always the
/// highest-scored copy. Scores are compared as-is across sources.
pub fn rank_results(mut results: Vec<SearchResult>) -> Vec<SearchResult> {
    sort_by_relevance(&mut results);
    deduplicate(results)
}

/// Stable sort by score descending
pub fn sort_by_relevance(results: &mut [SearchResult]) {
    results.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
}

/// Keep the first result for every `(title, source)` key
pub fn deduplicate(results: Vec<SearchResult>) -> Vec<SearchResult> {
    let keep: Vec<bool> = {
        let mut seen = HashSet::with_capacity(results.len());
        results.iter().map(|r| seen.insert(r.dedup_key())).collect()
    };

    results
        .into_iter()
        .zip(keep)
        .filter_map(|(result, first)| first.then_some(result))
        .collect()
}
