//! Positional topic matching for log queries.

use alloy_primitives::B256;

/// Check whether a log's topics satisfy a positional topic filter.
///
/// The filter is one alternative-set per position; an empty set is a
/// wildcard. Trailing wildcard positions are trimmed before the length
/// check, so `[{A}, {}]` behaves exactly like `[{A}]`. After trimming, a
/// filter with more positions than the log has topics cannot match. Each
/// remaining non-wildcard position must contain the log's topic at that
/// position: OR within a position, AND across positions.
pub fn matches_topics(log_topics: &[B256], filter: &[Vec<B256>]) -> bool {
    let mut effective = filter.len();
    while effective > 0 && filter[effective - 1].is_empty() {
        effective -= 1;
    }
    let filter = &filter[..effective];

    if filter.len() > log_topics.len() {
        return false;
    }

    for (position, alternatives) in filter.iter().enumerate() {
        if alternatives.is_empty() {
            continue;
        }
        if !alternatives.contains(&log_topics[position]) {
            return false;
        }
    }

    true
}
