// ABOUTME: Collapses near-duplicate or same-timeframe results for diversity
// ABOUTME: Greedy consume pass over score-descending results

use crate::{model::SearchResult, util::significant_words};
use chrono::Duration;
use std::collections::HashSet;

/// Results at or below this count are left alone; clustering tiny result
/// sets only hides information.
const MIN_RESULTS_TO_CLUSTER: usize = 3;

/// Two results this close in time are candidates for the same event.
const TIMEFRAME_HOURS: i64 = 72;

/// Title-word overlap above this ratio marks a near-duplicate.
const TITLE_OVERLAP_RATIO: f32 = 0.4;

/// A weaker result scoring within this fraction of the kept result is
/// treated as near-duplicate strength.
const SCORE_PROXIMITY: f32 = 0.85;

const MAX_KEPT: usize = 10;

/// Processes results in descending-score order, keeping each unconsumed
/// result and consuming its same-timeframe near-duplicates. Output length
/// is never greater than input length, and never exceeds
/// `min(input, MAX_KEPT)`.
pub fn cluster_results(mut results: Vec<SearchResult>) -> Vec<SearchResult> {
    if results.len() <= MIN_RESULTS_TO_CLUSTER {
        return results;
    }

    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    let max_kept = results.len().min(MAX_KEPT);
    let mut consumed = vec![false; results.len()];
    let mut kept: Vec<usize> = Vec::new();

    for i in 0..results.len() {
        if consumed[i] {
            continue;
        }
        kept.push(i);
        if kept.len() == max_kept {
            break;
        }

        for j in (i + 1)..results.len() {
            if !consumed[j] && is_near_duplicate(&results[i], &results[j]) {
                consumed[j] = true;
            }
        }
    }

    let kept: HashSet<usize> = kept.into_iter().collect();
    results
        .into_iter()
        .enumerate()
        .filter(|(i, _)| kept.contains(i))
        .map(|(_, r)| r)
        .collect()
}

/// `weaker` was created within 72 hours of `kept` and either shares more
/// than 40% of its significant title words with it or scores within 85%
/// of it.
fn is_near_duplicate(kept: &SearchResult, weaker: &SearchResult) -> bool {
    let (Some(kept_at), Some(weaker_at)) = (kept.created_at, weaker.created_at) else {
        return false;
    };

    let gap = (kept_at - weaker_at).abs();
    if gap > Duration::hours(TIMEFRAME_HOURS) {
        return false;
    }

    title_overlap(kept, weaker) > TITLE_OVERLAP_RATIO || weaker.score >= SCORE_PROXIMITY * kept.score
}

/// Fraction of the weaker result's significant title words also present in
/// the kept result's title.
fn title_overlap(kept: &SearchResult, weaker: &SearchResult) -> f32 {
    let kept_words: HashSet<String> = significant_words(kept.title.as_deref().unwrap_or(""))
        .into_iter()
        .collect();
    let weaker_words = significant_words(weaker.title.as_deref().unwrap_or(""));

    if kept_words.is_empty() || weaker_words.is_empty() {
        return 0.0;
    }

    let shared = weaker_words.iter().filter(|w| kept_words.contains(*w)).count();
    shared as f32 / weaker_words.len() as f32
}
