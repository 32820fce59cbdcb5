// ABOUTME: Lexical fallback scorer over title/content/searchable text
// ABOUTME: Fixed weights for full-query matches plus per-word partial credit

use crate::{
    model::{Entry, SearchFilters, SearchResult, SearchScope},
    search::vector::to_result,
    store::EntryStore,
    Result,
};
use uuid::Uuid;

const TITLE_WEIGHT: f32 = 0.5;
const CONTENT_WEIGHT: f32 = 0.3;
const SEARCHABLE_WEIGHT: f32 = 0.2;
const WORD_WEIGHT: f32 = 0.1;
const MAX_SCORE: f32 = 1.0;

pub fn keyword_search(
    store: &dyn EntryStore,
    user: Uuid,
    scope: SearchScope,
    query: &str,
    limit: usize,
    filters: &SearchFilters,
) -> Result<Vec<SearchResult>> {
    let candidates = store.candidates(user, scope, filters)?;

    let mut results: Vec<SearchResult> = candidates
        .iter()
        .filter_map(|entry| {
            let score = score_entry(query, entry);
            (score > 0.0).then(|| to_result(entry, score, "keyword match"))
        })
        .collect();

    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    results.truncate(limit);

    Ok(results)
}

/// Sums fixed weights for exact substring matches of the full query, plus
/// partial credit per matching word. Capped at 1.0 so a single entry can
/// never dominate the hybrid fusion through lexical repetition alone.
pub fn score_entry(query: &str, entry: &Entry) -> f32 {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return 0.0;
    }

    let title = entry.title.as_deref().unwrap_or("").to_lowercase();
    let content = entry.content.to_lowercase();
    let searchable = entry.search_text().to_lowercase();

    let mut score = 0.0;

    if title.contains(&query) {
        score += TITLE_WEIGHT;
    }
    if content.contains(&query) {
        score += CONTENT_WEIGHT;
    }
    if searchable.contains(&query) {
        score += SEARCHABLE_WEIGHT;
    }

    for word in query.split_whitespace() {
        if word.len() > 2 && searchable.contains(word) {
            score += WORD_WEIGHT;
        }
    }

    score.min(MAX_SCORE)
}
