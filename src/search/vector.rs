// ABOUTME: Semantic search: embed query, score candidates by cosine similarity
// ABOUTME: Per-entry decode/similarity failures are logged and skipped

use crate::{
    api::ApiClient,
    model::{Entry, SearchFilters, SearchResult, SearchScope},
    store::EntryStore,
    util::snippet,
    vector, Result,
};
use uuid::Uuid;

/// Stricter cutoff for the search page; feed tolerates broader relevance
/// for discovery.
pub const SEARCH_THRESHOLD: f32 = 0.35;
pub const FEED_THRESHOLD: f32 = 0.25;

/// Query sentinel that means "match everything the filters allow".
pub const WILDCARD_QUERY: &str = "*";

pub const SNIPPET_CHARS: usize = 200;

#[derive(Debug, Clone)]
pub struct VectorSearchParams<'a> {
    pub query: &'a str,
    pub user: Uuid,
    pub scope: SearchScope,
    pub limit: usize,
    pub threshold: f32,
    pub filters: &'a SearchFilters,
}

pub fn vector_search(
    api: &ApiClient,
    store: &dyn EntryStore,
    params: &VectorSearchParams<'_>,
) -> Result<Vec<SearchResult>> {
    let query_vec = api.embed(params.query)?;

    // With the wildcard query and at least one structural filter active, the
    // filters alone define relevance and the threshold is bypassed.
    let bypass_threshold = params.query.trim() == WILDCARD_QUERY && params.filters.is_structural();

    let candidates = store.candidates(params.user, params.scope, params.filters)?;

    let mut results: Vec<SearchResult> = Vec::new();
    for entry in &candidates {
        let Some(encoded) = entry.content_embedding.as_deref() else {
            continue;
        };

        let stored_vec = match vector::decode(encoded) {
            Ok(v) => v,
            Err(e) => {
                eprintln!("Warning: Skipping entry {} with corrupt embedding: {}", entry.id, e);
                continue;
            }
        };

        let similarity = match vector::cosine(&query_vec, &stored_vec) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Warning: Failed to process embedding for entry {}: {}", entry.id, e);
                continue;
            }
        };

        if similarity >= params.threshold || bypass_threshold {
            results.push(to_result(entry, similarity, "semantic match"));
        }
    }

    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    results.truncate(params.limit);

    Ok(results)
}

pub(crate) fn to_result(entry: &Entry, score: f32, match_reason: &str) -> SearchResult {
    SearchResult {
        entry_id: entry.id,
        score,
        snippet: snippet(entry.search_text(), SNIPPET_CHARS),
        title: entry.title.clone(),
        match_reason: match_reason.into(),
        created_at: Some(entry.created_at),
    }
}
