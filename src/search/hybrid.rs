// ABOUTME: Fuses vector and keyword result sets with mode-dependent weights
// ABOUTME: Entries validated by both signals get an agreement bonus

use crate::{
    api::ApiClient,
    model::{SearchFilters, SearchResult, SearchScope},
    search::{keyword::keyword_search, vector::vector_search, vector::VectorSearchParams},
    store::EntryStore,
    Result,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// How wide a net each source casts relative to the final output size.
const CANDIDATE_MULTIPLIER: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HybridMode {
    Semantic,
    Keyword,
    Balanced,
}

impl HybridMode {
    /// (vector weight, keyword weight)
    fn weights(self) -> (f32, f32) {
        match self {
            HybridMode::Semantic => (1.0, 0.3),
            HybridMode::Keyword => (0.3, 1.0),
            HybridMode::Balanced => (0.7, 0.7),
        }
    }
}

pub fn hybrid_search(
    api: &ApiClient,
    store: &dyn EntryStore,
    query: &str,
    user: Uuid,
    scope: SearchScope,
    limit: usize,
    threshold: f32,
    mode: HybridMode,
    filters: &SearchFilters,
) -> Result<Vec<SearchResult>> {
    let widened = limit.max(1) * CANDIDATE_MULTIPLIER;

    let vector_results = vector_search(
        api,
        store,
        &VectorSearchParams {
            query,
            user,
            scope,
            limit: widened,
            threshold,
            filters,
        },
    )?;
    let keyword_results = keyword_search(store, user, scope, query, widened, filters)?;

    Ok(fuse(vector_results, keyword_results, mode, limit))
}

/// Merges the two result sets by entry id. An entry present in both keeps
/// its vector-weighted score plus half its keyword-weighted score, so
/// entries independently validated by two signals outrank single-signal
/// matches of equal strength.
pub fn fuse(
    vector_results: Vec<SearchResult>,
    keyword_results: Vec<SearchResult>,
    mode: HybridMode,
    limit: usize,
) -> Vec<SearchResult> {
    let (vec_weight, kw_weight) = mode.weights();

    let mut merged: HashMap<Uuid, SearchResult> = HashMap::new();

    for mut result in vector_results {
        result.score *= vec_weight;
        merged.insert(result.entry_id, result);
    }

    for mut result in keyword_results {
        result.score *= kw_weight;
        match merged.get_mut(&result.entry_id) {
            Some(existing) => {
                existing.score += 0.5 * result.score;
                existing.match_reason = "semantic + keyword match".into();
            }
            None => {
                merged.insert(result.entry_id, result);
            }
        }
    }

    let mut results: Vec<SearchResult> = merged.into_values().collect();
    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    results.truncate(limit);
    results
}
