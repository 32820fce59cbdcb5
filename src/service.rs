// ABOUTME: Journal retrieval facade: search, converse, embedding maintenance
// ABOUTME: Maps request/response contracts onto the pipeline modules

use crate::{
    api::ApiClient,
    conversation,
    model::{ChatMessage, ConversationAnswer, SearchFilters, SearchResult, SearchScope},
    processor::{self, BackfillReport, EmbeddingProcessor, EmbeddingStatus},
    search::{
        cluster_results, hybrid_search, rank_for_feed, vector_search, HybridMode,
        VectorSearchParams, FEED_THRESHOLD, SEARCH_THRESHOLD,
    },
    store::EntryStore,
    Result,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    Vector,
    Hybrid,
    Conversational,
}

#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
    pub user: Uuid,
    pub scope: SearchScope,
    pub kind: SearchKind,
    pub mode: HybridMode,
    pub limit: usize,
    /// Overrides the context-dependent default when set.
    pub threshold: Option<f32>,
    pub filters: SearchFilters,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, user: Uuid) -> Self {
        SearchRequest {
            query: query.into(),
            user,
            scope: SearchScope::Own,
            kind: SearchKind::Hybrid,
            mode: HybridMode::Balanced,
            limit: 10,
            threshold: None,
            filters: SearchFilters::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SearchResponse {
    Results {
        results: Vec<SearchResult>,
        total_results: usize,
        execution_time_ms: u64,
    },
    Conversational {
        answer: String,
        relevant_entries: Vec<SearchResult>,
        confidence: f32,
        total_results: usize,
    },
}

pub struct JournalService {
    api: Arc<ApiClient>,
    store: Arc<dyn EntryStore>,
    processor: EmbeddingProcessor,
}

impl JournalService {
    pub fn new(api: Arc<ApiClient>, store: Arc<dyn EntryStore>) -> Self {
        let processor = EmbeddingProcessor::new(Arc::clone(&api), Arc::clone(&store));
        JournalService {
            api,
            store,
            processor,
        }
    }

    pub fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let started = Instant::now();

        if request.kind == SearchKind::Conversational {
            let answer = conversation::converse(
                &self.api,
                self.store.as_ref(),
                request.user,
                &request.query,
                &[],
                request.scope == SearchScope::Feed,
            )?;
            return Ok(SearchResponse::Conversational {
                total_results: answer.entries_used,
                answer: answer.answer,
                relevant_entries: answer.entries,
                confidence: answer.confidence,
            });
        }

        let threshold = request.threshold.unwrap_or(match request.scope {
            SearchScope::Feed => FEED_THRESHOLD,
            _ => SEARCH_THRESHOLD,
        });

        let ranked = match request.kind {
            SearchKind::Vector => vector_search(
                &self.api,
                self.store.as_ref(),
                &VectorSearchParams {
                    query: &request.query,
                    user: request.user,
                    scope: request.scope,
                    limit: request.limit,
                    threshold,
                    filters: &request.filters,
                },
            )?,
            SearchKind::Hybrid => hybrid_search(
                &self.api,
                self.store.as_ref(),
                &request.query,
                request.user,
                request.scope,
                request.limit,
                threshold,
                request.mode,
                &request.filters,
            )?,
            SearchKind::Conversational => unreachable!("handled above"),
        };

        let ranked = if request.scope == SearchScope::Feed {
            rank_for_feed(self.store.as_ref(), request.user, ranked, Utc::now())?
        } else {
            ranked
        };

        let results = cluster_results(ranked);

        Ok(SearchResponse::Results {
            total_results: results.len(),
            results,
            execution_time_ms: started.elapsed().as_millis() as u64,
        })
    }

    /// Conversational question over the user's own journal, with prior
    /// turns supplied by the caller.
    pub fn converse(
        &self,
        user: Uuid,
        query: &str,
        history: &[ChatMessage],
    ) -> Result<ConversationAnswer> {
        conversation::converse(&self.api, self.store.as_ref(), user, query, history, false)
    }

    /// Fire-and-forget enqueue for background embedding recomputation.
    pub fn queue_embedding(&self, entry_id: Uuid) {
        self.processor.queue(entry_id);
    }

    /// Synchronous sweep over entries missing embeddings.
    pub fn process_missing_embeddings(
        &self,
        user: Option<Uuid>,
        limit: usize,
    ) -> Result<BackfillReport> {
        processor::process_missing(&self.api, self.store.as_ref(), user, limit)
    }

    pub fn embedding_status(&self, user: Uuid) -> Result<EmbeddingStatus> {
        processor::status(self.store.as_ref(), user)
    }

    pub fn background_error_count(&self) -> usize {
        self.processor.error_count()
    }
}
