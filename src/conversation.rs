// ABOUTME: Retrieval-augmented conversational answers over journal entries
// ABOUTME: Grounds the model in retrieved entries and repairs its citations

use crate::{
    api::ApiClient,
    model::{ChatMessage, ConversationAnswer, SearchFilters, SearchResult, SearchScope},
    search::{
        temporal::is_temporal_query,
        vector::{vector_search, VectorSearchParams},
    },
    store::EntryStore,
    Result,
};
use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

/// Stricter for standalone search, looser for feed discovery.
pub const CONVERSATION_THRESHOLD: f32 = 0.30;
pub const FEED_CONVERSATION_THRESHOLD: f32 = 0.20;
/// Temporal queries mix recent entries with semantic matches at this
/// relaxed cutoff.
pub const RELAXED_THRESHOLD: f32 = 0.20;

const GROUNDING_CAP: usize = 8;
const RECENT_DAYS: i64 = 30;
const RECENT_LIMIT: usize = 5;
const HISTORY_LIMIT: usize = 6;

/// Score assigned to recent entries pulled in by the temporal path without
/// a semantic match of their own.
const RECENT_ENTRY_SCORE: f32 = 0.5;

const NOTHING_FOUND_ANSWER: &str =
    "I couldn't find any journal entries related to that. Try rephrasing, or write about it first.";
const NOTHING_FOUND_CONFIDENCE: f32 = 0.1;

const MODEL_FAILURE_ANSWER: &str =
    "I wasn't able to generate an answer right now. Please try again in a moment.";

const SYSTEM_CONTRACT: &str = "You are a reflective assistant for a personal journal. \
You answer questions strictly from the journal entries provided in the context. \
Rules: \
1. Never give advice, recommendations, or instructions; only reflect what the entries say. \
2. State only facts present in the entries; if the entries don't answer the question, say so. \
3. Cite every claim with the exact token [entry:<uuid>] using the uuid shown in the context. \
4. Keep the tone warm and factual.";

pub fn converse(
    api: &ApiClient,
    store: &dyn EntryStore,
    user: Uuid,
    query: &str,
    history: &[ChatMessage],
    feed: bool,
) -> Result<ConversationAnswer> {
    let grounding = retrieve_grounding(api, store, user, query, feed)?;

    if grounding.is_empty() {
        return Ok(ConversationAnswer {
            answer: NOTHING_FOUND_ANSWER.into(),
            entries: vec![],
            confidence: NOTHING_FOUND_CONFIDENCE,
            entries_used: 0,
        });
    }

    let context = build_context(store, &grounding)?;

    let mut messages = vec![ChatMessage::system(SYSTEM_CONTRACT)];
    let start = history.len().saturating_sub(HISTORY_LIMIT);
    messages.extend(history[start..].iter().cloned());
    messages.push(ChatMessage::user(format!(
        "Journal context:\n\n{}\n\nQuestion: {}",
        context, query
    )));

    let raw_answer = match api.complete(&messages) {
        Ok(answer) => answer,
        Err(e) => {
            eprintln!("Warning: Language model call failed: {}", e);
            return Ok(ConversationAnswer {
                answer: MODEL_FAILURE_ANSWER.into(),
                entries: vec![],
                confidence: 0.0,
                entries_used: 0,
            });
        }
    };

    let answer = normalize_citations(&raw_answer, &grounding);
    let confidence = confidence_from(&grounding);
    let entries_used = grounding.len();

    Ok(ConversationAnswer {
        answer,
        entries: grounding,
        confidence,
        entries_used,
    })
}

/// Temporal queries (feed only) combine up to five recent entries with
/// relaxed-threshold semantic matches; everything else retrieves directly
/// at the context's threshold. Capped at eight either way.
fn retrieve_grounding(
    api: &ApiClient,
    store: &dyn EntryStore,
    user: Uuid,
    query: &str,
    feed: bool,
) -> Result<Vec<SearchResult>> {
    let filters = SearchFilters::default();
    let scope = if feed { SearchScope::Feed } else { SearchScope::Own };

    if feed && is_temporal_query(query) {
        let semantic = vector_search(
            api,
            store,
            &VectorSearchParams {
                query,
                user,
                scope,
                limit: GROUNDING_CAP,
                threshold: RELAXED_THRESHOLD,
                filters: &filters,
            },
        )?;

        let mut combined = semantic;
        for entry in store.recent_entries(user, RECENT_DAYS, RECENT_LIMIT)? {
            if combined.iter().any(|r| r.entry_id == entry.id) {
                continue;
            }
            combined.push(crate::search::vector::to_result(
                &entry,
                RECENT_ENTRY_SCORE,
                "recent entry",
            ));
        }
        combined.truncate(GROUNDING_CAP);
        Ok(combined)
    } else {
        let threshold = if feed {
            FEED_CONVERSATION_THRESHOLD
        } else {
            CONVERSATION_THRESHOLD
        };
        vector_search(
            api,
            store,
            &VectorSearchParams {
                query,
                user,
                scope,
                limit: GROUNDING_CAP,
                threshold,
                filters: &filters,
            },
        )
    }
}

/// One textual block per grounding entry: id, title, date, tags, relevance,
/// content, and the AI summary when one exists.
fn build_context(store: &dyn EntryStore, grounding: &[SearchResult]) -> Result<String> {
    let mut blocks: Vec<String> = Vec::with_capacity(grounding.len());

    for result in grounding {
        let Some(entry) = store.get(result.entry_id)? else {
            // Entry deleted between retrieval and grounding; fall back to snippet
            blocks.push(format!("[entry:{}]\n{}", result.entry_id, result.snippet));
            continue;
        };

        let mut block = format!(
            "[entry:{}]\nTitle: {}\nDate: {}\nTags: {}\nRelevance: {:.2}\n{}",
            entry.id,
            entry.title.as_deref().unwrap_or("(untitled)"),
            entry.created_at.format("%Y-%m-%d"),
            entry.tags.join(", "),
            result.score,
            entry.content,
        );
        if let Some(summary) = entry.ai_insights.as_ref().and_then(|i| i.summary.as_deref()) {
            block.push_str(&format!("\nSummary: {}", summary));
        }
        blocks.push(block);
    }

    Ok(blocks.join("\n\n"))
}

static CITATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[entry:\s*([^\]]+)\]").expect("citation regex is valid"));

/// Repairs citation tokens in the model's reply. Valid uuid captures are
/// re-emitted unquoted; title captures are matched (exact, then
/// case-insensitive) against the grounding entries and rewritten to the
/// matching uuid; anything unmatched is demoted to plain text so no
/// dangling reference reaches the user.
pub fn normalize_citations(answer: &str, grounding: &[SearchResult]) -> String {
    CITATION_RE
        .replace_all(answer, |caps: &regex::Captures<'_>| {
            let captured = caps[1].trim().trim_matches(|c| c == '"' || c == '\'');

            if let Ok(uuid) = Uuid::parse_str(captured) {
                return format!("[entry:{}]", uuid);
            }

            let exact = grounding
                .iter()
                .find(|r| r.title.as_deref() == Some(captured));
            let matched = exact.or_else(|| {
                grounding.iter().find(|r| {
                    r.title
                        .as_deref()
                        .map(|t| t.eq_ignore_ascii_case(captured))
                        .unwrap_or(false)
                })
            });

            match matched {
                Some(result) => format!("[entry:{}]", result.entry_id),
                None => captured.to_string(),
            }
        })
        .into_owned()
}

/// `min(0.95, average similarity * 1.2)`.
pub fn confidence_from(grounding: &[SearchResult]) -> f32 {
    if grounding.is_empty() {
        return 0.0;
    }
    let avg: f32 = grounding.iter().map(|r| r.score).sum::<f32>() / grounding.len() as f32;
    (avg * 1.2).min(0.95)
}
