// ABOUTME: Feed ranking: recency decay, engagement counts, interaction boost
// ABOUTME: Reorders hybrid results, never drops any

use crate::{model::SearchResult, store::EntryStore, Result};
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

const RECENCY_FLOOR: f32 = 0.1;
const ENGAGEMENT_CAP: f32 = 2.0;
const USER_CONTEXT_BOOST: f32 = 1.3;
const USER_CONTEXT_WINDOW_DAYS: i64 = 7;

/// Post-processes hybrid results for the social-feed context. Every input
/// result comes back out; only the ordering and scores change.
pub fn rank_for_feed(
    store: &dyn EntryStore,
    user: Uuid,
    mut results: Vec<SearchResult>,
    now: DateTime<Utc>,
) -> Result<Vec<SearchResult>> {
    for result in &mut results {
        let recency = recency_factor(result.created_at, now);

        let engagement = store.engagement(result.entry_id, user)?;
        let engagement_factor = (1.0
            + engagement.likes as f32 * 0.1
            + engagement.comments as f32 * 0.2)
            .min(ENGAGEMENT_CAP);

        let user_context = match engagement.last_interaction {
            Some(at) if now - at <= Duration::days(USER_CONTEXT_WINDOW_DAYS) => USER_CONTEXT_BOOST,
            _ => 1.0,
        };

        result.score *= recency * engagement_factor * user_context;
    }

    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    Ok(results)
}

/// `1 / (1 + days * 0.1)`, floored at 0.1 so old entries stay rankable.
/// A result without a creation timestamp gets no recency bias.
fn recency_factor(created_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f32 {
    let Some(created) = created_at else {
        return 1.0;
    };
    let days = (now - created).num_hours().max(0) as f32 / 24.0;
    (1.0 / (1.0 + days * 0.1)).max(RECENCY_FLOOR)
}
