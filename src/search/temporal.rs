// ABOUTME: Heuristic classifier for queries about recent activity
// ABOUTME: Fixed keyword set plus regex patterns over the lowercased query

use once_cell::sync::Lazy;
use regex::Regex;

/// Whole-word temporal keywords and phrases. Word boundaries matter:
/// "my new job" must not match on "now" or "new".
static KEYWORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(recent|recently|latest|today|yesterday|tonight|currently|lately|nowadays|right now|these days|this (week|month|morning|evening|weekend)|last (week|month|night|weekend))\b",
    )
    .expect("temporal keyword regex is valid")
});

static PATTERN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"in the (last|past) \d+ (day|week|month|year)s?|since (yesterday|last (week|month|year))|(what's|what is|whats) (new|been happening|going on)|how (have|are) things been",
    )
    .expect("temporal pattern regex is valid")
});

/// True when the query implicitly or explicitly asks about recent,
/// time-bounded activity. Applied only in the feed context; standalone
/// search skips temporal bias so historical matches aren't penalized.
pub fn is_temporal_query(query: &str) -> bool {
    let query = query.trim().to_lowercase();
    KEYWORD_RE.is_match(&query) || PATTERN_RE.is_match(&query)
}
