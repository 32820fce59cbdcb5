// ABOUTME: Serde data models for journal entries and search results
// ABOUTME: Tolerant parsing with optional fields and explicit defaults

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Privacy {
    Private,
    Shared,
    Public,
}

impl Default for Privacy {
    fn default() -> Self {
        Privacy::Private
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub id: Uuid,
    pub owner_id: Uuid,
    #[serde(default)]
    pub title: Option<String>,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub privacy: Privacy,
    #[serde(default)]
    pub shared_with: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub media_labels: Vec<String>,
    #[serde(default)]
    pub searchable_text: String,
    #[serde(default)]
    pub content_embedding: Option<String>,
    #[serde(default)]
    pub embedding_version: Option<String>,
    #[serde(default)]
    pub last_embedding_update: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ai_insights: Option<AiInsights>,
}

impl Entry {
    /// Concatenation of title, content, and media-derived labels.
    /// This is the text the embedding is computed from.
    pub fn derive_searchable_text(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if let Some(title) = &self.title {
            parts.push(title);
        }
        parts.push(&self.content);
        for label in &self.media_labels {
            parts.push(label);
        }
        parts.join("\n")
    }

    /// Text to embed and snippet from: the derived searchable text when
    /// present, raw content otherwise.
    pub fn search_text(&self) -> &str {
        if self.searchable_text.trim().is_empty() {
            &self.content
        } else {
            &self.searchable_text
        }
    }
}

#[cfg(test)]
mod entry_tests {
    use super::*;

    fn entry() -> Entry {
        Entry {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            title: Some("Morning Run".into()),
            content: "Went for a 5k run in the park".into(),
            tags: vec!["fitness".into()],
            privacy: Privacy::Private,
            shared_with: vec![],
            created_at: "2025-10-28T15:04:05Z".parse().unwrap(),
            media_labels: vec!["park".into(), "trees".into()],
            searchable_text: String::new(),
            content_embedding: None,
            embedding_version: None,
            last_embedding_update: None,
            ai_insights: None,
        }
    }

    #[test]
    fn test_derive_searchable_text_concatenates() {
        let text = entry().derive_searchable_text();
        assert!(text.contains("Morning Run"));
        assert!(text.contains("5k run"));
        assert!(text.contains("trees"));
    }

    #[test]
    fn test_search_text_falls_back_to_content() {
        let e = entry();
        assert_eq!(e.search_text(), "Went for a 5k run in the park");
    }

    #[test]
    fn test_entry_deserialize_minimal() {
        let json = format!(
            r#"{{"id": "{}", "owner_id": "{}", "content": "hi", "created_at": "2025-10-28T15:04:05Z"}}"#,
            Uuid::new_v4(),
            Uuid::new_v4()
        );
        let e: Entry = serde_json::from_str(&json).unwrap();
        assert!(e.title.is_none());
        assert!(e.tags.is_empty());
        assert_eq!(e.privacy, Privacy::Private);
        assert!(e.content_embedding.is_none());
    }
}

/// AI-derived analysis of an entry. The language model's output is loosely
/// shaped JSON; every field is optional and defaults apply, so a partial or
/// malformed response degrades instead of failing the entry write.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AiInsights {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub mood: Option<String>,
    #[serde(default)]
    pub themes: Vec<String>,
    #[serde(default)]
    pub sentiment_score: Option<f32>,
}

impl AiInsights {
    /// Parses insights from raw model output. Never fails: unparseable
    /// output yields empty defaults.
    pub fn from_model_output(raw: &str) -> AiInsights {
        serde_json::from_str(raw).unwrap_or_default()
    }
}

#[cfg(test)]
mod insights_tests {
    use super::*;

    #[test]
    fn test_insights_partial_fields() {
        let parsed = AiInsights::from_model_output(r#"{"summary": "A good day", "themes": ["gratitude"]}"#);
        assert_eq!(parsed.summary.as_deref(), Some("A good day"));
        assert_eq!(parsed.themes, vec!["gratitude"]);
        assert!(parsed.mood.is_none());
    }

    #[test]
    fn test_insights_garbage_yields_defaults() {
        let parsed = AiInsights::from_model_output("not json at all");
        assert!(parsed.summary.is_none());
        assert!(parsed.themes.is_empty());
    }
}

/// A person tagged in an entry, scoped to the user who created the tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonTag {
    pub entry_id: Uuid,
    pub person_name: String,
    pub tagged_by: Uuid,
}

/// Social signals for one entry, as seen by one requesting user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Engagement {
    #[serde(default)]
    pub likes: u32,
    #[serde(default)]
    pub comments: u32,
    /// When the requesting user last liked or commented on the entry.
    #[serde(default)]
    pub last_interaction: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchScope {
    Own,
    Feed,
    Shared,
}

/// Structured constraints applied before any scoring happens.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchFilters {
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub people: Vec<String>,
    #[serde(default)]
    pub date_from: Option<chrono::NaiveDate>,
    #[serde(default)]
    pub date_to: Option<chrono::NaiveDate>,
    #[serde(default)]
    pub privacy: Option<Privacy>,
}

impl SearchFilters {
    /// True when at least one structural constraint (tags, people, dates)
    /// is active. Used for the wildcard-query threshold bypass.
    pub fn is_structural(&self) -> bool {
        !self.tags.is_empty()
            || !self.people.is_empty()
            || self.date_from.is_some()
            || self.date_to.is_some()
    }
}


#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub entry_id: Uuid,
    /// Unitless score, comparable only within one ranking run.
    pub score: f32,
    pub snippet: String,
    #[serde(default)]
    pub title: Option<String>,
    pub match_reason: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        ChatMessage {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage {
            role: "user".into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationAnswer {
    pub answer: String,
    pub entries: Vec<SearchResult>,
    /// In [0, 1].
    pub confidence: f32,
    pub entries_used: usize,
}
