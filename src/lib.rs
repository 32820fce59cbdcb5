// ABOUTME: Public library API for the daybook retrieval core
// ABOUTME: Re-exports the search, conversation, and maintenance modules

pub mod api;
pub mod auth;
pub mod cli;
pub mod conversation;
pub mod error;
pub mod model;
pub mod processor;
pub mod search;
pub mod service;
pub mod store;
pub mod util;
pub mod vector;

pub use error::{Error, Result};
pub use model::{
    AiInsights, ChatMessage, ConversationAnswer, Engagement, Entry, PersonTag, Privacy,
    SearchFilters, SearchResult, SearchScope,
};
pub use service::{JournalService, SearchKind, SearchRequest, SearchResponse};
