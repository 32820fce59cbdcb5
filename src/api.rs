// ABOUTME: Blocking HTTP client for the OpenAI-compatible provider
// ABOUTME: Handles throttling, auth headers, and fail-fast errors

use crate::{model::ChatMessage, util::snippet, Error, Result};
use rand::Rng;
use reqwest::blocking::Client;
use serde_json::json;
use std::time::Duration;

pub const EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const EMBEDDING_DIMENSIONS: usize = 1536;
pub const CHAT_MODEL: &str = "gpt-4o-mini";

pub struct ApiClient {
    client: Client,
    base_url: String,
    api_key: String,
    throttle_min: u64,
    throttle_max: u64,
}

impl ApiClient {
    pub fn new(api_key: String, base_url: Option<String>) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;

        Ok(ApiClient {
            client,
            base_url: base_url.unwrap_or_else(|| "https://api.openai.com".into()),
            api_key,
            throttle_min: 100,
            throttle_max: 300,
        })
    }

    pub fn with_throttle(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.throttle_min = min_ms;
        self.throttle_max = max_ms;
        self
    }

    pub fn disable_throttle(mut self) -> Self {
        self.throttle_min = 0;
        self.throttle_max = 0;
        self
    }

    fn throttle(&self) {
        if self.throttle_max > 0 {
            let sleep_ms = rand::thread_rng().gen_range(self.throttle_min..=self.throttle_max);
            std::thread::sleep(Duration::from_millis(sleep_ms));
        }
    }

    fn post<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        body: serde_json::Value,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, endpoint);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Accept", "application/json")
            .header("Content-Type", "application/json")
            .header("User-Agent", "daybook/0.1 (Rust)")
            .json(&body)
            .send()?;

        self.throttle();

        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            let preview = snippet(&message, 100);
            return Err(Error::Api {
                endpoint: endpoint.into(),
                status: status.as_u16(),
                message: preview,
            });
        }

        let body = response.text()?;
        serde_json::from_str(&body).map_err(|e| {
            eprintln!("Failed to parse response from {}: {}", endpoint, e);
            eprintln!("Response body (first 500 chars): {}", snippet(&body, 500));
            Error::Parse(e)
        })
    }

    /// Embeds one text into a fixed-dimension vector. Empty or whitespace
    /// input is rejected before any network call; callers must not persist
    /// anything on failure.
    pub fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(Error::Embedding("cannot embed empty text".into()));
        }

        #[derive(serde::Deserialize)]
        struct Response {
            data: Vec<Item>,
        }

        #[derive(serde::Deserialize)]
        struct Item {
            #[serde(default)]
            index: Option<usize>,
            embedding: Vec<f32>,
        }

        let resp: Response = self.post(
            "/v1/embeddings",
            json!({
                "model": EMBEDDING_MODEL,
                "input": [text],
                "dimensions": EMBEDDING_DIMENSIONS,
            }),
        )?;

        // Responses are index-ordered in principle but not guaranteed
        let mut items: Vec<(usize, Vec<f32>)> = resp
            .data
            .into_iter()
            .enumerate()
            .map(|(fallback, item)| (item.index.unwrap_or(fallback), item.embedding))
            .collect();
        items.sort_by_key(|(index, _)| *index);

        items
            .into_iter()
            .next()
            .map(|(_, embedding)| embedding)
            .ok_or_else(|| Error::Embedding("provider returned no embedding".into()))
    }

    /// Sends a chat completion request and returns the assistant's reply.
    pub fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        #[derive(serde::Deserialize)]
        struct Response {
            choices: Vec<Choice>,
        }

        #[derive(serde::Deserialize)]
        struct Choice {
            message: Message,
        }

        #[derive(serde::Deserialize)]
        struct Message {
            #[serde(default)]
            content: Option<String>,
        }

        let resp: Response = self.post(
            "/v1/chat/completions",
            json!({
                "model": CHAT_MODEL,
                "messages": messages,
                "temperature": 0.3,
            }),
        )?;

        resp.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| Error::Conversation("no response from language model".into()))
    }
}
