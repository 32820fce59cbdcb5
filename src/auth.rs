// ABOUTME: API key discovery with precedence chain
// ABOUTME: CLI flag → OPENAI_API_KEY env var

use crate::{Error, Result};
use std::env;

pub fn resolve_api_key(cli_key: Option<String>) -> Result<String> {
    // 1. CLI flag
    if let Some(key) = cli_key {
        return Ok(key);
    }

    // 2. Environment variable
    if let Ok(key) = env::var("OPENAI_API_KEY") {
        if !key.is_empty() {
            return Ok(key);
        }
    }

    Err(Error::Auth(
        "No API key found. Provide via --api-key or OPENAI_API_KEY env var".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_api_key_cli_precedence() {
        let key = resolve_api_key(Some("cli_key".into())).unwrap();
        assert_eq!(key, "cli_key");
    }

    #[test]
    fn test_resolve_api_key_missing() {
        // Only meaningful when the env var is absent in the test environment
        if env::var("OPENAI_API_KEY").is_err() {
            assert!(resolve_api_key(None).is_err());
        }
    }
}
