//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use edith_gemini::{GeminiClient, GeminiError};

use crate::config::Config;

/// State shared across all HTTP handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Server configuration (env-derived).
    pub config: Arc<Config>,
    /// Upstream client; `None` when no API key is configured.
    pub gemini: Option<GeminiClient>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, GeminiError> {
        let gemini = match &config.gemini_api_key {
            Some(key) => Some(
                GeminiClient::new(key.as_str())
                    .set_base_url(config.gemini_base_url.as_str())
                    .set_model(config.gemini_model.as_str())
                    .set_timeout(config.upstream_timeout)?,
            ),
            None => None,
        };
        Ok(Self {
            config: Arc::new(config),
            gemini,
        })
    }
}
