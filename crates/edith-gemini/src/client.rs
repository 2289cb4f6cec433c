use std::time::Duration;

use edith_types::Turn;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use crate::error::GeminiError;
use crate::models::{
    ErrorEnvelope, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
    SystemInstruction,
};
use crate::prompt::{DEFAULT_BASE_URL, DEFAULT_MODEL, SYSTEM_PROMPT};

/// Client for one model of the generative-language API.
///
/// # Example
/// ```rust,no_run
/// # async fn run() -> Result<(), edith_gemini::GeminiError> {
/// use edith_gemini::GeminiClient;
/// let client = GeminiClient::new("api-key").set_model("gemini-pro");
/// let text = client.generate_text(&[], "What is 2 + 2?").await?;
/// # Ok(()) }
/// ```
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    api_key: String,
    base_url: String,
    model: String,
    system_prompt: String,
    generation: GenerationConfig,
}

impl GeminiClient {
    /// Create a client with the default endpoint, model and persona.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            model: DEFAULT_MODEL.to_owned(),
            system_prompt: SYSTEM_PROMPT.to_owned(),
            generation: GenerationConfig::default(),
        }
    }

    /// Override the API root (default: the public `v1beta` endpoint).
    pub fn set_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    pub fn set_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Rebuild the underlying HTTP client with a total request timeout.
    pub fn set_timeout(mut self, timeout: Duration) -> Result<Self, GeminiError> {
        self.http = Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    /// Payload for `query` following `history`.
    pub fn request_for(&self, history: &[Turn], query: &str) -> GenerateContentRequest {
        let mut contents = Vec::with_capacity(history.len() + 1);
        contents.extend_from_slice(history);
        contents.push(Turn::user(query));
        GenerateContentRequest {
            contents,
            system_instruction: SystemInstruction::text(self.system_prompt.clone()),
            generation_config: self.generation,
        }
    }

    /// Send one `generateContent` call and decode the reply.
    pub async fn generate(
        &self,
        history: &[Turn],
        query: &str,
    ) -> Result<GenerateContentResponse, GeminiError> {
        let payload = self.request_for(history, query);
        debug!(model = %self.model, turns = payload.contents.len(), "generateContent request");

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = error_message(status, &body);
            warn!(status = status.as_u16(), %message, "Gemini API error");
            return Err(GeminiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str::<GenerateContentResponse>(&body).map_err(|e| {
            warn!(error = %e, "Gemini response did not match the expected schema");
            GeminiError::InvalidResponse {
                message: e.to_string(),
            }
        })
    }

    /// Like [`Self::generate`] but returns only the reply text, `None` when
    /// the API produced nothing usable.
    pub async fn generate_text(
        &self,
        history: &[Turn],
        query: &str,
    ) -> Result<Option<String>, GeminiError> {
        let response = self.generate(history, query).await?;
        match response.text() {
            Some(text) => Ok(Some(text.to_owned())),
            None => {
                debug!(reason = ?response.empty_reason(), "Gemini returned no text");
                Ok(None)
            }
        }
    }
}

/// Message for a non-2xx reply: the API's `error.message` when present.
pub(crate) fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|env| env.error)
        .and_then(|detail| detail.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("API request failed with status {}", status.as_u16()))
}
