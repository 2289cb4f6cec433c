//! Wire types for `generateContent`.
//!
//! Request types serialize to the camelCase field names the API expects.
//! Response types accept absent fields (the API omits empty arrays) but reject
//! fields of the wrong type.

use edith_types::{Part, Turn};
use serde::{Deserialize, Serialize};

use crate::prompt::{DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_TEMPERATURE};

// ── Request ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Turn>,
    pub system_instruction: SystemInstruction,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemInstruction {
    pub parts: Vec<Part>,
}

impl SystemInstruction {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            parts: vec![Part { text: text.into() }],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub max_output_tokens: u32,
    pub temperature: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

// ── Response ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponsePart {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first part of the first candidate, if non-empty.
    pub fn text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()?
            .text
            .as_deref()
            .filter(|t| !t.is_empty())
    }

    /// Why no text was produced, when the API says so.
    pub fn empty_reason(&self) -> Option<&str> {
        if let Some(reason) = self
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            return Some(reason);
        }
        self.candidates.first()?.finish_reason.as_deref()
    }
}

/// Error envelope returned with non-2xx statuses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub error: Option<ErrorDetail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_uses_api_field_names() {
        let req = GenerateContentRequest {
            contents: vec![Turn::user("hi")],
            system_instruction: SystemInstruction::text("be brief"),
            generation_config: GenerationConfig::default(),
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["systemInstruction"]["parts"][0]["text"], "be brief");
        assert_eq!(v["generationConfig"]["maxOutputTokens"], 200);
        assert!((v["generationConfig"]["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
        assert_eq!(v["contents"][0]["role"], "user");
    }

    #[test]
    fn text_reads_first_candidate_part() {
        let resp: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [
                { "content": { "role": "model", "parts": [{ "text": "42" }, { "text": "ignored" }] },
                  "finishReason": "STOP" },
                { "content": { "parts": [{ "text": "second" }] } }
            ]
        }))
        .unwrap();
        assert_eq!(resp.text(), Some("42"));
    }

    #[test]
    fn blocked_prompt_has_no_text_and_a_reason() {
        let resp: GenerateContentResponse = serde_json::from_value(json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        }))
        .unwrap();
        assert_eq!(resp.text(), None);
        assert_eq!(resp.empty_reason(), Some("SAFETY"));
    }

    #[test]
    fn empty_text_counts_as_missing() {
        let resp: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [{ "text": "" }] }, "finishReason": "MAX_TOKENS" }]
        }))
        .unwrap();
        assert_eq!(resp.text(), None);
        assert_eq!(resp.empty_reason(), Some("MAX_TOKENS"));
    }

    #[test]
    fn wrong_shape_is_rejected() {
        let bad = json!({ "candidates": { "content": "nope" } });
        assert!(serde_json::from_value::<GenerateContentResponse>(bad).is_err());

        let bad_text = json!({ "candidates": [{ "content": { "parts": [{ "text": 7 }] } }] });
        assert!(serde_json::from_value::<GenerateContentResponse>(bad_text).is_err());
    }
}
