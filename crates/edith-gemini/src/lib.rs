//! Client for Google's generative-language API (`models/{model}:generateContent`).
//!
//! Only the pieces EDITH needs are modelled: text turns in, the first
//! candidate's text out.  Responses are decoded into explicit types so a
//! payload of the wrong shape is rejected instead of half-read.

pub mod client;
pub mod error;
pub mod models;
pub mod prompt;

pub use client::GeminiClient;
pub use error::GeminiError;
pub use models::{GenerateContentRequest, GenerateContentResponse, GenerationConfig};
pub use prompt::{EMPTY_RESPONSE_FALLBACK, SYSTEM_PROMPT};
