//! Unified server error type.
//!
//! Every handler returns `Result<T, ServerError>`, which implements
//! [`axum::response::IntoResponse`] so errors become a JSON
//! `{"error": "..."}` body with an appropriate status code.
//!
//! Upstream failures are relayed to the caller behind a fixed prefix, as the
//! browser client shows that text to the user.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use edith_gemini::GeminiError;
use edith_types::ErrorBody;
use thiserror::Error;
use tracing::{error, warn};

pub const QUERY_REQUIRED: &str = "Query is required.";
pub const API_KEY_MISSING: &str = "API key is not configured on the server.";
pub const UPSTREAM_PREFIX: &str = "Failed to get response from Gemini.";

#[derive(Debug, Error)]
pub enum ServerError {
    /// The caller sent an invalid or malformed request.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// No route matched.
    #[error("{0}")]
    NotFound(String),

    /// The server is missing something it needs to answer.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The generative-language API call failed.
    #[error("upstream error: {0}")]
    Upstream(#[from] GeminiError),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, client_message) = match &self {
            ServerError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
            ServerError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
            ServerError::Configuration(m) => {
                error!(message = %m, "server misconfigured");
                (StatusCode::INTERNAL_SERVER_ERROR, m.clone())
            }
            ServerError::Upstream(e) => {
                warn!(error = %e, upstream_status = ?e.status(), "upstream call failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("{UPSTREAM_PREFIX} {e}"),
                )
            }
        };
        (
            status,
            Json(ErrorBody {
                error: client_message,
            }),
        )
            .into_response()
    }
}
