//! The proxy endpoint (`POST /api/gemini`).
//!
//! Accepts the chat history plus a new query, forwards them to the
//! generative-language API with the EDITH persona, and returns the first
//! candidate's text.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::routing::post;
use axum::{Json, Router};
use edith_gemini::EMPTY_RESPONSE_FALLBACK;
use edith_types::{ErrorBody, Part, ProxyRequest, ProxyResponse, Role, Turn};
use tracing::{debug, info};
use utoipa::OpenApi;

use crate::error::{API_KEY_MISSING, QUERY_REQUIRED, ServerError};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(ask_gemini),
    components(schemas(ProxyRequest, ProxyResponse, ErrorBody, Turn, Part, Role))
)]
pub struct GeminiApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/gemini", post(ask_gemini))
}

/// Ask EDITH (`POST /api/gemini`).
///
/// `history` holds the earlier turns of the chat, oldest first; the query is
/// appended as the final user turn.
#[utoipa::path(
    post,
    path = "/api/gemini",
    tag = "gemini",
    request_body = ProxyRequest,
    responses(
        (status = 200, description = "Reply generated", body = ProxyResponse),
        (status = 400, description = "Missing query or malformed body", body = ErrorBody),
        (status = 500, description = "Missing API key or upstream failure", body = ErrorBody),
    )
)]
pub async fn ask_gemini(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ProxyRequest>, JsonRejection>,
) -> Result<Json<ProxyResponse>, ServerError> {
    let Some(client) = state.gemini.as_ref() else {
        return Err(ServerError::Configuration(API_KEY_MISSING.to_owned()));
    };

    let Json(req) = payload.map_err(|rejection| {
        debug!(error = %rejection, "rejected proxy request body");
        match rejection {
            JsonRejection::MissingJsonContentType(_) => {
                ServerError::BadRequest(QUERY_REQUIRED.to_owned())
            }
            other => ServerError::BadRequest(format!("Invalid request body: {}", other.body_text())),
        }
    })?;

    let query = req
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ServerError::BadRequest(QUERY_REQUIRED.to_owned()))?;
    let history = req.history.unwrap_or_default();

    info!(model = client.model(), history = history.len(), "forwarding query");
    let response = client
        .generate_text(&history, query)
        .await?
        .unwrap_or_else(|| EMPTY_RESPONSE_FALLBACK.to_owned());

    Ok(Json(ProxyResponse { response }))
}
