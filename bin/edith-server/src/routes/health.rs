//! Health / heartbeat endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use utoipa::OpenApi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(get_health))]
pub struct HealthApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(get_health))
}

/// Heartbeat endpoint.
///
/// Always 200; `upstream_configured` tells whether proxy calls can succeed.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Server is healthy", body = Value)
    )
)]
pub async fn get_health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status":  "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "model":   state.config.gemini_model,
        "upstream_configured": state.gemini.is_some(),
    }))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::Config;

    fn state(api_key: Option<&str>) -> State<Arc<AppState>> {
        let config = Config {
            gemini_api_key: api_key.map(str::to_owned),
            ..Config::default()
        };
        State(Arc::new(AppState::new(config).unwrap()))
    }

    #[tokio::test]
    async fn health_response_has_ok_status_and_version() {
        let Json(body) = get_health(state(None)).await;
        assert_eq!(body["status"], "ok");
        assert!(!body["version"].as_str().unwrap_or("").is_empty());
    }

    #[tokio::test]
    async fn health_reports_upstream_configuration() {
        let Json(body) = get_health(state(None)).await;
        assert_eq!(body["upstream_configured"], false);
        let Json(body) = get_health(state(Some("k"))).await;
        assert_eq!(body["upstream_configured"], true);
        assert_eq!(body["model"], "gemini-pro");
    }
}
