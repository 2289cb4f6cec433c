use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::routes::{gemini, health};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(info(
    title = "edith-server",
    description = "Proxy between the EDITH client and the generative-language API",
    version = "0.1.0",
))]
pub struct ApiDoc;

pub fn get_docs() -> utoipa::openapi::OpenApi {
    let mut root = ApiDoc::openapi();
    root.merge(health::HealthApi::openapi());
    root.merge(gemini::GeminiApi::openapi());
    root
}

/// `GET /api-docs/openapi.json`
pub fn router() -> Router<Arc<AppState>> {
    let doc = get_docs();
    Router::new().route(
        "/api-docs/openapi.json",
        get(move || {
            let doc = doc.clone();
            async move { Json(doc) }
        }),
    )
}
