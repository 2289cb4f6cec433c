//! Axum router construction.
//!
//! [`build`] assembles the complete application router:
//! - Middleware layers (CORS, per-request trace-ID injection)
//! - Health route and the `/api/gemini` proxy endpoint
//! - Optional OpenAPI document (disable with `EDITH_ENABLE_DOCS=false`)
//! - Static client assets when the static directory exists
//! - JSON 404 for everything else

pub mod doc;
mod gemini;
mod health;

use std::sync::Arc;

use axum::handler::HandlerWithoutStateExt;
use axum::http::{Method, Uri};
use axum::{Router, middleware};
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tracing::info;

use crate::error::ServerError;
use crate::middleware::{cors, trace};
use crate::state::AppState;

/// Build the complete Axum [`Router`] for the application.
pub fn build(state: Arc<AppState>) -> Router {
    let mut app = Router::new()
        .merge(health::router())
        .merge(gemini::router());

    if state.config.enable_docs {
        app = app.merge(doc::router());
    }

    app = app.method_not_allowed_fallback(not_found);

    let static_dir = &state.config.static_dir;
    app = if static_dir.is_dir() {
        info!(dir = %static_dir.display(), "serving static files");
        app.fallback_service(
            ServeDir::new(static_dir)
                .call_fallback_on_method_not_allowed(true)
                .fallback(not_found.into_service()),
        )
    } else {
        app.fallback(not_found)
    };

    app.layer(
        ServiceBuilder::new()
            // Outermost layers execute first on the way in.
            .layer(middleware::from_fn(trace::trace_middleware))
            .layer(cors::cors_layer(&state)),
    )
    .with_state(state)
}

async fn not_found(method: Method, uri: Uri) -> ServerError {
    let target = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    ServerError::NotFound(format!("Route not found: {method} {target}"))
}
