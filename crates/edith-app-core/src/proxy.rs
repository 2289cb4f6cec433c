//! Client for the EDITH proxy endpoint (`POST /api/gemini`).

use std::time::Duration;

use async_trait::async_trait;
use edith_types::{ErrorBody, ProxyRequest, ProxyResponse, Turn};
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

/// Message used when the proxy fails without saying why.
pub const UNKNOWN_PROXY_ERROR: &str = "An unknown error occurred.";

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx reply; `message` is the body's `error` field.
    #[error("{message}")]
    Rejected { status: u16, message: String },
}

/// Sends one turn to the proxy and returns the reply text.
#[async_trait]
pub trait ProxyClient: Send + Sync {
    async fn ask(&self, query: &str, history: &[Turn]) -> Result<String, ProxyError>;
}

#[derive(Debug, Clone)]
pub struct HttpProxyClient {
    http: Client,
    endpoint: String,
}

impl HttpProxyClient {
    /// `server_url` is the proxy's origin, e.g. `http://localhost:3000`.
    pub fn new(server_url: &str, timeout: Duration) -> Result<Self, ProxyError> {
        Ok(Self {
            http: Client::builder().timeout(timeout).build()?,
            endpoint: format!("{}/api/gemini", server_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl ProxyClient for HttpProxyClient {
    async fn ask(&self, query: &str, history: &[Turn]) -> Result<String, ProxyError> {
        debug!(endpoint = %self.endpoint, history = history.len(), "sending turn to proxy");
        let response = self
            .http
            .post(&self.endpoint)
            .json(&ProxyRequest::new(query, history.to_vec()))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|body| body.error)
                .ok()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| UNKNOWN_PROXY_ERROR.to_owned());
            return Err(ProxyError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let body: ProxyResponse = response.json().await?;
        Ok(body.response)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{Value, json};

    async fn spawn(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn ask_posts_query_and_history() {
        let app = Router::new().route(
            "/api/gemini",
            post(|Json(body): Json<Value>| async move {
                let reply = format!(
                    "{} after {} turns",
                    body["query"].as_str().unwrap_or_default(),
                    body["history"].as_array().map(|h| h.len()).unwrap_or(0)
                );
                Json(json!({ "response": reply }))
            }),
        );
        let base = spawn(app).await;

        let client = HttpProxyClient::new(&base, Duration::from_secs(5)).unwrap();
        let reply = client
            .ask("q", &[Turn::user("a"), Turn::model("b")])
            .await
            .unwrap();
        assert_eq!(reply, "q after 2 turns");
    }

    #[tokio::test]
    async fn error_body_is_relayed() {
        let app = Router::new().route(
            "/api/gemini",
            post(|| async {
                (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "upstream down" })))
            }),
        );
        let base = spawn(app).await;

        let err = HttpProxyClient::new(&base, Duration::from_secs(5))
            .unwrap()
            .ask("q", &[])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "upstream down");
    }

    #[tokio::test]
    async fn error_without_body_uses_generic_message() {
        let app = Router::new().route(
            "/api/gemini",
            post(|| async { StatusCode::BAD_GATEWAY }),
        );
        let base = spawn(app).await;

        let err = HttpProxyClient::new(&base, Duration::from_secs(5))
            .unwrap()
            .ask("q", &[])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), UNKNOWN_PROXY_ERROR);
    }
}
