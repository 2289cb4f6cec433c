//! Bodies of `POST /api/gemini`.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::chat::Turn;

/// Request body. Both fields are optional on the wire so that a missing
/// `query` is reported as a validation error instead of a decode failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ProxyRequest {
    #[serde(default)]
    pub query: Option<String>,
    /// Prior turns, oldest first, excluding the current query.
    #[serde(default)]
    pub history: Option<Vec<Turn>>,
}

impl ProxyRequest {
    pub fn new(query: impl Into<String>, history: Vec<Turn>) -> Self {
        Self {
            query: Some(query.into()),
            history: Some(history),
        }
    }
}

/// Successful reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProxyResponse {
    pub response: String,
}

/// Error reply, used with every non-2xx status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}
