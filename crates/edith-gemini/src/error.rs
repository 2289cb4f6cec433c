use thiserror::Error;

/// Errors returned by [`crate::GeminiClient`].
///
/// `Display` yields only the relayable message so callers can prefix it with
/// their own context.
#[derive(Debug, Error)]
pub enum GeminiError {
    /// Transport failure (DNS, TLS, connection reset, timeout, ...).
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-2xx status.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// A 2xx body that does not match the response schema.
    #[error("Invalid response from Gemini: {message}")]
    InvalidResponse { message: String },
}

impl GeminiError {
    /// HTTP status reported by the upstream, if the failure came with one.
    pub fn status(&self) -> Option<u16> {
        match self {
            GeminiError::Status { status, .. } => Some(*status),
            GeminiError::Http(e) => e.status().map(|s| s.as_u16()),
            GeminiError::InvalidResponse { .. } => None,
        }
    }
}
