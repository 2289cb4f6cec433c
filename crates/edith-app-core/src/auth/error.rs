use thiserror::Error;

/// Failure reported by an [`crate::auth::IdentityProvider`].
#[derive(Debug, Error)]
pub enum AuthError {
    /// The provider rejected the call with an error code such as
    /// `EMAIL_EXISTS` or `auth/wrong-password`.
    #[error("identity provider error {code}: {message}")]
    Provider { code: String, message: String },

    /// Transport failure talking to the provider.
    #[error("identity request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered 2xx with a body we could not read.
    #[error("unexpected identity provider response: {0}")]
    InvalidResponse(String),

    /// No API key configured for the provider.
    #[error("identity provider is not configured")]
    NotConfigured,
}

/// Code used when reauthentication signs in someone other than the current user.
pub const USER_MISMATCH: &str = "USER_MISMATCH";

impl AuthError {
    pub fn provider(code: impl Into<String>) -> Self {
        let code = code.into();
        AuthError::Provider {
            message: code.clone(),
            code,
        }
    }

    /// Provider error code with any detail suffix removed, e.g.
    /// `"WEAK_PASSWORD : Password should be ..."` becomes `"WEAK_PASSWORD"`.
    pub fn code(&self) -> Option<&str> {
        match self {
            AuthError::Provider { code, .. } => {
                Some(code.split(&[' ', ':'][..]).next().unwrap_or(code.as_str()))
            }
            _ => None,
        }
    }

    pub fn is_email_in_use(&self) -> bool {
        matches!(self.code(), Some("EMAIL_EXISTS" | "auth/email-already-in-use"))
    }

    pub fn is_wrong_credentials(&self) -> bool {
        matches!(
            self.code(),
            Some(
                "INVALID_PASSWORD"
                    | "INVALID_LOGIN_CREDENTIALS"
                    | "auth/wrong-password"
                    | "auth/invalid-credential"
            )
        )
    }

    pub fn is_user_not_found(&self) -> bool {
        matches!(self.code(), Some("EMAIL_NOT_FOUND" | "auth/user-not-found"))
    }

    pub fn is_user_mismatch(&self) -> bool {
        matches!(self.code(), Some(USER_MISMATCH | "auth/user-mismatch"))
    }
}
