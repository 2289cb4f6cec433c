//! Identity provider adapter.
//!
//! [`IdentityProvider`] is the seam between EDITH and the hosted identity
//! service.  [`FirebaseIdentity`] talks to the Identity Toolkit REST API; tests
//! plug in an in-process fake.  Sign-out has no provider call: dropping the
//! local session is enough.

pub mod error;
pub mod firebase;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use error::AuthError;
pub use firebase::FirebaseIdentity;

/// Provider id of email/password accounts.
pub const PASSWORD_PROVIDER: &str = "password";
/// Provider id of Google accounts.
pub const GOOGLE_PROVIDER: &str = "google.com";

/// A signed-in account as reported by the provider.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub uid: String,
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub provider_id: String,
    pub id_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl std::fmt::Debug for AuthUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthUser")
            .field("uid", &self.uid)
            .field("email", &self.email)
            .field("display_name", &self.display_name)
            .field("provider_id", &self.provider_id)
            .finish_non_exhaustive()
    }
}

impl AuthUser {
    /// First word of the display name, if the provider supplied one.
    pub fn first_name(&self) -> Option<&str> {
        self.display_name.as_deref()?.split_whitespace().next()
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create an email/password account and sign it in.
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthUser, AuthError>;

    /// Sign in with a Google ID token obtained by the caller.
    async fn sign_in_with_google(&self, id_token: &str) -> Result<AuthUser, AuthError>;

    /// Email a password-reset link. `continue_url` is where the link lands.
    async fn send_password_reset(
        &self,
        email: &str,
        continue_url: Option<&str>,
    ) -> Result<(), AuthError>;

    /// Check a reset code; returns the email it was issued for.
    async fn verify_password_reset_code(&self, code: &str) -> Result<String, AuthError>;

    async fn confirm_password_reset(&self, code: &str, new_password: &str)
        -> Result<(), AuthError>;

    /// Delete the account the (fresh) ID token belongs to.
    async fn delete_account(&self, id_token: &str) -> Result<(), AuthError>;
}
