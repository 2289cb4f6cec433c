//! Client-side error type.
//!
//! Variants carry the message shown to the user; the underlying cause is kept
//! as the error source for logging.

use strum::Display;
use thiserror::Error;

use crate::auth::AuthError;

pub const SIGN_UP_FAILED: &str = "Unable to create account. Please try again.";
pub const ACCOUNT_DELETION_FAILED: &str = "An error occurred. We could not delete your account. Please sign out and sign back in to try again.";

/// The account operation an [`AuthError`] came from; decides its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum AuthAction {
    SignUp,
    SignIn,
    GoogleSignIn,
    ResetRequest,
    ResetVerify,
    ResetConfirm,
    Reauthenticate,
    DeleteAccount,
}

impl AuthAction {
    /// User-facing message for `err` raised during this action.
    pub fn message_for(self, err: &AuthError) -> &'static str {
        match self {
            AuthAction::SignUp if err.is_email_in_use() => "Email Address Already Exists!",
            AuthAction::SignUp => SIGN_UP_FAILED,
            AuthAction::SignIn if err.is_wrong_credentials() || err.is_user_not_found() => {
                "Incorrect Email or Password."
            }
            AuthAction::SignIn => "Unable to sign in. Please try again.",
            AuthAction::GoogleSignIn => "Could not sign in with Google. Please try again.",
            AuthAction::ResetRequest if err.is_user_not_found() => {
                "No account found with that email address."
            }
            AuthAction::ResetRequest => "Error sending reset email. Please try again.",
            AuthAction::ResetVerify => "This link is invalid or has expired. Please try again.",
            AuthAction::ResetConfirm => "Error resetting password. The link may have expired.",
            AuthAction::Reauthenticate if err.is_wrong_credentials() || err.is_user_mismatch() => {
                "Wrong password. Please try again."
            }
            AuthAction::Reauthenticate => "An error occurred. Please try again.",
            AuthAction::DeleteAccount => ACCOUNT_DELETION_FAILED,
        }
    }
}

#[derive(Debug, Error)]
pub enum CoreError {
    /// Identity provider failure, translated for the user.
    #[error("{message}")]
    Auth {
        action: AuthAction,
        message: &'static str,
        #[source]
        source: AuthError,
    },

    /// Propagated from the document store.
    #[error("database error: {0}")]
    Store(#[from] sqlx::Error),

    /// The proxy endpoint failed; the message is relayed as-is.
    #[error("{0}")]
    Proxy(String),

    /// Missing or malformed user input.
    #[error("{0}")]
    Validation(String),

    #[error("Please sign in to start chatting.")]
    NotSignedIn,

    #[error("not found: {0}")]
    NotFound(String),

    /// The operation is not available for this account.
    #[error("{0}")]
    Unsupported(String),

    /// The account exists but its `users/{uid}` profile could not be written.
    #[error("{}", SIGN_UP_FAILED)]
    ProfileCreation(#[source] sqlx::Error),

    /// A step of account deletion failed after reauthentication succeeded.
    #[error("{}", ACCOUNT_DELETION_FAILED)]
    AccountDeletion(#[source] Box<CoreError>),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    pub fn auth(action: AuthAction, source: AuthError) -> Self {
        CoreError::Auth {
            action,
            message: action.message_for(&source),
            source,
        }
    }
}
