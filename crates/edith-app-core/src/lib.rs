//! Client-side core of EDITH.
//!
//! * [`auth`] – identity provider adapter (Firebase Identity Toolkit REST).
//! * [`entities`] – document store for the `users`, `chats` and `reports`
//!   collections (SQLite via sqlx).
//! * [`session`] – in-memory chat list and active-chat state machine.
//! * [`controller`] – drives a chat turn: session store → proxy → store.
//! * [`account`] – account lifecycle built on the identity adapter.
//! * [`cache`] / [`export`] – local username/chat cache and JSON export.

pub mod account;
pub mod auth;
pub mod cache;
pub mod config;
pub mod controller;
pub mod entities;
pub mod error;
pub mod export;
pub mod proxy;
pub mod session;

pub use account::{AccountService, Reauth, SignInOutcome, SignUpForm};
pub use auth::{AuthError, AuthUser, FirebaseIdentity, IdentityProvider};
pub use cache::LocalCache;
pub use config::ClientConfig;
pub use controller::{ChatController, TurnOutcome};
pub use entities::{ChatStore, ReportStore, SqliteStore, UserStore};
pub use error::{AuthAction, CoreError};
pub use proxy::{HttpProxyClient, ProxyClient, ProxyError};
pub use session::{SessionState, SessionStore};
