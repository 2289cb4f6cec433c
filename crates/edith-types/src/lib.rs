//! Shared types for EDITH.
//!
//! Everything that crosses a process boundary lives here: the `/api/gemini`
//! request/response bodies, conversation turns, and the documents written to
//! the `users`, `chats` and `reports` collections.  Field names follow the
//! camelCase layout of the stored documents.

pub mod chat;
pub mod proxy;
pub mod report;
pub mod user;

pub use chat::{ChatId, ChatSession, Part, Role, Turn, truncate_title};
pub use proxy::{ErrorBody, ProxyRequest, ProxyResponse};
pub use report::{Report, ReportStatus};
pub use user::UserProfile;
