use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

/// Chat identifier: creation time in epoch milliseconds.
///
/// The decimal rendering doubles as the document key under
/// `users/{uid}/chats/{chatId}`.
pub type ChatId = i64;

/// Author of a turn, in the generative-language API's vocabulary.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// A single content part. Only text parts are produced or consumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Part {
    pub text: String,
}

/// One role-tagged message unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Turn {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Turn {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![Part { text: text.into() }],
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self::new(Role::Model, text)
    }

    /// Text of the first part, or `""` for a turn without parts.
    pub fn text(&self) -> &str {
        self.parts.first().map(|p| p.text.as_str()).unwrap_or("")
    }
}

/// A titled, ordered sequence of turns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub id: ChatId,
    pub title: String,
    #[serde(default)]
    pub messages: Vec<Turn>,
    #[serde(default)]
    pub is_archived: bool,
    /// Owner uid; set when the chat is persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl ChatSession {
    /// A fresh chat titled after its first message.
    pub fn new(id: ChatId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            messages: Vec::new(),
            is_archived: false,
            user_id: None,
        }
    }

    /// Document key of this chat.
    pub fn doc_id(&self) -> String {
        self.id.to_string()
    }

    /// Creation time derived from the id.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.id).single()
    }

    /// Title shortened for the sidebar.
    pub fn display_title(&self) -> String {
        truncate_title(&self.title, 20)
    }
}

/// Shortens `title` to at most `max` characters, ending in `"..."` when cut.
pub fn truncate_title(title: &str, max: usize) -> String {
    if title.chars().count() <= max {
        return title.to_owned();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = title.chars().take(keep).collect();
    out.push_str("...");
    out
}
