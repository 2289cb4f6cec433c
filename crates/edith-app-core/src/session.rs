//! In-memory chat list and active-chat tracking.
//!
//! Lifecycle of the active chat:
//!
//! ```text
//! none ──begin_turn──▶ active(new) ──mark_persisted──▶ active(persisted)
//!   ▲                                                    │        │
//!   └──────── start_new / remove(active) ◀───────────────┘     rename
//! ```
//!
//! The store performs no I/O; the [`crate::ChatController`] mirrors each
//! transition to the document store.

use std::collections::HashSet;

use chrono::Utc;
use edith_types::{ChatId, ChatSession, Turn};

/// Observable state of the active chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No chat selected; the next submission creates one.
    None,
    /// Created locally, not yet written to the document store.
    New(ChatId),
    /// Selected and known to the document store.
    Persisted(ChatId),
}

/// What the controller needs to run one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTurn {
    pub chat_id: ChatId,
    /// `true` when this turn created the chat.
    pub is_new_chat: bool,
    /// Turns before the one just appended.
    pub history: Vec<Turn>,
}

#[derive(Debug, Default)]
pub struct SessionStore {
    /// Newest first.
    chats: Vec<ChatSession>,
    active: Option<ChatId>,
    unsaved: HashSet<ChatId>,
    last_id: ChatId,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the list with `chats` (e.g. after loading from the store).
    /// The active chat is kept only if it is still present.
    pub fn replace_all(&mut self, mut chats: Vec<ChatSession>) {
        chats.sort_by(|a, b| b.id.cmp(&a.id));
        self.last_id = self.last_id.max(chats.first().map(|c| c.id).unwrap_or(0));
        self.chats = chats;
        self.unsaved.clear();
        if let Some(id) = self.active {
            if self.get(id).is_none() {
                self.active = None;
            }
        }
    }

    pub fn chats(&self) -> &[ChatSession] {
        &self.chats
    }

    pub fn get(&self, id: ChatId) -> Option<&ChatSession> {
        self.chats.iter().find(|c| c.id == id)
    }

    fn get_mut(&mut self, id: ChatId) -> Option<&mut ChatSession> {
        self.chats.iter_mut().find(|c| c.id == id)
    }

    pub fn active_id(&self) -> Option<ChatId> {
        self.active
    }

    pub fn active(&self) -> Option<&ChatSession> {
        self.active.and_then(|id| self.get(id))
    }

    pub fn state(&self) -> SessionState {
        match self.active {
            None => SessionState::None,
            Some(id) if self.unsaved.contains(&id) => SessionState::New(id),
            Some(id) => SessionState::Persisted(id),
        }
    }

    /// Deselect the active chat; the next submission starts a new one.
    pub fn start_new(&mut self) {
        self.active = None;
    }

    /// Make `id` the active chat. Unknown ids leave the state untouched.
    pub fn select(&mut self, id: ChatId) -> Option<&ChatSession> {
        if self.get(id).is_some() {
            self.active = Some(id);
        }
        self.get(id)
    }

    /// Next chat id at `now_ms`; strictly greater than any id handed out or
    /// loaded before.
    fn next_id(&mut self, now_ms: i64) -> ChatId {
        let id = now_ms.max(self.last_id + 1);
        self.last_id = id;
        id
    }

    /// Append a user turn, creating (and selecting) a chat titled `query`
    /// when none is active.
    pub fn begin_turn(&mut self, query: &str) -> PendingTurn {
        self.begin_turn_at(query, Utc::now().timestamp_millis())
    }

    pub fn begin_turn_at(&mut self, query: &str, now_ms: i64) -> PendingTurn {
        let existing = self
            .active
            .and_then(|id| self.chats.iter().position(|c| c.id == id));
        let (index, is_new_chat) = match existing {
            Some(index) => (index, false),
            None => {
                let id = self.next_id(now_ms);
                self.chats.insert(0, ChatSession::new(id, query));
                self.unsaved.insert(id);
                self.active = Some(id);
                (0, true)
            }
        };

        let chat = &mut self.chats[index];
        let history = chat.messages.clone();
        chat.messages.push(Turn::user(query));

        PendingTurn {
            chat_id: chat.id,
            is_new_chat,
            history,
        }
    }

    /// Append the model's reply. Returns the updated chat, or `None` if it
    /// was deleted while the request was in flight.
    pub fn complete_turn(&mut self, chat_id: ChatId, reply: &str) -> Option<&ChatSession> {
        let chat = self.get_mut(chat_id)?;
        chat.messages.push(Turn::model(reply));
        Some(chat)
    }

    pub fn mark_persisted(&mut self, chat_id: ChatId) {
        self.unsaved.remove(&chat_id);
    }

    /// Rename `id` to the trimmed `title`. Returns the new title when it
    /// changed; blank or identical titles are ignored.
    pub fn rename(&mut self, id: ChatId, title: &str) -> Option<String> {
        let title = title.trim();
        let chat = self.get_mut(id)?;
        if title.is_empty() || title == chat.title {
            return None;
        }
        chat.title = title.to_owned();
        Some(chat.title.clone())
    }

    /// Remove `id` from the list, resetting the active chat if it was selected.
    pub fn remove(&mut self, id: ChatId) -> Option<ChatSession> {
        let index = self.chats.iter().position(|c| c.id == id)?;
        self.unsaved.remove(&id);
        if self.active == Some(id) {
            self.active = None;
        }
        Some(self.chats.remove(index))
    }
}
