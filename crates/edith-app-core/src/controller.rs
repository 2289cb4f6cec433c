//! Chat controller.
//!
//! Owns the [`SessionStore`] and sequences a turn: append the user turn,
//! call the proxy, append the reply, mirror the chat to the document store.
//! Submissions are serialized: a second submission waits until the first
//! turn has completed, so turns land in submission order.
//!
//! Document-store failures are logged and do not fail the turn.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use edith_types::{ChatId, ChatSession};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::cache::LocalCache;
use crate::entities::ChatStore;
use crate::error::CoreError;
use crate::export;
use crate::proxy::ProxyClient;
use crate::session::{SessionState, SessionStore};

/// Result of a successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub chat_id: ChatId,
    /// `true` when the submission started a new chat.
    pub is_new_chat: bool,
    pub reply: String,
}

pub struct ChatController<S> {
    store: Arc<S>,
    proxy: Arc<dyn ProxyClient>,
    /// Signed-in user; `None` disables submissions and persistence.
    uid: Option<String>,
    sessions: Mutex<SessionStore>,
    submit_gate: Mutex<()>,
    cache: Option<LocalCache>,
}

impl<S: ChatStore> ChatController<S> {
    pub fn new(store: Arc<S>, proxy: Arc<dyn ProxyClient>, uid: Option<String>) -> Self {
        Self {
            store,
            proxy,
            uid,
            sessions: Mutex::new(SessionStore::new()),
            submit_gate: Mutex::new(()),
            cache: None,
        }
    }

    /// Mirror the chat list into `cache` and fall back to it when the store
    /// cannot be read.
    pub fn with_cache(mut self, cache: LocalCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn uid(&self) -> Option<&str> {
        self.uid.as_deref()
    }

    /// Replace the local list with the user's chats from the store.
    ///
    /// A failed read falls back to this user's cached snapshot (or an empty
    /// list). Returns the number of chats loaded.
    pub async fn load_chats(&self) -> usize {
        let Some(uid) = self.uid.as_deref() else {
            self.sessions.lock().await.replace_all(Vec::new());
            return 0;
        };

        let (chats, from_store) = match self.store.list_chats(uid).await {
            Ok(chats) => (chats, true),
            Err(e) => {
                warn!(error = %e, "failed to load chats from the store");
                let cached = match &self.cache {
                    Some(cache) => cache.chats(uid).await.unwrap_or_default(),
                    None => Vec::new(),
                };
                (cached, false)
            }
        };
        let count = chats.len();
        self.sessions.lock().await.replace_all(chats);
        if from_store {
            self.refresh_cache().await;
        }
        debug!(count, from_store, "chats loaded");
        count
    }

    pub async fn chats(&self) -> Vec<ChatSession> {
        self.sessions.lock().await.chats().to_vec()
    }

    pub async fn state(&self) -> SessionState {
        self.sessions.lock().await.state()
    }

    pub async fn active_chat(&self) -> Option<ChatSession> {
        self.sessions.lock().await.active().cloned()
    }

    pub async fn select(&self, id: ChatId) -> Result<ChatSession, CoreError> {
        self.sessions
            .lock()
            .await
            .select(id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(format!("chat {id}")))
    }

    pub async fn start_new_chat(&self) {
        self.sessions.lock().await.start_new();
    }

    /// Run one turn. A blank query is ignored (`Ok(None)`).
    ///
    /// On a proxy failure the user turn stays in the local chat and the
    /// proxy's message is returned as [`CoreError::Proxy`].
    pub async fn submit(&self, query: &str) -> Result<Option<TurnOutcome>, CoreError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(None);
        }
        let uid = self.uid.as_deref().ok_or(CoreError::NotSignedIn)?;

        let _turn = self.submit_gate.lock().await;

        let (pending, created) = {
            let mut sessions = self.sessions.lock().await;
            let pending = sessions.begin_turn(query);
            let created = pending
                .is_new_chat
                .then(|| ChatSession::new(pending.chat_id, query));
            (pending, created)
        };

        if let Some(mut chat) = created {
            chat.user_id = Some(uid.to_owned());
            match self.store.put_chat(uid, &chat).await {
                Ok(()) => {
                    self.sessions.lock().await.mark_persisted(chat.id);
                    info!(chat_id = chat.id, "created chat");
                }
                Err(e) => warn!(chat_id = chat.id, error = %e, "failed to create chat in the store"),
            }
        }

        let reply = match self.proxy.ask(query, &pending.history).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(chat_id = pending.chat_id, error = %e, "proxy call failed");
                return Err(CoreError::Proxy(e.to_string()));
            }
        };

        let updated = self
            .sessions
            .lock()
            .await
            .complete_turn(pending.chat_id, &reply)
            .cloned();

        match updated {
            Some(chat) => self.persist_messages(uid, &chat).await,
            None => warn!(chat_id = pending.chat_id, "chat was deleted while awaiting the reply"),
        }
        self.refresh_cache().await;

        Ok(Some(TurnOutcome {
            chat_id: pending.chat_id,
            is_new_chat: pending.is_new_chat,
            reply,
        }))
    }

    async fn persist_messages(&self, uid: &str, chat: &ChatSession) {
        match self.store.update_messages(uid, chat.id, &chat.messages).await {
            Ok(true) => {}
            Ok(false) => {
                // The create step failed earlier; write the whole document.
                let mut doc = chat.clone();
                doc.user_id = Some(uid.to_owned());
                match self.store.put_chat(uid, &doc).await {
                    Ok(()) => self.sessions.lock().await.mark_persisted(chat.id),
                    Err(e) => warn!(chat_id = chat.id, error = %e, "failed to save chat"),
                }
            }
            Err(e) => warn!(chat_id = chat.id, error = %e, "failed to save message"),
        }
    }

    /// Rename a chat. Returns `false` when nothing changed.
    pub async fn rename(&self, id: ChatId, title: &str) -> Result<bool, CoreError> {
        let new_title = {
            let mut sessions = self.sessions.lock().await;
            if sessions.get(id).is_none() {
                return Err(CoreError::NotFound(format!("chat {id}")));
            }
            sessions.rename(id, title)
        };
        let Some(new_title) = new_title else {
            return Ok(false);
        };

        if let Some(uid) = self.uid.as_deref() {
            if let Err(e) = self.store.rename_chat(uid, id, &new_title).await {
                warn!(chat_id = id, error = %e, "failed to rename chat in the store");
            }
        }
        self.refresh_cache().await;
        Ok(true)
    }

    /// Delete a chat locally and in the store. Deleting the active chat
    /// resets the controller to "no chat selected".
    pub async fn delete(&self, id: ChatId) -> Result<(), CoreError> {
        if self.sessions.lock().await.get(id).is_none() {
            return Err(CoreError::NotFound(format!("chat {id}")));
        }
        if let Some(uid) = self.uid.as_deref() {
            if let Err(e) = self.store.delete_chat(uid, id).await {
                warn!(chat_id = id, error = %e, "failed to delete chat from the store");
            }
        }
        self.sessions.lock().await.remove(id);
        self.refresh_cache().await;
        info!(chat_id = id, "deleted chat");
        Ok(())
    }

    /// Export the selected chats into `dir`.
    pub async fn export(
        &self,
        selected: &[ChatId],
        dir: &Path,
        date: NaiveDate,
    ) -> Result<PathBuf, CoreError> {
        let chats = self.chats().await;
        export::export_chats(&chats, selected, dir, date).await
    }

    async fn refresh_cache(&self) {
        let (Some(cache), Some(uid)) = (&self.cache, self.uid.as_deref()) else {
            return;
        };
        let chats = self.chats().await;
        if let Err(e) = cache.set_chats(uid, chats).await {
            warn!(error = %e, "failed to update the local chat cache");
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::entities::SqliteStore;
    use crate::proxy::ProxyError;
    use async_trait::async_trait;
    use edith_types::Turn;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;
    use tracing_test::traced_test;

    /// Replies `"re: <query>"` and records the history it was given.
    #[derive(Default)]
    struct EchoProxy {
        seen: StdMutex<Vec<(String, Vec<Turn>)>>,
        fail_with: Option<String>,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl ProxyClient for EchoProxy {
        async fn ask(&self, query: &str, history: &[Turn]) -> Result<String, ProxyError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.seen
                .lock()
                .unwrap()
                .push((query.to_owned(), history.to_vec()));
            match &self.fail_with {
                Some(message) => Err(ProxyError::Rejected {
                    status: 500,
                    message: message.clone(),
                }),
                None => Ok(format!("re: {query}")),
            }
        }
    }

    async fn controller(proxy: EchoProxy) -> (ChatController<SqliteStore>, Arc<SqliteStore>, Arc<EchoProxy>) {
        let store = Arc::new(SqliteStore::in_memory().await.unwrap());
        let proxy = Arc::new(proxy);
        let ctl = ChatController::new(store.clone(), proxy.clone(), Some("uid-1".into()));
        (ctl, store, proxy)
    }

    #[tokio::test]
    async fn first_submission_creates_and_persists_a_chat() {
        let (ctl, store, _) = controller(EchoProxy::default()).await;

        let outcome = ctl.submit("  what is pi  ").await.unwrap().unwrap();
        assert!(outcome.is_new_chat);
        assert_eq!(outcome.reply, "re: what is pi");
        assert_eq!(ctl.state().await, SessionState::Persisted(outcome.chat_id));

        let stored = store.get_chat("uid-1", outcome.chat_id).await.unwrap().unwrap();
        assert_eq!(stored.title, "what is pi");
        assert_eq!(stored.messages, vec![Turn::user("what is pi"), Turn::model("re: what is pi")]);
    }

    #[tokio::test]
    async fn persisted_chat_reloads_identically() {
        let (ctl, store, proxy) = controller(EchoProxy::default()).await;
        let first = ctl.submit("one").await.unwrap().unwrap();
        ctl.submit("two").await.unwrap();
        let local = ctl.active_chat().await.unwrap();

        let reloaded = ChatController::new(store, proxy, Some("uid-1".into()));
        assert_eq!(reloaded.load_chats().await, 1);
        let chat = reloaded.select(first.chat_id).await.unwrap();
        assert_eq!(chat.title, local.title);
        assert_eq!(chat.messages, local.messages);
    }

    #[tokio::test]
    async fn history_excludes_the_current_turn() {
        let (ctl, _, proxy) = controller(EchoProxy::default()).await;
        ctl.submit("one").await.unwrap();
        ctl.submit("two").await.unwrap();

        let seen = proxy.seen.lock().unwrap().clone();
        assert!(seen[0].1.is_empty());
        assert_eq!(seen[1].1, vec![Turn::user("one"), Turn::model("re: one")]);
    }

    #[tokio::test]
    async fn blank_query_is_ignored() {
        let (ctl, _, proxy) = controller(EchoProxy::default()).await;
        assert!(ctl.submit("   ").await.unwrap().is_none());
        assert!(proxy.seen.lock().unwrap().is_empty());
        assert_eq!(ctl.state().await, SessionState::None);
    }

    #[tokio::test]
    async fn signed_out_user_cannot_submit() {
        let store = Arc::new(SqliteStore::in_memory().await.unwrap());
        let ctl = ChatController::new(store, Arc::new(EchoProxy::default()), None);
        let err = ctl.submit("hi").await.unwrap_err();
        assert!(matches!(err, CoreError::NotSignedIn));
    }

    #[tokio::test]
    #[traced_test]
    async fn proxy_failure_keeps_user_turn_and_relays_message() {
        let (ctl, _, _) = controller(EchoProxy {
            fail_with: Some("Failed to get response from Gemini. quota".into()),
            ..Default::default()
        })
        .await;

        let err = ctl.submit("hi").await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to get response from Gemini. quota");
        let chat = ctl.active_chat().await.unwrap();
        assert_eq!(chat.messages, vec![Turn::user("hi")]);
        assert!(logs_contain("proxy call failed"));
    }

    #[tokio::test]
    async fn deleting_the_active_chat_resets_everywhere() {
        let (ctl, store, _) = controller(EchoProxy::default()).await;
        let outcome = ctl.submit("doomed").await.unwrap().unwrap();

        ctl.delete(outcome.chat_id).await.unwrap();
        assert!(ctl.chats().await.is_empty());
        assert_eq!(ctl.state().await, SessionState::None);
        assert!(store.get_chat("uid-1", outcome.chat_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn deleting_another_chat_keeps_selection() {
        let (ctl, _, _) = controller(EchoProxy::default()).await;
        let a = ctl.submit("a").await.unwrap().unwrap();
        ctl.start_new_chat().await;
        let b = ctl.submit("b").await.unwrap().unwrap();

        ctl.delete(a.chat_id).await.unwrap();
        assert_eq!(ctl.state().await, SessionState::Persisted(b.chat_id));
        assert!(matches!(ctl.delete(a.chat_id).await, Err(CoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn rename_updates_store() {
        let (ctl, store, _) = controller(EchoProxy::default()).await;
        let outcome = ctl.submit("first words").await.unwrap().unwrap();

        assert!(ctl.rename(outcome.chat_id, " Physics ").await.unwrap());
        assert!(!ctl.rename(outcome.chat_id, "Physics").await.unwrap());
        let stored = store.get_chat("uid-1", outcome.chat_id).await.unwrap().unwrap();
        assert_eq!(stored.title, "Physics");
    }

    #[tokio::test]
    async fn concurrent_submissions_are_serialized() {
        let (ctl, _, proxy) = controller(EchoProxy {
            delay: Some(Duration::from_millis(20)),
            ..Default::default()
        })
        .await;
        let ctl = Arc::new(ctl);
        ctl.submit("first").await.unwrap();

        let (a, b) = tokio::join!(ctl.submit("second"), ctl.submit("third"));
        a.unwrap();
        b.unwrap();

        let chat = ctl.active_chat().await.unwrap();
        let roles: Vec<_> = chat.messages.iter().map(|t| t.role).collect();
        use edith_types::Role::{Model, User};
        assert_eq!(roles, [User, Model, User, Model, User, Model]);
        // The later call saw the earlier turn's reply in its history.
        let seen = proxy.seen.lock().unwrap();
        assert_eq!(seen[2].1.len(), 4);
    }

    #[tokio::test]
    async fn cache_mirrors_the_chat_list() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalCache::new(dir.path().join("cache.json"));
        let (ctl, _, _) = controller(EchoProxy::default()).await;
        let ctl = ctl.with_cache(cache.clone());

        ctl.submit("cached").await.unwrap();
        let cached = cache.chats("uid-1").await.unwrap();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].title, "cached");
    }

    /// Store whose every call fails as if the pool were exhausted.
    struct UnreachableStore;

    impl ChatStore for UnreachableStore {
        async fn list_chats(&self, _uid: &str) -> Result<Vec<ChatSession>, sqlx::Error> {
            Err(sqlx::Error::PoolTimedOut)
        }
        async fn get_chat(&self, _uid: &str, _id: ChatId) -> Result<Option<ChatSession>, sqlx::Error> {
            Err(sqlx::Error::PoolTimedOut)
        }
        async fn put_chat(&self, _uid: &str, _chat: &ChatSession) -> Result<(), sqlx::Error> {
            Err(sqlx::Error::PoolTimedOut)
        }
        async fn update_messages(
            &self,
            _uid: &str,
            _id: ChatId,
            _messages: &[Turn],
        ) -> Result<bool, sqlx::Error> {
            Err(sqlx::Error::PoolTimedOut)
        }
        async fn rename_chat(&self, _uid: &str, _id: ChatId, _title: &str) -> Result<bool, sqlx::Error> {
            Err(sqlx::Error::PoolTimedOut)
        }
        async fn delete_chat(&self, _uid: &str, _id: ChatId) -> Result<(), sqlx::Error> {
            Err(sqlx::Error::PoolTimedOut)
        }
        async fn delete_all_chats(&self, _uid: &str) -> Result<u64, sqlx::Error> {
            Err(sqlx::Error::PoolTimedOut)
        }
    }

    #[tokio::test]
    #[traced_test]
    async fn unreadable_store_falls_back_to_the_owners_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalCache::new(dir.path().join("cache.json"));
        let store = Arc::new(SqliteStore::in_memory().await.unwrap());
        let proxy = Arc::new(EchoProxy::default());
        let alice = ChatController::new(store, proxy.clone(), Some("alice".into()))
            .with_cache(cache.clone());
        alice.submit("alice private question").await.unwrap();

        let offline = Arc::new(UnreachableStore);
        let alice_offline = ChatController::new(offline.clone(), proxy.clone(), Some("alice".into()))
            .with_cache(cache.clone());
        assert_eq!(alice_offline.load_chats().await, 1);
        assert_eq!(alice_offline.chats().await[0].title, "alice private question");
        assert!(logs_contain("failed to load chats from the store"));

        let bob = ChatController::new(offline, proxy, Some("bob".into())).with_cache(cache.clone());
        assert_eq!(bob.load_chats().await, 0);
        assert!(bob.chats().await.is_empty());

        // Bob's empty fallback does not overwrite Alice's snapshot.
        assert_eq!(cache.chats("alice").await.unwrap().len(), 1);
        assert!(cache.chats("bob").await.is_none());
    }

    #[tokio::test]
    async fn export_uses_the_local_list() {
        let dir = tempfile::tempdir().unwrap();
        let (ctl, _, _) = controller(EchoProxy::default()).await;
        let outcome = ctl.submit("keep me").await.unwrap().unwrap();

        let date = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();
        let path = ctl.export(&[outcome.chat_id], dir.path(), date).await.unwrap();
        assert!(path.ends_with("edith_chats_2026-01-02.json"));
    }
}
