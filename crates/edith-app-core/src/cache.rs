//! Small JSON file standing in for browser local storage.
//!
//! Holds the display name (`edith_username`), the signed-in session, and an
//! optional snapshot of one user's chat list used when the document store
//! cannot be read.  A missing or unreadable file behaves like an empty cache.
//!
//! Writes go to a sibling temp file that is renamed into place, and clones of
//! a [`LocalCache`] share one lock so read-modify-write updates do not
//! overwrite each other.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use edith_types::ChatSession;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::auth::AuthUser;
use crate::error::CoreError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheData {
    #[serde(rename = "edith_username", default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<AuthUser>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chats: Option<ChatSnapshot>,
}

/// Chat list of the user `uid` as last seen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSnapshot {
    pub uid: String,
    pub chats: Vec<ChatSession>,
}

#[derive(Debug, Clone)]
pub struct LocalCache {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl LocalCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// `<data dir>/edith/cache.json`, or `./edith-cache.json` when the
    /// platform has no data directory.
    pub fn default_path() -> PathBuf {
        dirs_next::data_dir()
            .map(|d| d.join("edith").join("cache.json"))
            .unwrap_or_else(|| PathBuf::from("edith-cache.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> CacheData {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return CacheData::default(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read local cache");
                return CacheData::default();
            }
        };
        serde_json::from_slice(&bytes).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "local cache is corrupt; ignoring it");
            CacheData::default()
        })
    }

    /// Caller must hold `write_lock`.
    async fn persist(&self, data: &CacheData) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(data)?;
        let temp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&temp_path, json).await?;
        tokio::fs::rename(&temp_path, &self.path).await?;
        debug!(path = %self.path.display(), "local cache saved");
        Ok(())
    }

    async fn update(&self, f: impl FnOnce(&mut CacheData)) -> Result<(), CoreError> {
        let _guard = self.write_lock.lock().await;
        let mut data = self.load().await;
        f(&mut data);
        self.persist(&data).await
    }

    pub async fn username(&self) -> Option<String> {
        self.load().await.username
    }

    pub async fn session(&self) -> Option<AuthUser> {
        self.load().await.session
    }

    /// Record a sign-in. A chat snapshot of any other user is dropped.
    pub async fn sign_in(&self, user: &AuthUser, username: &str) -> Result<(), CoreError> {
        self.update(|d| {
            if d.chats.as_ref().is_some_and(|s| s.uid != user.uid) {
                d.chats = None;
            }
            d.session = Some(user.clone());
            d.username = Some(username.to_owned());
        })
        .await
    }

    /// The snapshot for `uid`, if the cached one belongs to that user.
    pub async fn chats(&self, uid: &str) -> Option<Vec<ChatSession>> {
        self.load()
            .await
            .chats
            .filter(|s| s.uid == uid)
            .map(|s| s.chats)
    }

    pub async fn set_chats(&self, uid: &str, chats: Vec<ChatSession>) -> Result<(), CoreError> {
        self.update(|d| {
            d.chats = Some(ChatSnapshot {
                uid: uid.to_owned(),
                chats,
            })
        })
        .await
    }

    /// Forget everything tied to the signed-in user.
    pub async fn clear(&self) -> Result<(), CoreError> {
        let _guard = self.write_lock.lock().await;
        self.persist(&CacheData::default()).await
    }
}
