use std::future::Future;

use chrono::Utc;
use edith_types::{ChatId, ChatSession, Turn};
use sqlx::types::Json;

use super::SqliteStore;

type ChatRow = (i64, String, Json<Vec<Turn>>, bool);

pub trait ChatStore: Send + Sync + 'static {
    /// All chats of `uid`, newest first.
    fn list_chats(
        &self,
        uid: &str,
    ) -> impl Future<Output = Result<Vec<ChatSession>, sqlx::Error>> + Send;
    fn get_chat(
        &self,
        uid: &str,
        id: ChatId,
    ) -> impl Future<Output = Result<Option<ChatSession>, sqlx::Error>> + Send;
    /// Write the whole chat document, replacing any existing one.
    fn put_chat(
        &self,
        uid: &str,
        chat: &ChatSession,
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    /// Replace the message list. Returns `false` when the chat does not exist.
    fn update_messages(
        &self,
        uid: &str,
        id: ChatId,
        messages: &[Turn],
    ) -> impl Future<Output = Result<bool, sqlx::Error>> + Send;
    /// Returns `false` when the chat does not exist.
    fn rename_chat(
        &self,
        uid: &str,
        id: ChatId,
        title: &str,
    ) -> impl Future<Output = Result<bool, sqlx::Error>> + Send;
    fn delete_chat(
        &self,
        uid: &str,
        id: ChatId,
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    /// Delete every chat of `uid`; returns how many were removed.
    fn delete_all_chats(&self, uid: &str) -> impl Future<Output = Result<u64, sqlx::Error>> + Send;
}

fn to_session(uid: &str, (id, title, Json(messages), is_archived): ChatRow) -> ChatSession {
    ChatSession {
        id,
        title,
        messages,
        is_archived,
        user_id: Some(uid.to_owned()),
    }
}

impl ChatStore for SqliteStore {
    async fn list_chats(&self, uid: &str) -> Result<Vec<ChatSession>, sqlx::Error> {
        let rows: Vec<ChatRow> = sqlx::query_as(
            "SELECT id, title, messages, is_archived \
             FROM chats WHERE user_id = ?1 ORDER BY id DESC",
        )
        .bind(uid)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|row| to_session(uid, row)).collect())
    }

    async fn get_chat(&self, uid: &str, id: ChatId) -> Result<Option<ChatSession>, sqlx::Error> {
        let row: Option<ChatRow> = sqlx::query_as(
            "SELECT id, title, messages, is_archived \
             FROM chats WHERE user_id = ?1 AND id = ?2",
        )
        .bind(uid)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|row| to_session(uid, row)))
    }

    async fn put_chat(&self, uid: &str, chat: &ChatSession) -> Result<(), sqlx::Error> {
        let updated_at = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO chats (user_id, id, title, messages, is_archived, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
             ON CONFLICT(user_id, id) DO UPDATE SET \
             title = ?3, messages = ?4, is_archived = ?5, updated_at = ?6",
        )
        .bind(uid)
        .bind(chat.id)
        .bind(&chat.title)
        .bind(Json(&chat.messages))
        .bind(chat.is_archived)
        .bind(&updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_messages(
        &self,
        uid: &str,
        id: ChatId,
        messages: &[Turn],
    ) -> Result<bool, sqlx::Error> {
        let updated_at = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "UPDATE chats SET messages = ?1, updated_at = ?2 WHERE user_id = ?3 AND id = ?4",
        )
        .bind(Json(messages))
        .bind(&updated_at)
        .bind(uid)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn rename_chat(&self, uid: &str, id: ChatId, title: &str) -> Result<bool, sqlx::Error> {
        let updated_at = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "UPDATE chats SET title = ?1, updated_at = ?2 WHERE user_id = ?3 AND id = ?4",
        )
        .bind(title)
        .bind(&updated_at)
        .bind(uid)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_chat(&self, uid: &str, id: ChatId) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM chats WHERE user_id = ?1 AND id = ?2")
            .bind(uid)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_all_chats(&self, uid: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM chats WHERE user_id = ?1")
            .bind(uid)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
