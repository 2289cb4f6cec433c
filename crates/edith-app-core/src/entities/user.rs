use std::future::Future;

use edith_types::UserProfile;

use super::SqliteStore;

pub trait UserStore: Send + Sync + 'static {
    /// Write `users/{uid}`, replacing any existing profile.
    fn put_user(
        &self,
        uid: &str,
        profile: &UserProfile,
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    fn get_user(
        &self,
        uid: &str,
    ) -> impl Future<Output = Result<Option<UserProfile>, sqlx::Error>> + Send;
    fn delete_user(&self, uid: &str) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
}

impl UserStore for SqliteStore {
    async fn put_user(&self, uid: &str, profile: &UserProfile) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO users (uid, first_name, last_name, email) VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT(uid) DO UPDATE SET first_name = ?2, last_name = ?3, email = ?4",
        )
        .bind(uid)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.email)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_user(&self, uid: &str) -> Result<Option<UserProfile>, sqlx::Error> {
        let row: Option<(String, String, String)> =
            sqlx::query_as("SELECT first_name, last_name, email FROM users WHERE uid = ?1")
                .bind(uid)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(first_name, last_name, email)| UserProfile {
            first_name,
            last_name,
            email,
        }))
    }

    async fn delete_user(&self, uid: &str) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM users WHERE uid = ?1")
            .bind(uid)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
