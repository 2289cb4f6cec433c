use std::future::Future;

use edith_types::Report;
use uuid::Uuid;

use super::SqliteStore;

pub trait ReportStore: Send + Sync + 'static {
    /// Add `reports/{autoId}` and return the generated id.
    fn add_report(
        &self,
        report: &Report,
    ) -> impl Future<Output = Result<String, sqlx::Error>> + Send;
}

impl ReportStore for SqliteStore {
    async fn add_report(&self, report: &Report) -> Result<String, sqlx::Error> {
        let id = Uuid::new_v4().simple().to_string();
        sqlx::query(
            "INSERT INTO reports (id, subject, description, user_id, user_email, timestamp, status) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&id)
        .bind(&report.subject)
        .bind(&report.description)
        .bind(&report.user_id)
        .bind(&report.user_email)
        .bind(report.timestamp.to_rfc3339())
        .bind(report.status.to_string())
        .execute(&self.pool)
        .await?;
        Ok(id)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn reports_get_distinct_ids() {
        let store = SqliteStore::in_memory().await.unwrap();
        let report = Report::new("subject", "description", None, None);
        let a = store.add_report(&report).await.unwrap();
        let b = store.add_report(&report).await.unwrap();
        assert_ne!(a, b);

        let (status, user_id): (String, String) =
            sqlx::query_as("SELECT status, user_id FROM reports WHERE id = ?1")
                .bind(&a)
                .fetch_one(&store.pool)
                .await
                .unwrap();
        assert_eq!(status, "new");
        assert_eq!(user_id, "anonymous");
    }
}
