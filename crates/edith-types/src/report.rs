use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

/// Identity recorded on reports filed without a signed-in user.
pub const ANONYMOUS: &str = "anonymous";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ReportStatus {
    New,
}

/// Issue report stored at `reports/{autoId}`. Write-only from the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub subject: String,
    pub description: String,
    pub user_id: String,
    pub user_email: String,
    pub timestamp: DateTime<Utc>,
    pub status: ReportStatus,
}

impl Report {
    /// A new report; `None` identity fields are recorded as `"anonymous"`.
    pub fn new(
        subject: impl Into<String>,
        description: impl Into<String>,
        user_id: Option<&str>,
        user_email: Option<&str>,
    ) -> Self {
        Self {
            subject: subject.into(),
            description: description.into(),
            user_id: user_id.unwrap_or(ANONYMOUS).to_owned(),
            user_email: user_email.unwrap_or(ANONYMOUS).to_owned(),
            timestamp: Utc::now(),
            status: ReportStatus::New,
        }
    }
}
