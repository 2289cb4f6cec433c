use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Profile document stored at `users/{uid}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl UserProfile {
    /// Profile derived from a provider display name such as `"Ada King Lovelace"`:
    /// the first word becomes the first name, the rest the last name.
    pub fn from_display_name(display_name: &str, email: impl Into<String>) -> Self {
        let mut words = display_name.split_whitespace();
        let first_name = words.next().unwrap_or("User").to_owned();
        let last_name = words.collect::<Vec<_>>().join(" ");
        Self {
            first_name,
            last_name,
            email: email.into(),
        }
    }

    /// Placeholder profile for accounts with neither a document nor a display name.
    pub fn anonymous(email: impl Into<String>) -> Self {
        Self {
            first_name: "User".to_owned(),
            last_name: String::new(),
            email: email.into(),
        }
    }
}
