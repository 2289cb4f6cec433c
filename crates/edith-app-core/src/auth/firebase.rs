//! Firebase Identity Toolkit (`identitytoolkit.googleapis.com/v1`) adapter.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::{AuthError, AuthUser, GOOGLE_PROVIDER, IdentityProvider, PASSWORD_PROVIDER};

pub const DEFAULT_IDENTITY_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Identity Toolkit REST client. Every call carries the project's web API key.
#[derive(Debug, Clone)]
pub struct FirebaseIdentity {
    http: Client,
    api_key: Option<String>,
    base_url: String,
}

/// Body shared by `signUp`, `signInWithPassword` and `signInWithIdp`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    provider_id: Option<String>,
    id_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EmailResponse {
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

impl FirebaseIdentity {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            http: Client::new(),
            api_key,
            base_url: DEFAULT_IDENTITY_BASE_URL.to_owned(),
        }
    }

    pub fn set_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: Value) -> Result<T, AuthError> {
        let key = self.api_key.as_deref().ok_or(AuthError::NotConfigured)?;
        let url = format!("{}/accounts:{}", self.base_url, method);
        debug!(%method, "identity toolkit request");

        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", key)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let code = serde_json::from_str::<ErrorEnvelope>(&text)
                .ok()
                .and_then(|e| e.error)
                .and_then(|d| d.message)
                .unwrap_or_else(|| format!("HTTP_{}", status.as_u16()));
            warn!(%method, status = status.as_u16(), %code, "identity toolkit rejected request");
            return Err(AuthError::Provider {
                message: format!("{method} failed with status {}", status.as_u16()),
                code,
            });
        }

        serde_json::from_str(&text).map_err(|e| AuthError::InvalidResponse(e.to_string()))
    }

    fn to_user(resp: TokenResponse, fallback_email: &str, provider: &str) -> AuthUser {
        AuthUser {
            uid: resp.local_id,
            email: resp
                .email
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| fallback_email.to_owned()),
            display_name: resp.display_name.or(resp.full_name).filter(|n| !n.is_empty()),
            provider_id: resp.provider_id.unwrap_or_else(|| provider.to_owned()),
            id_token: resp.id_token,
            refresh_token: resp.refresh_token,
        }
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentity {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let resp: TokenResponse = self
            .call(
                "signUp",
                json!({ "email": email, "password": password, "returnSecureToken": true }),
            )
            .await?;
        Ok(Self::to_user(resp, email, PASSWORD_PROVIDER))
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthUser, AuthError> {
        let resp: TokenResponse = self
            .call(
                "signInWithPassword",
                json!({ "email": email, "password": password, "returnSecureToken": true }),
            )
            .await?;
        Ok(Self::to_user(resp, email, PASSWORD_PROVIDER))
    }

    async fn sign_in_with_google(&self, id_token: &str) -> Result<AuthUser, AuthError> {
        let resp: TokenResponse = self
            .call(
                "signInWithIdp",
                json!({
                    "postBody": format!("id_token={id_token}&providerId={GOOGLE_PROVIDER}"),
                    "requestUri": "http://localhost",
                    "returnIdpCredential": true,
                    "returnSecureToken": true,
                }),
            )
            .await?;
        Ok(Self::to_user(resp, "", GOOGLE_PROVIDER))
    }

    async fn send_password_reset(
        &self,
        email: &str,
        continue_url: Option<&str>,
    ) -> Result<(), AuthError> {
        let mut body = json!({ "requestType": "PASSWORD_RESET", "email": email });
        if let Some(url) = continue_url {
            body["continueUrl"] = json!(url);
            body["canHandleCodeInApp"] = json!(true);
        }
        let _: EmailResponse = self.call("sendOobCode", body).await?;
        Ok(())
    }

    async fn verify_password_reset_code(&self, code: &str) -> Result<String, AuthError> {
        let resp: EmailResponse = self.call("resetPassword", json!({ "oobCode": code })).await?;
        resp.email
            .ok_or_else(|| AuthError::InvalidResponse("resetPassword returned no email".into()))
    }

    async fn confirm_password_reset(
        &self,
        code: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let _: EmailResponse = self
            .call(
                "resetPassword",
                json!({ "oobCode": code, "newPassword": new_password }),
            )
            .await?;
        Ok(())
    }

    async fn delete_account(&self, id_token: &str) -> Result<(), AuthError> {
        let _: Value = self.call("delete", json!({ "idToken": id_token })).await?;
        Ok(())
    }
}
