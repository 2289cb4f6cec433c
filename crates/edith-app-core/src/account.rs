//! Account lifecycle: sign-up, sign-in, password reset, profile, deletion.
//!
//! The signed-in user is published on a [`watch`] channel so callers can
//! react to sign-in and sign-out; it is also written to the [`LocalCache`]
//! so the session survives restarts.

use std::sync::Arc;

use edith_types::{Report, UserProfile};
use tokio::sync::watch;
use tracing::{error, info, warn};
use validator::{Validate, ValidationErrors};

use crate::auth::error::USER_MISMATCH;
use crate::auth::{AuthError, AuthUser, GOOGLE_PROVIDER, IdentityProvider, PASSWORD_PROVIDER};
use crate::cache::LocalCache;
use crate::entities::{ChatStore, ReportStore, UserStore};
use crate::error::{AuthAction, CoreError};

pub const SIGN_UP_SUCCESS: &str = "Account Created Successfully!";
pub const SIGN_IN_SUCCESS: &str = "Login is successful!";
pub const RESET_EMAIL_SENT: &str = "Password reset email sent! Check your inbox.";
pub const PASSWORD_RESET_DONE: &str = "Password has been reset successfully!";

#[derive(Debug, Clone, Validate)]
pub struct SignUpForm {
    pub first_name: String,
    pub last_name: String,
    #[validate(length(min = 1, message = "Please enter your email address."))]
    pub email: String,
    #[validate(length(min = 1, message = "Please enter a password."))]
    pub password: String,
}

#[derive(Debug, Validate)]
struct NewPassword {
    #[validate(length(min = 6, message = "Password must be at least 6 characters long."))]
    password: String,
}

/// Fresh credentials for the signed-in account, required before deletion.
#[derive(Debug, Clone)]
pub enum Reauth {
    Password(String),
    Google { id_token: String },
}

#[derive(Debug, Clone)]
pub struct SignInOutcome {
    pub user: AuthUser,
    /// Name shown in the chat header.
    pub username: String,
    pub message: &'static str,
}

pub struct AccountService<S> {
    identity: Arc<dyn IdentityProvider>,
    store: Arc<S>,
    cache: LocalCache,
    session: watch::Sender<Option<AuthUser>>,
    reset_continue_url: Option<String>,
}

impl<S> AccountService<S>
where
    S: UserStore + ChatStore + ReportStore,
{
    pub fn new(identity: Arc<dyn IdentityProvider>, store: Arc<S>, cache: LocalCache) -> Self {
        let (session, _) = watch::channel(None);
        Self {
            identity,
            store,
            cache,
            session,
            reset_continue_url: None,
        }
    }

    pub fn with_reset_continue_url(mut self, url: Option<String>) -> Self {
        self.reset_continue_url = url;
        self
    }

    /// Pick up the session saved by a previous run.
    pub async fn restore(&self) -> Option<AuthUser> {
        let user = self.cache.session().await;
        self.session.send_replace(user.clone());
        user
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        self.session.borrow().clone()
    }

    /// Observe sign-in and sign-out.
    pub fn subscribe(&self) -> watch::Receiver<Option<AuthUser>> {
        self.session.subscribe()
    }

    pub async fn username(&self) -> Option<String> {
        self.cache.username().await
    }

    async fn establish(&self, user: AuthUser, username: String, message: &'static str) -> Result<SignInOutcome, CoreError> {
        self.cache.sign_in(&user, &username).await?;
        self.session.send_replace(Some(user.clone()));
        info!(uid = %user.uid, provider = %user.provider_id, "signed in");
        Ok(SignInOutcome {
            user,
            username,
            message,
        })
    }

    /// Create an email/password account and its `users/{uid}` profile.
    pub async fn sign_up(&self, form: SignUpForm) -> Result<SignInOutcome, CoreError> {
        form.validate().map_err(validation_error)?;

        let user = self
            .identity
            .sign_up(&form.email, &form.password)
            .await
            .map_err(|e| CoreError::auth(AuthAction::SignUp, e))?;

        let profile = UserProfile {
            first_name: form.first_name.trim().to_owned(),
            last_name: form.last_name.trim().to_owned(),
            email: form.email.clone(),
        };
        if let Err(e) = self.store.put_user(&user.uid, &profile).await {
            error!(uid = %user.uid, error = %e, "failed to write user profile");
            return Err(CoreError::ProfileCreation(e));
        }

        let username = non_empty_or_user(&profile.first_name);
        self.establish(user, username, SIGN_UP_SUCCESS).await
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SignInOutcome, CoreError> {
        let user = self
            .identity
            .sign_in_with_password(email, password)
            .await
            .map_err(|e| CoreError::auth(AuthAction::SignIn, e))?;

        let first_name = match self.store.get_user(&user.uid).await {
            Ok(profile) => profile.map(|p| p.first_name),
            Err(e) => {
                warn!(uid = %user.uid, error = %e, "failed to read user profile");
                None
            }
        };
        let username = non_empty_or_user(first_name.as_deref().unwrap_or_default());
        self.establish(user, username, SIGN_IN_SUCCESS).await
    }

    pub async fn sign_in_with_google(&self, id_token: &str) -> Result<SignInOutcome, CoreError> {
        let user = self
            .identity
            .sign_in_with_google(id_token)
            .await
            .map_err(|e| CoreError::auth(AuthAction::GoogleSignIn, e))?;
        let username = non_empty_or_user(user.first_name().unwrap_or_default());
        self.establish(user, username, SIGN_IN_SUCCESS).await
    }

    pub async fn sign_out(&self) -> Result<(), CoreError> {
        if let Some(user) = self.session.send_replace(None) {
            info!(uid = %user.uid, "signed out");
        }
        self.cache.clear().await
    }

    pub async fn request_password_reset(&self, email: &str) -> Result<&'static str, CoreError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(CoreError::Validation("Please enter your email address.".into()));
        }
        self.identity
            .send_password_reset(email, self.reset_continue_url.as_deref())
            .await
            .map_err(|e| CoreError::auth(AuthAction::ResetRequest, e))?;
        Ok(RESET_EMAIL_SENT)
    }

    /// Check a reset code; returns the email it belongs to.
    pub async fn verify_reset_code(&self, code: &str) -> Result<String, CoreError> {
        if code.trim().is_empty() {
            return Err(CoreError::Validation(
                "Invalid or missing password reset code.".into(),
            ));
        }
        self.identity
            .verify_password_reset_code(code.trim())
            .await
            .map_err(|e| CoreError::auth(AuthAction::ResetVerify, e))
    }

    pub async fn confirm_password_reset(
        &self,
        code: &str,
        new_password: &str,
    ) -> Result<&'static str, CoreError> {
        NewPassword {
            password: new_password.to_owned(),
        }
        .validate()
        .map_err(validation_error)?;

        self.identity
            .confirm_password_reset(code.trim(), new_password)
            .await
            .map_err(|e| CoreError::auth(AuthAction::ResetConfirm, e))?;
        Ok(PASSWORD_RESET_DONE)
    }

    /// Profile of the signed-in user: the stored document, else one derived
    /// from the provider display name, else a placeholder.
    pub async fn profile(&self) -> Result<Option<UserProfile>, CoreError> {
        let Some(user) = self.current_user() else {
            return Ok(None);
        };
        if let Some(profile) = self.store.get_user(&user.uid).await? {
            return Ok(Some(profile));
        }
        let profile = match user.display_name.as_deref().filter(|n| !n.trim().is_empty()) {
            Some(name) => UserProfile::from_display_name(name, &user.email),
            None => UserProfile::anonymous(&user.email),
        };
        Ok(Some(profile))
    }

    /// Reauthenticate, then erase the user's chats, profile and account.
    pub async fn delete_account(&self, reauth: Reauth) -> Result<(), CoreError> {
        let current = self.current_user().ok_or(CoreError::NotSignedIn)?;

        let fresh = match (current.provider_id.as_str(), reauth) {
            (PASSWORD_PROVIDER, Reauth::Password(password)) => {
                if password.is_empty() {
                    return Err(CoreError::Validation("Please enter your password.".into()));
                }
                self.identity
                    .sign_in_with_password(&current.email, &password)
                    .await
            }
            (GOOGLE_PROVIDER, Reauth::Google { id_token }) => {
                self.identity.sign_in_with_google(&id_token).await
            }
            (PASSWORD_PROVIDER, _) => {
                return Err(CoreError::Validation("Please enter your password.".into()));
            }
            (GOOGLE_PROVIDER, _) => {
                return Err(CoreError::Validation(
                    "Please confirm with your Google account.".into(),
                ));
            }
            (other, _) => {
                return Err(CoreError::Unsupported(format!(
                    "Account deletion for {other} is not supported."
                )));
            }
        }
        .map_err(|e| CoreError::auth(AuthAction::Reauthenticate, e))?;

        if fresh.uid != current.uid {
            warn!(uid = %current.uid, "reauthenticated as a different user");
            return Err(CoreError::auth(
                AuthAction::Reauthenticate,
                AuthError::provider(USER_MISMATCH),
            ));
        }

        if let Err(e) = self.erase(&fresh).await {
            error!(uid = %fresh.uid, error = %e, "account deletion failed");
            return Err(CoreError::AccountDeletion(Box::new(e)));
        }

        self.session.send_replace(None);
        self.cache.clear().await?;
        info!(uid = %fresh.uid, "account deleted");
        Ok(())
    }

    async fn erase(&self, user: &AuthUser) -> Result<(), CoreError> {
        let removed = self.store.delete_all_chats(&user.uid).await?;
        self.store.delete_user(&user.uid).await?;
        self.identity
            .delete_account(&user.id_token)
            .await
            .map_err(|e| CoreError::auth(AuthAction::DeleteAccount, e))?;
        info!(uid = %user.uid, chats = removed, "erased user data");
        Ok(())
    }

    /// File a problem report; anonymous when nobody is signed in.
    pub async fn submit_report(&self, subject: &str, description: &str) -> Result<String, CoreError> {
        let (subject, description) = (subject.trim(), description.trim());
        if subject.is_empty() || description.is_empty() {
            return Err(CoreError::Validation(
                "Please fill in both the subject and the description.".into(),
            ));
        }
        let user = self.current_user();
        let report = Report::new(
            subject,
            description,
            user.as_ref().map(|u| u.uid.as_str()),
            user.as_ref().map(|u| u.email.as_str()),
        );
        let id = self.store.add_report(&report).await?;
        info!(report_id = %id, "report submitted");
        Ok(id)
    }
}

fn non_empty_or_user(name: &str) -> String {
    match name.trim() {
        "" => "User".to_owned(),
        name => name.to_owned(),
    }
}

/// First message of the alphabetically first failing field.
fn validation_error(errors: ValidationErrors) -> CoreError {
    let fields = errors.field_errors();
    let mut names: Vec<_> = fields.keys().cloned().collect();
    names.sort();
    let message = names
        .first()
        .and_then(|name| fields.get(name))
        .and_then(|errs| errs.first())
        .and_then(|e| e.message.as_ref())
        .map(|m| m.to_string())
        .unwrap_or_else(|| errors.to_string());
    CoreError::Validation(message)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::entities::SqliteStore;
    use async_trait::async_trait;
    use edith_types::{ChatId, ChatSession, Turn};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tracing_test::traced_test;

    /// In-process identity provider keyed by email.
    #[derive(Default)]
    struct FakeIdentity {
        accounts: Mutex<HashMap<String, (String, String)>>,
        google: Mutex<HashMap<String, AuthUser>>,
        deleted: Mutex<Vec<String>>,
        fail_delete: bool,
    }

    impl FakeIdentity {
        fn user(uid: &str, email: &str) -> AuthUser {
            AuthUser {
                uid: uid.into(),
                email: email.into(),
                display_name: None,
                provider_id: PASSWORD_PROVIDER.into(),
                id_token: format!("token-{uid}"),
                refresh_token: None,
            }
        }
    }

    #[async_trait]
    impl IdentityProvider for FakeIdentity {
        async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
            let mut accounts = self.accounts.lock().unwrap();
            if accounts.contains_key(email) {
                return Err(AuthError::provider("EMAIL_EXISTS"));
            }
            let uid = format!("uid-{}", accounts.len() + 1);
            accounts.insert(email.into(), (uid.clone(), password.into()));
            Ok(Self::user(&uid, email))
        }

        async fn sign_in_with_password(
            &self,
            email: &str,
            password: &str,
        ) -> Result<AuthUser, AuthError> {
            match self.accounts.lock().unwrap().get(email) {
                Some((uid, pw)) if pw == password => Ok(Self::user(uid, email)),
                Some(_) => Err(AuthError::provider("INVALID_PASSWORD")),
                None => Err(AuthError::provider("EMAIL_NOT_FOUND")),
            }
        }

        async fn sign_in_with_google(&self, id_token: &str) -> Result<AuthUser, AuthError> {
            self.google
                .lock()
                .unwrap()
                .get(id_token)
                .cloned()
                .ok_or_else(|| AuthError::provider("INVALID_IDP_RESPONSE"))
        }

        async fn send_password_reset(
            &self,
            email: &str,
            _continue_url: Option<&str>,
        ) -> Result<(), AuthError> {
            if self.accounts.lock().unwrap().contains_key(email) {
                Ok(())
            } else {
                Err(AuthError::provider("EMAIL_NOT_FOUND"))
            }
        }

        async fn verify_password_reset_code(&self, code: &str) -> Result<String, AuthError> {
            code.strip_prefix("code-")
                .map(str::to_owned)
                .ok_or_else(|| AuthError::provider("INVALID_OOB_CODE"))
        }

        async fn confirm_password_reset(
            &self,
            code: &str,
            new_password: &str,
        ) -> Result<(), AuthError> {
            let email = self.verify_password_reset_code(code).await?;
            match self.accounts.lock().unwrap().get_mut(&email) {
                Some(entry) => {
                    entry.1 = new_password.into();
                    Ok(())
                }
                None => Err(AuthError::provider("EXPIRED_OOB_CODE")),
            }
        }

        async fn delete_account(&self, id_token: &str) -> Result<(), AuthError> {
            if self.fail_delete {
                return Err(AuthError::provider("CREDENTIAL_TOO_OLD_LOGIN_AGAIN"));
            }
            self.deleted.lock().unwrap().push(id_token.into());
            Ok(())
        }
    }

    struct Harness {
        service: AccountService<SqliteStore>,
        store: Arc<SqliteStore>,
        identity: Arc<FakeIdentity>,
        _dir: tempfile::TempDir,
    }

    async fn harness(identity: FakeIdentity) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(SqliteStore::in_memory().await.unwrap());
        let identity = Arc::new(identity);
        let cache = LocalCache::new(dir.path().join("cache.json"));
        let service = AccountService::new(identity.clone(), store.clone(), cache);
        Harness {
            service,
            store,
            identity,
            _dir: dir,
        }
    }

    fn form(email: &str, password: &str) -> SignUpForm {
        SignUpForm {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: email.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn sign_up_writes_profile_and_session() {
        let h = harness(FakeIdentity::default()).await;
        let mut rx = h.service.subscribe();

        let outcome = h.service.sign_up(form("ada@example.com", "secret1")).await.unwrap();
        assert_eq!(outcome.message, "Account Created Successfully!");
        assert_eq!(outcome.username, "Ada");
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().as_ref().unwrap().uid, outcome.user.uid);

        let profile = h.store.get_user(&outcome.user.uid).await.unwrap().unwrap();
        assert_eq!(profile.last_name, "Lovelace");
        assert_eq!(h.service.username().await.as_deref(), Some("Ada"));
    }

    /// Delegates to SQLite but refuses profile writes.
    struct ProfileWriteFails(SqliteStore);

    impl UserStore for ProfileWriteFails {
        async fn put_user(&self, _uid: &str, _profile: &UserProfile) -> Result<(), sqlx::Error> {
            Err(sqlx::Error::PoolTimedOut)
        }
        async fn get_user(&self, uid: &str) -> Result<Option<UserProfile>, sqlx::Error> {
            self.0.get_user(uid).await
        }
        async fn delete_user(&self, uid: &str) -> Result<(), sqlx::Error> {
            self.0.delete_user(uid).await
        }
    }

    impl ChatStore for ProfileWriteFails {
        async fn list_chats(&self, uid: &str) -> Result<Vec<ChatSession>, sqlx::Error> {
            self.0.list_chats(uid).await
        }
        async fn get_chat(&self, uid: &str, id: ChatId) -> Result<Option<ChatSession>, sqlx::Error> {
            self.0.get_chat(uid, id).await
        }
        async fn put_chat(&self, uid: &str, chat: &ChatSession) -> Result<(), sqlx::Error> {
            self.0.put_chat(uid, chat).await
        }
        async fn update_messages(
            &self,
            uid: &str,
            id: ChatId,
            messages: &[Turn],
        ) -> Result<bool, sqlx::Error> {
            self.0.update_messages(uid, id, messages).await
        }
        async fn rename_chat(&self, uid: &str, id: ChatId, title: &str) -> Result<bool, sqlx::Error> {
            self.0.rename_chat(uid, id, title).await
        }
        async fn delete_chat(&self, uid: &str, id: ChatId) -> Result<(), sqlx::Error> {
            self.0.delete_chat(uid, id).await
        }
        async fn delete_all_chats(&self, uid: &str) -> Result<u64, sqlx::Error> {
            self.0.delete_all_chats(uid).await
        }
    }

    impl ReportStore for ProfileWriteFails {
        async fn add_report(&self, report: &Report) -> Result<String, sqlx::Error> {
            self.0.add_report(report).await
        }
    }

    #[tokio::test]
    #[traced_test]
    async fn failed_profile_write_reads_as_sign_up_failure() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(ProfileWriteFails(SqliteStore::in_memory().await.unwrap()));
        let service = AccountService::new(
            Arc::new(FakeIdentity::default()),
            store,
            LocalCache::new(dir.path().join("cache.json")),
        );

        let err = service.sign_up(form("ada@example.com", "secret1")).await.unwrap_err();
        assert!(matches!(err, CoreError::ProfileCreation(sqlx::Error::PoolTimedOut)));
        assert_eq!(err.to_string(), "Unable to create account. Please try again.");
        assert!(service.current_user().is_none());
        assert!(logs_contain("failed to write user profile"));
    }

    #[tokio::test]
    async fn duplicate_sign_up_is_reported() {
        let h = harness(FakeIdentity::default()).await;
        h.service.sign_up(form("ada@example.com", "secret1")).await.unwrap();
        let err = h.service.sign_up(form("ada@example.com", "secret1")).await.unwrap_err();
        assert_eq!(err.to_string(), "Email Address Already Exists!");
    }

    #[tokio::test]
    async fn sign_up_requires_email() {
        let h = harness(FakeIdentity::default()).await;
        let err = h.service.sign_up(form("", "")).await.unwrap_err();
        assert_eq!(err.to_string(), "Please enter your email address.");
    }

    #[tokio::test]
    async fn sign_in_uses_profile_first_name() {
        let h = harness(FakeIdentity::default()).await;
        h.service.sign_up(form("ada@example.com", "secret1")).await.unwrap();
        h.service.sign_out().await.unwrap();
        assert!(h.service.current_user().is_none());

        let outcome = h.service.sign_in("ada@example.com", "secret1").await.unwrap();
        assert_eq!(outcome.message, "Login is successful!");
        assert_eq!(outcome.username, "Ada");

        let err = h.service.sign_in("ada@example.com", "nope").await.unwrap_err();
        assert_eq!(err.to_string(), "Incorrect Email or Password.");
    }

    #[tokio::test]
    async fn sign_in_without_profile_is_user() {
        let h = harness(FakeIdentity::default()).await;
        h.identity.sign_up("bare@example.com", "secret1").await.unwrap();
        let outcome = h.service.sign_in("bare@example.com", "secret1").await.unwrap();
        assert_eq!(outcome.username, "User");
    }

    #[tokio::test]
    async fn google_sign_in_uses_display_name() {
        let identity = FakeIdentity::default();
        identity.google.lock().unwrap().insert(
            "g-token".into(),
            AuthUser {
                display_name: Some("Grace Brewster Hopper".into()),
                provider_id: GOOGLE_PROVIDER.into(),
                ..FakeIdentity::user("g-1", "grace@example.com")
            },
        );
        let h = harness(identity).await;

        let outcome = h.service.sign_in_with_google("g-token").await.unwrap();
        assert_eq!(outcome.username, "Grace");

        let profile = h.service.profile().await.unwrap().unwrap();
        assert_eq!(profile.first_name, "Grace");
        assert_eq!(profile.last_name, "Brewster Hopper");

        let err = h.service.sign_in_with_google("bogus").await.unwrap_err();
        assert_eq!(err.to_string(), "Could not sign in with Google. Please try again.");
    }

    #[tokio::test]
    async fn session_is_restored_from_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let store = Arc::new(SqliteStore::in_memory().await.unwrap());
        let identity: Arc<FakeIdentity> = Arc::new(FakeIdentity::default());

        let first = AccountService::new(identity.clone(), store.clone(), LocalCache::new(&path));
        let outcome = first.sign_up(form("ada@example.com", "secret1")).await.unwrap();

        let second = AccountService::new(identity, store, LocalCache::new(&path));
        assert!(second.current_user().is_none());
        assert_eq!(second.restore().await.unwrap().uid, outcome.user.uid);
        assert_eq!(second.current_user().unwrap().uid, outcome.user.uid);
    }

    #[tokio::test]
    async fn password_reset_flow() {
        let h = harness(FakeIdentity::default()).await;
        h.service.sign_up(form("ada@example.com", "secret1")).await.unwrap();

        let err = h.service.request_password_reset("  ").await.unwrap_err();
        assert_eq!(err.to_string(), "Please enter your email address.");
        let err = h.service.request_password_reset("who@example.com").await.unwrap_err();
        assert_eq!(err.to_string(), "No account found with that email address.");
        let msg = h.service.request_password_reset("ada@example.com").await.unwrap();
        assert_eq!(msg, "Password reset email sent! Check your inbox.");

        let email = h.service.verify_reset_code("code-ada@example.com").await.unwrap();
        assert_eq!(email, "ada@example.com");
        let err = h.service.verify_reset_code("garbage").await.unwrap_err();
        assert_eq!(err.to_string(), "This link is invalid or has expired. Please try again.");

        let err = h
            .service
            .confirm_password_reset("code-ada@example.com", "short")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Password must be at least 6 characters long.");
        h.service
            .confirm_password_reset("code-ada@example.com", "longer-secret")
            .await
            .unwrap();
        h.service.sign_in("ada@example.com", "longer-secret").await.unwrap();
    }

    #[tokio::test]
    async fn delete_account_erases_everything() {
        let h = harness(FakeIdentity::default()).await;
        let outcome = h.service.sign_up(form("ada@example.com", "secret1")).await.unwrap();
        let uid = outcome.user.uid.clone();
        h.store.put_chat(&uid, &ChatSession::new(1, "a")).await.unwrap();
        h.store.put_chat(&uid, &ChatSession::new(2, "b")).await.unwrap();

        let err = h.service.delete_account(Reauth::Password("wrong".into())).await.unwrap_err();
        assert_eq!(err.to_string(), "Wrong password. Please try again.");
        let err = h.service.delete_account(Reauth::Password(String::new())).await.unwrap_err();
        assert_eq!(err.to_string(), "Please enter your password.");

        h.service.delete_account(Reauth::Password("secret1".into())).await.unwrap();
        assert!(h.store.list_chats(&uid).await.unwrap().is_empty());
        assert!(h.store.get_user(&uid).await.unwrap().is_none());
        assert_eq!(*h.identity.deleted.lock().unwrap(), [format!("token-{uid}")]);
        assert!(h.service.current_user().is_none());
        assert!(h.service.username().await.is_none());
    }

    #[tokio::test]
    async fn delete_account_rejects_another_user() {
        let identity = FakeIdentity::default();
        identity.google.lock().unwrap().insert(
            "other".into(),
            AuthUser {
                provider_id: GOOGLE_PROVIDER.into(),
                ..FakeIdentity::user("g-2", "other@example.com")
            },
        );
        identity.google.lock().unwrap().insert(
            "mine".into(),
            AuthUser {
                provider_id: GOOGLE_PROVIDER.into(),
                ..FakeIdentity::user("g-1", "me@example.com")
            },
        );
        let h = harness(identity).await;
        h.service.sign_in_with_google("mine").await.unwrap();

        let err = h
            .service
            .delete_account(Reauth::Google {
                id_token: "other".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Auth { action: AuthAction::Reauthenticate, .. }));
        assert!(h.identity.deleted.lock().unwrap().is_empty());
        assert!(h.service.current_user().is_some());
    }

    #[tokio::test]
    async fn failed_provider_deletion_keeps_session() {
        let h = harness(FakeIdentity {
            fail_delete: true,
            ..Default::default()
        })
        .await;
        h.service.sign_up(form("ada@example.com", "secret1")).await.unwrap();

        let err = h.service.delete_account(Reauth::Password("secret1".into())).await.unwrap_err();
        assert!(matches!(err, CoreError::AccountDeletion(_)));
        assert_eq!(err.to_string(), crate::error::ACCOUNT_DELETION_FAILED);
        assert!(h.service.current_user().is_some());
    }

    #[tokio::test]
    async fn unsupported_provider_cannot_delete() {
        let h = harness(FakeIdentity::default()).await;
        h.service
            .establish(
                AuthUser {
                    provider_id: "github.com".into(),
                    ..FakeIdentity::user("gh-1", "gh@example.com")
                },
                "Gh".into(),
                SIGN_IN_SUCCESS,
            )
            .await
            .unwrap();

        let err = h.service.delete_account(Reauth::Password("x".into())).await.unwrap_err();
        assert_eq!(err.to_string(), "Account deletion for github.com is not supported.");
    }

    #[tokio::test]
    async fn reports_record_the_reporter() {
        let h = harness(FakeIdentity::default()).await;
        let err = h.service.submit_report("", "body").await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let id = h.service.submit_report("Broken", "It broke").await.unwrap();
        assert!(!id.is_empty());
    }
}
