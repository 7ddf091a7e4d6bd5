//! Authentication module for MediaVault.
//!
//! Email/password accounts are delegated to an external identity provider.
//! This crate validates credentials before any call, keeps the resulting
//! session in the system keyring and refreshes the ID token when it expires.

mod store;

pub use api_client::ValidationError;
pub use store::USE_FILE_STORE_ENV;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_PASSWORD_LENGTH: usize = 6;
pub const DEFAULT_IDENTITY_BASE_URL: &str = "https://identitytoolkit.googleapis.com";
pub const DEFAULT_TOKEN_BASE_URL: &str = "https://securetoken.googleapis.com";

const EXPIRY_SKEW_SECS: i64 = 60;
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    Provider(String),
    #[error("Network Error: {0}")]
    Network(String),
    #[error("Keyring Error: {0}")]
    Keyring(String),
    #[error("Not signed in")]
    NotSignedIn,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub identity: Identity,
    pub id_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_SKEW_SECS) >= self.expires_at
    }
}

/// Check a login or registration form. `confirmation` is only given when registering.
pub fn validate_credentials(
    email: &str,
    password: &str,
    confirmation: Option<&str>,
) -> Result<(), ValidationError> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(ValidationError::MissingCredentials);
    }
    if let Some(confirmation) = confirmation {
        if confirmation != password {
            return Err(ValidationError::PasswordMismatch);
        }
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooShort {
            min: MIN_PASSWORD_LENGTH,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityConfig {
    pub api_key: String,
    pub identity_base_url: String,
    pub token_base_url: String,
}

impl IdentityConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            identity_base_url: DEFAULT_IDENTITY_BASE_URL.to_string(),
            token_base_url: DEFAULT_TOKEN_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    email: String,
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
    user_id: String,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    error: ProviderErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorDetail {
    message: String,
}

fn expiry_from(expires_in: &str) -> DateTime<Utc> {
    let secs = expires_in.parse::<i64>().unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
    Utc::now() + Duration::seconds(secs)
}

async fn provider_error(response: reqwest::Response) -> AuthError {
    let text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    match serde_json::from_str::<ProviderErrorBody>(&text) {
        Ok(body) => AuthError::Provider(body.error.message),
        Err(_) => AuthError::Provider(text),
    }
}

#[derive(Debug, Clone)]
pub struct AuthClient {
    client: reqwest::Client,
    config: IdentityConfig,
}

impl AuthClient {
    pub fn new(config: IdentityConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self, password, confirmation)))]
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        confirmation: &str,
    ) -> Result<Session, AuthError> {
        validate_credentials(email, password, Some(confirmation))?;
        self.password_flow("signUp", email, password).await
    }

    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self, password)))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        validate_credentials(email, password, None)?;
        self.password_flow("signInWithPassword", email, password).await
    }

    pub fn logout(&self) -> Result<(), AuthError> {
        store::clear_session()?;
        tracing::info!("Signed out");
        Ok(())
    }

    /// The stored session, refreshed first if its ID token has expired.
    /// A refresh token the provider no longer accepts signs the user out.
    pub async fn current_session(&self) -> Result<Option<Session>, AuthError> {
        let Some(session) = store::load_session()? else {
            return Ok(None);
        };
        if !session.is_expired(Utc::now()) {
            return Ok(Some(session));
        }
        match self.refresh(&session).await {
            Ok(refreshed) => Ok(Some(refreshed)),
            Err(AuthError::Provider(msg)) => {
                tracing::warn!(reason = %msg, "Stored session rejected, signing out");
                store::clear_session()?;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn current_identity(&self) -> Result<Option<Identity>, AuthError> {
        Ok(self.current_session().await?.map(|s| s.identity))
    }

    async fn password_flow(
        &self,
        endpoint: &str,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let url = format!(
            "{}/v1/accounts:{}",
            self.config.identity_base_url.trim_end_matches('/'),
            endpoint
        );
        let response = self
            .client
            .post(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&PasswordRequest {
                email,
                password,
                return_secure_token: true,
            })
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(provider_error(response).await);
        }

        let account = response
            .json::<AccountResponse>()
            .await
            .map_err(|e| AuthError::Provider(format!("malformed account response: {}", e)))?;
        let session = Session {
            identity: Identity {
                user_id: account.local_id,
                email: account.email,
            },
            id_token: account.id_token,
            refresh_token: account.refresh_token,
            expires_at: expiry_from(&account.expires_in),
        };
        store::save_session(&session)?;
        tracing::info!(user = %session.identity.email, "Authentication successful");
        Ok(session)
    }

    async fn refresh(&self, session: &Session) -> Result<Session, AuthError> {
        let url = format!(
            "{}/v1/token",
            self.config.token_base_url.trim_end_matches('/')
        );
        let response = self
            .client
            .post(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", session.refresh_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(provider_error(response).await);
        }

        let refreshed = response
            .json::<RefreshResponse>()
            .await
            .map_err(|e| AuthError::Provider(format!("malformed token response: {}", e)))?;
        let session = Session {
            identity: Identity {
                user_id: refreshed.user_id,
                email: session.identity.email.clone(),
            },
            id_token: refreshed.id_token,
            refresh_token: refreshed.refresh_token,
            expires_at: expiry_from(&refreshed.expires_in),
        };
        store::save_session(&session)?;
        tracing::debug!("ID token refreshed");
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_credentials() {
        assert_eq!(
            validate_credentials("", "secret1", None),
            Err(ValidationError::MissingCredentials)
        );
        assert_eq!(
            validate_credentials("a@b.c", "", None),
            Err(ValidationError::MissingCredentials)
        );
        assert_eq!(
            validate_credentials("a@b.c", "secret1", Some("secret2")),
            Err(ValidationError::PasswordMismatch)
        );
        assert_eq!(
            validate_credentials("a@b.c", "12345", None),
            Err(ValidationError::PasswordTooShort { min: 6 })
        );
        assert!(validate_credentials("a@b.c", "123456", Some("123456")).is_ok());
    }

    #[test]
    fn test_mismatch_reported_before_length() {
        assert_eq!(
            validate_credentials("a@b.c", "abc", Some("abd")),
            Err(ValidationError::PasswordMismatch)
        );
    }

    #[test]
    fn test_session_expiry_has_skew() {
        let now = Utc::now();
        let session = Session {
            identity: Identity {
                user_id: "u".into(),
                email: "e".into(),
            },
            id_token: "t".into(),
            refresh_token: "r".into(),
            expires_at: now + Duration::seconds(30),
        };
        assert!(session.is_expired(now));
        let later = Session {
            expires_at: now + Duration::seconds(600),
            ..session
        };
        assert!(!later.is_expired(now));
    }
}
