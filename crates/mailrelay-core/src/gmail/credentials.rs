//! OAuth2 credential handling for the Gmail client.
//!
//! [`AuthorizedUserProvider`] reads a Google "authorized user" token file
//! (the shape written by Google's token generators: client id/secret plus
//! a long-lived refresh token) and exchanges the refresh token for access
//! tokens at the Google token endpoint as they expire. The refreshed
//! token lives only in process memory.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use mailrelay_types::error::{RelayError, Result};
use mailrelay_types::secret::SecretString;

/// Google's OAuth2 token endpoint.
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// A token within this many seconds of its expiry counts as expired, so
/// one is never presented right at its deadline. Applies to refreshed
/// and file-cached tokens alike.
const REFRESH_SKEW_SECS: i64 = 60;

/// Supplies a valid bearer token on demand.
///
/// Implementations refresh expired credentials transparently and fail
/// with [`RelayError::Auth`] only when refresh itself fails.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// A currently valid access token.
    async fn access_token(&self) -> Result<String>;
}

/// A fixed, never-refreshed token. Useful in tests and for short-lived
/// runs with a pre-issued access token.
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    /// Wrap a pre-issued access token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String> {
        Ok(self.token.clone())
    }
}

/// On-disk shape of a Google authorized-user token file.
#[derive(Debug, Deserialize)]
pub struct AuthorizedUser {
    /// OAuth2 client id.
    pub client_id: String,

    /// OAuth2 client secret.
    pub client_secret: SecretString,

    /// Long-lived refresh token.
    pub refresh_token: SecretString,

    /// Previously issued access token, if the generator cached one.
    #[serde(default)]
    pub token: Option<String>,

    /// Expiry of the cached access token (RFC 3339).
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
}

/// Access token plus its validity deadline.
#[derive(Debug)]
struct CachedToken {
    token: String,
    expiry: DateTime<Utc>,
}

/// Successful response of the token endpoint.
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    /// Lifetime of the new token in seconds.
    expires_in: i64,
}

/// Token provider backed by a Google authorized-user file.
#[derive(Debug)]
pub struct AuthorizedUserProvider {
    http: reqwest::Client,
    token_url: String,
    user: AuthorizedUser,
    cached: Mutex<Option<CachedToken>>,
}

impl AuthorizedUserProvider {
    /// Build a provider from already-parsed credentials. Token endpoint
    /// calls are bounded by `timeout`.
    pub fn new(user: AuthorizedUser, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RelayError::ConfigInvalid {
                reason: format!("cannot build http client: {e}"),
            })?;
        let cached = match (&user.token, user.expiry) {
            (Some(token), Some(expiry)) => Some(CachedToken {
                token: token.clone(),
                expiry,
            }),
            _ => None,
        };
        Ok(Self {
            http,
            token_url: GOOGLE_TOKEN_URL.into(),
            user,
            cached: Mutex::new(cached),
        })
    }

    /// Load credentials from an authorized-user JSON file.
    pub fn from_file(path: &Path, timeout: Duration) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| RelayError::Auth(format!(
            "cannot read token file {}: {e}",
            path.display()
        )))?;
        let user: AuthorizedUser = serde_json::from_str(&json).map_err(|e| {
            RelayError::Auth(format!("malformed token file {}: {e}", path.display()))
        })?;
        if user.refresh_token.is_empty() {
            return Err(RelayError::Auth(format!(
                "token file {} has no refresh_token",
                path.display()
            )));
        }
        Self::new(user, timeout)
    }

    /// Point the provider at a different token endpoint (for testing).
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    /// Exchange the refresh token for a new access token.
    async fn refresh(&self) -> Result<CachedToken> {
        debug!("refreshing gmail access token");

        let form = [
            ("client_id", self.user.client_id.as_str()),
            ("client_secret", self.user.client_secret.expose()),
            ("refresh_token", self.user.refresh_token.expose()),
            ("grant_type", "refresh_token"),
        ];

        let resp = self
            .http
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| RelayError::Auth(format!("token endpoint unreachable: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "token refresh rejected");
            return Err(RelayError::Auth(format!(
                "token refresh failed with HTTP {}: {body}",
                status.as_u16()
            )));
        }

        let parsed: RefreshResponse = resp
            .json()
            .await
            .map_err(|e| RelayError::Auth(format!("malformed token response: {e}")))?;

        let expiry = Utc::now() + ChronoDuration::seconds(parsed.expires_in.max(0));
        Ok(CachedToken {
            token: parsed.access_token,
            expiry,
        })
    }
}

#[async_trait]
impl TokenProvider for AuthorizedUserProvider {
    async fn access_token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;

        if let Some(ref entry) = *cached {
            if entry.expiry - ChronoDuration::seconds(REFRESH_SKEW_SECS) > Utc::now() {
                return Ok(entry.token.clone());
            }
            debug!("cached access token expired or about to");
        }

        let fresh = self.refresh().await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn token_json(with_cached: bool) -> String {
        if with_cached {
            serde_json::json!({
                "client_id": "cid.apps.googleusercontent.com",
                "client_secret": "cs-secret",
                "refresh_token": "1//refresh",
                "token": "ya29.cached",
                "expiry": "2099-01-01T00:00:00Z"
            })
            .to_string()
        } else {
            serde_json::json!({
                "client_id": "cid.apps.googleusercontent.com",
                "client_secret": "cs-secret",
                "refresh_token": "1//refresh"
            })
            .to_string()
        }
    }

    #[test]
    fn from_file_parses_authorized_user() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(token_json(false).as_bytes()).unwrap();

        let provider =
            AuthorizedUserProvider::from_file(file.path(), Duration::from_secs(5)).unwrap();
        assert_eq!(provider.user.client_id, "cid.apps.googleusercontent.com");
        assert_eq!(provider.user.refresh_token.expose(), "1//refresh");
    }

    #[test]
    fn from_file_rejects_missing_refresh_token() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"client_id": "cid", "client_secret": "cs", "refresh_token": ""}"#)
            .unwrap();

        let err =
            AuthorizedUserProvider::from_file(file.path(), Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, RelayError::Auth(_)));
        assert!(err.to_string().contains("refresh_token"));
    }

    #[test]
    fn from_file_rejects_missing_file() {
        let err = AuthorizedUserProvider::from_file(
            Path::new("/nonexistent/token.json"),
            Duration::from_secs(5),
        )
        .unwrap_err();
        assert!(matches!(err, RelayError::Auth(_)));
    }

    #[tokio::test]
    async fn cached_unexpired_token_is_served_without_refresh() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(token_json(true).as_bytes()).unwrap();

        // Token endpoint deliberately unreachable: the cached token must
        // be returned without any network call.
        let provider = AuthorizedUserProvider::from_file(file.path(), Duration::from_secs(5))
            .unwrap()
            .with_token_url("http://127.0.0.1:1/token");

        let token = provider.access_token().await.unwrap();
        assert_eq!(token, "ya29.cached");
    }

    #[tokio::test]
    async fn static_provider_returns_fixed_token() {
        let provider = StaticTokenProvider::new("fixed");
        assert_eq!(provider.access_token().await.unwrap(), "fixed");
    }
}
