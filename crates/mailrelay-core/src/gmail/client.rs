//! HTTP client wrapper for the Gmail REST API.
//!
//! [`GmailClient`] provides typed methods for the two operations the
//! pipeline uses: listing unread inbox messages and fetching a message's
//! raw bytes. The base URL can be overridden for testing.

use std::sync::Arc;
use std::time::Duration;

use base64::alphabet;
use base64::engine::{self, Engine as _};
use tracing::{debug, trace};

use mailrelay_types::error::{RelayError, Result};

use super::credentials::TokenProvider;
use super::types::{MessageList, RawMessage};

/// Production base URL for the Gmail REST API.
pub const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1";

/// Gmail encodes `raw` as base64url; padding varies by producer, so
/// accept both padded and unpadded input.
const TRANSPORT_B64: engine::GeneralPurpose = engine::GeneralPurpose::new(
    &alphabet::URL_SAFE,
    engine::GeneralPurposeConfig::new()
        .with_decode_padding_mode(engine::DecodePaddingMode::Indifferent),
);

/// HTTP client for the Gmail REST API.
///
/// Wraps a shared [`reqwest::Client`] with a bounded per-request timeout
/// and resolves a bearer token from the [`TokenProvider`] before every
/// call, so an expired credential is refreshed transparently.
pub struct GmailClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenProvider>,
}

impl GmailClient {
    /// Create a client with the given credential provider and per-request
    /// timeout.
    pub fn new(tokens: Arc<dyn TokenProvider>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RelayError::ConfigInvalid {
                reason: format!("cannot build http client: {e}"),
            })?;
        Ok(Self {
            http,
            base_url: GMAIL_API_BASE.into(),
            tokens,
        })
    }

    /// Point the client at a custom base URL (for testing).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        let trimmed = self.base_url.trim_end_matches('/').len();
        self.base_url.truncate(trimmed);
        self
    }

    /// Return the base URL used for API requests.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// List ids of unread inbox messages, newest first, capped at
    /// `page_size`.
    ///
    /// An empty result is a normal outcome, not an error.
    pub async fn list_unread(&self, page_size: u32) -> Result<Vec<String>> {
        let token = self.tokens.access_token().await?;
        let url = format!("{}/users/me/messages", self.base_url);

        trace!(url = %url, page_size, "listing unread messages");

        let resp = self
            .http
            .get(&url)
            .query(&[
                ("labelIds", "INBOX"),
                ("q", "is:unread"),
                ("maxResults", &page_size.to_string()),
            ])
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| RelayError::List(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            let body = resp.text().await.unwrap_or_default();
            return Err(RelayError::Auth(format!(
                "gmail rejected credentials (HTTP {}): {body}",
                status.as_u16()
            )));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RelayError::List(format!(
                "HTTP {}: {body}",
                status.as_u16()
            )));
        }

        let list: MessageList = resp
            .json()
            .await
            .map_err(|e| RelayError::List(format!("malformed listing: {e}")))?;

        let ids: Vec<String> = list.messages.into_iter().map(|m| m.id).collect();
        debug!(count = ids.len(), "listed unread messages");
        Ok(ids)
    }

    /// Fetch one message's full raw MIME bytes by id.
    ///
    /// Fails with [`RelayError::Fetch`] when the id is no longer valid
    /// (message deleted between list and fetch) or on transport failure.
    /// Both are recoverable: the poller skips the message.
    pub async fn fetch_raw(&self, id: &str) -> Result<Vec<u8>> {
        let token = self.tokens.access_token().await?;
        let url = format!("{}/users/me/messages/{id}", self.base_url);

        trace!(url = %url, "fetching raw message");

        let resp = self
            .http
            .get(&url)
            .query(&[("format", "raw")])
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| fetch_err(id, e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            let body = resp.text().await.unwrap_or_default();
            return Err(RelayError::Auth(format!(
                "gmail rejected credentials (HTTP {}): {body}",
                status.as_u16()
            )));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(fetch_err(id, format!("HTTP {}: {body}", status.as_u16())));
        }

        let message: RawMessage = resp
            .json()
            .await
            .map_err(|e| fetch_err(id, format!("malformed message body: {e}")))?;

        TRANSPORT_B64
            .decode(message.raw.as_bytes())
            .map_err(|e| fetch_err(id, format!("invalid base64url payload: {e}")))
    }
}

fn fetch_err(id: &str, reason: String) -> RelayError {
    RelayError::Fetch {
        id: id.to_owned(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gmail::credentials::StaticTokenProvider;

    fn test_client(base: &str) -> GmailClient {
        GmailClient::new(
            Arc::new(StaticTokenProvider::new("tok")),
            Duration::from_secs(5),
        )
        .unwrap()
        .with_base_url(base)
    }

    #[test]
    fn default_base_url() {
        let client = GmailClient::new(
            Arc::new(StaticTokenProvider::new("tok")),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(client.base_url(), GMAIL_API_BASE);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = test_client("http://localhost:9999/");
        assert_eq!(client.base_url(), "http://localhost:9999");
    }

    #[test]
    fn transport_decoding_accepts_padded_and_unpadded() {
        assert_eq!(TRANSPORT_B64.decode(b"aGVsbG8").unwrap(), b"hello");
        assert_eq!(TRANSPORT_B64.decode(b"aGVsbG8=").unwrap(), b"hello");
        // URL-safe alphabet: '-' and '_' instead of '+' and '/'.
        assert_eq!(TRANSPORT_B64.decode(b"_v8").unwrap(), vec![0xfe, 0xff]);
    }
}
