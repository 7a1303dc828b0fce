//! The normalized record and its delivery outcome.
//!
//! [`NormalizedRecord`] is the unit of work: the decoded, transport-agnostic
//! representation of one mail message. It is built once by the decoder,
//! immutable afterwards, and serialized verbatim as the downstream POST body.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A decoded mail message, ready for downstream delivery.
///
/// The wire shape matches the downstream ingestion contract:
/// `{gmail_id, subject, from_, to, body, headers}`. The sender field is
/// named `from_` on the wire because `from` collides with reserved words
/// in downstream schema languages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    /// Stable unique identifier assigned by the mailbox service.
    /// Never empty.
    pub gmail_id: String,

    /// `Subject` header, or empty when absent.
    #[serde(default)]
    pub subject: String,

    /// `From` header, or empty when absent.
    #[serde(default, rename = "from_")]
    pub from: String,

    /// `To` header, or empty when absent.
    #[serde(default)]
    pub to: String,

    /// Best-effort plain-text body. Empty when the message has no
    /// decodable `text/plain` part.
    #[serde(default)]
    pub body: String,

    /// All headers as received, names case-sensitive. Duplicate names
    /// collapse to the last-seen value.
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

/// Per-record result of one downstream delivery attempt.
///
/// Produced by the dispatcher, logged by the poller, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryOutcome {
    /// Id of the record this outcome belongs to.
    pub gmail_id: String,

    /// Whether the downstream endpoint accepted the record (2xx).
    pub success: bool,

    /// Response body or transport error text for failed deliveries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl DeliveryOutcome {
    /// An accepted delivery.
    pub fn accepted(gmail_id: impl Into<String>) -> Self {
        Self {
            gmail_id: gmail_id.into(),
            success: true,
            error_detail: None,
        }
    }

    /// A failed delivery with the response body or transport error text.
    pub fn failed(gmail_id: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            gmail_id: gmail_id.into(),
            success: false,
            error_detail: Some(detail.into()),
        }
    }
}
