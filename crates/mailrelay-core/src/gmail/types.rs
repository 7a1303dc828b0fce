//! Wire types for the Gmail REST API (`gmail/v1`).

use serde::Deserialize;

/// Response of `GET users/me/messages`.
///
/// Gmail omits `messages` entirely when the query matches nothing, so the
/// field defaults to an empty list.
#[derive(Debug, Deserialize)]
pub struct MessageList {
    /// Matching message references, newest first.
    #[serde(default)]
    pub messages: Vec<MessageRef>,

    /// Opaque token for the next page. The poller never paginates past
    /// the first page; re-listing on the next tick picks up the rest.
    #[serde(default, rename = "nextPageToken")]
    pub next_page_token: Option<String>,

    /// Gmail's estimate of the total result count.
    #[serde(default, rename = "resultSizeEstimate")]
    pub result_size_estimate: Option<u64>,
}

/// A single entry of a message listing.
#[derive(Debug, Deserialize)]
pub struct MessageRef {
    /// Message id.
    pub id: String,

    /// Thread the message belongs to.
    #[serde(default, rename = "threadId")]
    pub thread_id: Option<String>,
}

/// Response of `GET users/me/messages/{id}?format=raw`.
#[derive(Debug, Deserialize)]
pub struct RawMessage {
    /// Message id.
    pub id: String,

    /// Full RFC 822 message, base64url-encoded.
    pub raw: String,
}
