//! Error types for the mailrelay pipeline.
//!
//! [`RelayError`] covers the full failure taxonomy of the poll loop.
//! Variants are scoped to the smallest unit they originate from: message
//! level failures ([`Fetch`](RelayError::Fetch), [`Decode`](RelayError::Decode))
//! skip a single message, delivery failures become per-record outcomes, and
//! only [`Auth`](RelayError::Auth) and [`List`](RelayError::List) escalate
//! to the tick boundary.

use thiserror::Error;

/// Top-level error type for the mailrelay pipeline.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RelayError {
    /// Credential was invalid and could not be refreshed. Fails the
    /// current tick; the poller retries on the next one.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Listing unread messages failed (transport or API error).
    /// Fails the current tick; the poller retries on the next one.
    #[error("listing unread messages failed: {0}")]
    List(String),

    /// A single message could not be retrieved (deleted between list and
    /// fetch, or transport failure). The message is skipped.
    #[error("fetching message {id} failed: {reason}")]
    Fetch {
        /// Gmail message id.
        id: String,
        /// What went wrong.
        reason: String,
    },

    /// A single message's bytes could not be parsed as MIME at the top
    /// level. The message is skipped.
    #[error("decoding message {id} failed: {reason}")]
    Decode {
        /// Gmail message id.
        id: String,
        /// What went wrong.
        reason: String,
    },

    /// Configuration is missing or semantically invalid.
    #[error("invalid config: {reason}")]
    ConfigInvalid {
        /// What is wrong with the configuration.
        reason: String,
    },

    /// Underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization / deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, RelayError>;
