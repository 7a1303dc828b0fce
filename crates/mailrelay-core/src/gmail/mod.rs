//! Gmail REST API client and credential handling.
//!
//! [`GmailClient`] wraps the two mailbox operations the pipeline needs:
//! listing unread message ids and fetching a message's raw MIME bytes.
//! Credentials come from a [`TokenProvider`], which refreshes expired
//! access tokens transparently.

pub mod client;
pub mod credentials;
pub mod types;

pub use client::GmailClient;
pub use credentials::{AuthorizedUserProvider, StaticTokenProvider, TokenProvider};
