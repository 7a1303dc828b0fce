//! Shared types for the mailrelay ingestion pipeline.
//!
//! Contains the data model ([`record`]), the error taxonomy ([`error`]),
//! environment-sourced configuration ([`config`]), and a secret wrapper
//! ([`secret`]) used for OAuth2 credential material.

pub mod config;
pub mod error;
pub mod record;
pub mod secret;

pub use config::RelayConfig;
pub use error::{RelayError, Result};
pub use record::{DeliveryOutcome, NormalizedRecord};
pub use secret::SecretString;
