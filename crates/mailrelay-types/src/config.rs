//! Environment-sourced runtime configuration.
//!
//! All knobs are read once at startup from `MAILRELAY_*` environment
//! variables. Only the downstream URL is required; everything else has a
//! default matching the deployed service.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{RelayError, Result};

/// Default seconds between poll ticks.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

/// Default maximum messages listed per tick.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Default ceiling on concurrent downstream POSTs.
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Default per-request HTTP timeout in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Runtime configuration for the poller process.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Downstream ingestion endpoint (`MAILRELAY_DOWNSTREAM_URL`, required).
    pub downstream_url: String,

    /// Seconds between poll ticks (`MAILRELAY_POLL_INTERVAL_SECS`).
    pub poll_interval_secs: u64,

    /// Maximum messages listed per tick (`MAILRELAY_PAGE_SIZE`).
    pub page_size: u32,

    /// Path to the Google authorized-user token file
    /// (`MAILRELAY_TOKEN_FILE`).
    pub token_file: PathBuf,

    /// Ceiling on concurrent downstream POSTs
    /// (`MAILRELAY_MAX_CONCURRENCY`). Sized independently of `page_size`
    /// so raising the page size cannot spike resource use.
    pub max_concurrency: usize,

    /// Total delivery attempts per record (`MAILRELAY_DELIVERY_ATTEMPTS`).
    /// 1 means no retry.
    pub delivery_attempts: u32,

    /// Per-request HTTP timeout in seconds
    /// (`MAILRELAY_HTTP_TIMEOUT_SECS`). Applies to list, fetch, token
    /// refresh, and delivery calls.
    pub http_timeout_secs: u64,
}

impl RelayConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        let downstream_url =
            env::var("MAILRELAY_DOWNSTREAM_URL").map_err(|_| RelayError::ConfigInvalid {
                reason: "MAILRELAY_DOWNSTREAM_URL is not set".into(),
            })?;
        if downstream_url.is_empty() {
            return Err(RelayError::ConfigInvalid {
                reason: "MAILRELAY_DOWNSTREAM_URL is empty".into(),
            });
        }

        Ok(Self {
            downstream_url,
            poll_interval_secs: parsed_var(
                "MAILRELAY_POLL_INTERVAL_SECS",
                DEFAULT_POLL_INTERVAL_SECS,
            )?,
            page_size: parsed_var("MAILRELAY_PAGE_SIZE", DEFAULT_PAGE_SIZE)?,
            token_file: env::var("MAILRELAY_TOKEN_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("token.json")),
            max_concurrency: parsed_var("MAILRELAY_MAX_CONCURRENCY", DEFAULT_MAX_CONCURRENCY)?,
            delivery_attempts: parsed_var("MAILRELAY_DELIVERY_ATTEMPTS", 1)?,
            http_timeout_secs: parsed_var(
                "MAILRELAY_HTTP_TIMEOUT_SECS",
                DEFAULT_HTTP_TIMEOUT_SECS,
            )?,
        })
    }

    /// Spacing between poll ticks.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Per-request HTTP timeout.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

/// Read an optional numeric variable, falling back to `default` when unset.
/// A present-but-unparsable value is a configuration error, not a silent
/// fallback.
fn parsed_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) => raw.parse().map_err(|_| RelayError::ConfigInvalid {
            reason: format!("{name} is not a valid number: {raw:?}"),
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_downstream_url_is_an_error() {
        temp_env::with_var("MAILRELAY_DOWNSTREAM_URL", None::<&str>, || {
            let err = RelayConfig::from_env().unwrap_err();
            assert!(matches!(err, RelayError::ConfigInvalid { .. }));
            assert!(err.to_string().contains("MAILRELAY_DOWNSTREAM_URL"));
        });
    }

    #[test]
    fn defaults_apply_when_only_url_is_set() {
        temp_env::with_vars(
            [
                (
                    "MAILRELAY_DOWNSTREAM_URL",
                    Some("http://localhost:8000/email"),
                ),
                ("MAILRELAY_POLL_INTERVAL_SECS", None),
                ("MAILRELAY_PAGE_SIZE", None),
                ("MAILRELAY_TOKEN_FILE", None),
                ("MAILRELAY_MAX_CONCURRENCY", None),
                ("MAILRELAY_DELIVERY_ATTEMPTS", None),
                ("MAILRELAY_HTTP_TIMEOUT_SECS", None),
            ],
            || {
                let config = RelayConfig::from_env().unwrap();
                assert_eq!(config.downstream_url, "http://localhost:8000/email");
                assert_eq!(config.poll_interval_secs, DEFAULT_POLL_INTERVAL_SECS);
                assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
                assert_eq!(config.token_file, PathBuf::from("token.json"));
                assert_eq!(config.max_concurrency, DEFAULT_MAX_CONCURRENCY);
                assert_eq!(config.delivery_attempts, 1);
                assert_eq!(config.http_timeout(), Duration::from_secs(30));
            },
        );
    }

    #[test]
    fn overrides_are_honored() {
        temp_env::with_vars(
            [
                ("MAILRELAY_DOWNSTREAM_URL", Some("https://agent/email")),
                ("MAILRELAY_POLL_INTERVAL_SECS", Some("3")),
                ("MAILRELAY_PAGE_SIZE", Some("25")),
                ("MAILRELAY_TOKEN_FILE", Some("/etc/mailrelay/token.json")),
                ("MAILRELAY_DELIVERY_ATTEMPTS", Some("3")),
            ],
            || {
                let config = RelayConfig::from_env().unwrap();
                assert_eq!(config.poll_interval(), Duration::from_secs(3));
                assert_eq!(config.page_size, 25);
                assert_eq!(
                    config.token_file,
                    PathBuf::from("/etc/mailrelay/token.json")
                );
                assert_eq!(config.delivery_attempts, 3);
            },
        );
    }

    #[test]
    fn unparsable_number_is_an_error() {
        temp_env::with_vars(
            [
                ("MAILRELAY_DOWNSTREAM_URL", Some("https://agent/email")),
                ("MAILRELAY_PAGE_SIZE", Some("fifty")),
            ],
            || {
                let err = RelayConfig::from_env().unwrap_err();
                assert!(err.to_string().contains("MAILRELAY_PAGE_SIZE"));
            },
        );
    }
}
