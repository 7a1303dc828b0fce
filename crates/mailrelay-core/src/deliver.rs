//! Concurrent delivery of normalized records to the downstream endpoint.
//!
//! [`Dispatcher::deliver`] POSTs every record in a batch independently and
//! concurrently, bounded by a semaphore sized separately from the listing
//! page size. Every input record yields exactly one [`DeliveryOutcome`];
//! one record's failure never blocks its siblings.

use std::sync::Arc;

use futures_util::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use mailrelay_types::error::{RelayError, Result};
use mailrelay_types::record::{DeliveryOutcome, NormalizedRecord};

use crate::retry::{RetryConfig, with_retry};

/// How one POST attempt failed. Transport failures and throttling or
/// server errors are worth retrying; other statuses are not.
#[derive(Debug)]
enum PostFailure {
    /// Timeout, connection reset, DNS failure, and similar.
    Transport(String),
    /// Non-2xx response with its body.
    Status(u16, String),
}

impl PostFailure {
    fn is_retryable(&self) -> bool {
        match self {
            PostFailure::Transport(_) => true,
            PostFailure::Status(code, _) => *code == 429 || (500..600).contains(code),
        }
    }

    fn detail(&self) -> String {
        match self {
            PostFailure::Transport(reason) => reason.clone(),
            PostFailure::Status(code, body) => format!("HTTP {code}: {body}"),
        }
    }
}

/// Concurrent downstream delivery with per-record outcomes.
pub struct Dispatcher {
    http: reqwest::Client,
    url: String,
    limit: Arc<Semaphore>,
    retry: RetryConfig,
}

impl Dispatcher {
    /// Create a dispatcher POSTing to `url`, with at most
    /// `max_concurrency` requests in flight and the given per-request
    /// timeout. Retry defaults to a single attempt.
    pub fn new(
        url: impl Into<String>,
        max_concurrency: usize,
        timeout: std::time::Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RelayError::ConfigInvalid {
                reason: format!("cannot build http client: {e}"),
            })?;
        Ok(Self {
            http,
            url: url.into(),
            limit: Arc::new(Semaphore::new(max_concurrency.max(1))),
            retry: RetryConfig::default(),
        })
    }

    /// Replace the retry policy applied around each record's POST.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Deliver a batch, returning exactly one outcome per input record.
    ///
    /// Completes only when every record's attempt chain has finished
    /// (success, failure, or timeout) -- the caller's barrier before the
    /// cursor update.
    pub async fn deliver(&self, records: Vec<NormalizedRecord>) -> Vec<DeliveryOutcome> {
        join_all(records.into_iter().map(|record| self.deliver_one(record))).await
    }

    async fn deliver_one(&self, record: NormalizedRecord) -> DeliveryOutcome {
        let gmail_id = record.gmail_id.clone();

        let _permit = match self.limit.acquire().await {
            Ok(permit) => permit,
            Err(_) => return DeliveryOutcome::failed(gmail_id, "dispatcher closed"),
        };

        let result = with_retry(
            &self.retry,
            PostFailure::is_retryable,
            || self.post_once(&record),
        )
        .await;

        match result {
            Ok(()) => {
                debug!(gmail_id = %gmail_id, "record accepted downstream");
                DeliveryOutcome::accepted(gmail_id)
            }
            Err(failure) => {
                let detail = failure.detail();
                warn!(gmail_id = %gmail_id, detail = %detail, "record delivery failed");
                DeliveryOutcome::failed(gmail_id, detail)
            }
        }
    }

    async fn post_once(&self, record: &NormalizedRecord) -> std::result::Result<(), PostFailure> {
        let resp = self
            .http
            .post(&self.url)
            .json(record)
            .send()
            .await
            .map_err(|e| PostFailure::Transport(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        Err(PostFailure::Status(status.as_u16(), body))
    }
}
