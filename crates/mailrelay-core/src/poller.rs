//! The poll scheduler: drives list -> fetch/decode -> deliver -> cursor.
//!
//! A single long-lived loop runs ticks sequentially; a tick that has
//! started always runs to completion, so shutdown never abandons an
//! in-flight delivery batch. Failures are contained to the smallest unit
//! possible: a bad message is skipped, a failed delivery becomes an
//! outcome, and only listing-level errors fail the tick itself -- the
//! loop sleeps and tries again.

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use mailrelay_types::config::RelayConfig;
use mailrelay_types::error::{RelayError, Result};

use crate::decode::decode;
use crate::deliver::Dispatcher;
use crate::gmail::GmailClient;

/// Marker of ingestion progress: the id of the most recently listed
/// (newest) message. In-memory only; resets on restart. Owned exclusively
/// by the [`Poller`], which mutates it between ticks.
#[derive(Debug, Default)]
pub struct PollCursor {
    last_listed: Option<String>,
}

impl PollCursor {
    /// Record the newest id of a non-empty listing.
    fn advance(&mut self, id: String) {
        self.last_listed = Some(id);
    }

    /// The most recently listed message id, if any tick has listed one.
    pub fn last_listed(&self) -> Option<&str> {
        self.last_listed.as_deref()
    }
}

/// Counters for one completed tick, logged by the loop and asserted on
/// in tests.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// Messages returned by the listing.
    pub listed: usize,
    /// Messages skipped due to fetch or decode failure.
    pub skipped: usize,
    /// Records accepted downstream.
    pub delivered: usize,
    /// Records whose delivery failed.
    pub failed: usize,
}

/// The poll scheduler.
///
/// Owns the mailbox client, the dispatcher, and the cursor, so several
/// pollers can coexist in one process (e.g. under test) without shared
/// mutable state.
pub struct Poller {
    gmail: GmailClient,
    dispatcher: Dispatcher,
    page_size: u32,
    poll_interval: std::time::Duration,
    cursor: PollCursor,
}

impl Poller {
    /// Assemble a poller from its collaborators and configuration.
    pub fn new(gmail: GmailClient, dispatcher: Dispatcher, config: &RelayConfig) -> Self {
        Self {
            gmail,
            dispatcher,
            page_size: config.page_size,
            poll_interval: config.poll_interval(),
            cursor: PollCursor::default(),
        }
    }

    /// The current cursor position.
    pub fn cursor(&self) -> Option<&str> {
        self.cursor.last_listed()
    }

    /// Run the poll loop until `cancel` is triggered.
    ///
    /// The first tick runs immediately; each subsequent tick after the
    /// configured interval. A tick that has started is never interrupted
    /// by cancellation -- its delivery batch drains first.
    pub async fn run(&mut self, cancel: CancellationToken) {
        info!(
            poll_interval_secs = self.poll_interval.as_secs(),
            page_size = self.page_size,
            "mail poller starting"
        );

        let mut interval = tokio::time::interval(self.poll_interval);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("mail poller shutting down");
                    return;
                }
                _ = interval.tick() => {
                    match self.tick().await {
                        Ok(report) if report.listed == 0 => {
                            debug!("no unread messages");
                        }
                        Ok(report) => {
                            info!(
                                listed = report.listed,
                                skipped = report.skipped,
                                delivered = report.delivered,
                                failed = report.failed,
                                "tick complete"
                            );
                        }
                        // The loop survives every tick failure; the next
                        // interval retries from scratch.
                        Err(e) => error!(error = %e, "poll tick failed"),
                    }
                }
            }
        }
    }

    /// One iteration: list, fetch+decode, deliver, advance cursor.
    pub async fn tick(&mut self) -> Result<TickReport> {
        let ids = self.gmail.list_unread(self.page_size).await?;
        if ids.is_empty() {
            return Ok(TickReport::default());
        }

        let mut report = TickReport {
            listed: ids.len(),
            ..TickReport::default()
        };

        let mut batch = Vec::with_capacity(ids.len());
        for id in &ids {
            let raw = match self.gmail.fetch_raw(id).await {
                Ok(raw) => raw,
                // A dead credential will fail every remaining fetch too;
                // escalate instead of logging it once per message.
                Err(e @ RelayError::Auth(_)) => return Err(e),
                Err(e) => {
                    warn!(gmail_id = %id, error = %e, "skipping message");
                    report.skipped += 1;
                    continue;
                }
            };
            match decode(id, &raw) {
                Ok(record) => batch.push(record),
                Err(e) => {
                    warn!(gmail_id = %id, error = %e, "skipping undecodable message");
                    report.skipped += 1;
                }
            }
        }

        // Join barrier: every record gets exactly one outcome before the
        // cursor moves.
        let outcomes = self.dispatcher.deliver(batch).await;
        for outcome in &outcomes {
            if outcome.success {
                report.delivered += 1;
            } else {
                report.failed += 1;
            }
        }

        // The newest listed id, independent of delivery outcomes. An
        // undelivered message stays unread upstream and is re-listed on a
        // later tick (at-least-once semantics).
        if let Some(newest) = ids.first() {
            self.cursor.advance(newest.clone());
        }

        Ok(report)
    }
}
