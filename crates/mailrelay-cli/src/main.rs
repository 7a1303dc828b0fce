//! `mailrelay` -- Gmail-to-downstream ingestion daemon.
//!
//! Polls a Gmail inbox for unread messages on a fixed cadence, decodes
//! each into a normalized record, and POSTs the records to the configured
//! downstream endpoint. Configuration comes from `MAILRELAY_*`
//! environment variables; see [`RelayConfig`].

use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;

use mailrelay_core::deliver::Dispatcher;
use mailrelay_core::gmail::{AuthorizedUserProvider, GmailClient};
use mailrelay_core::poller::Poller;
use mailrelay_core::retry::RetryConfig;
use mailrelay_types::config::RelayConfig;

/// Gmail-to-downstream ingestion daemon.
#[derive(Parser)]
#[command(name = "mailrelay", about = "Gmail-to-downstream ingestion daemon", version)]
struct Cli {
    /// Enable verbose (debug-level) logging.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    let config = RelayConfig::from_env()?;

    let tokens = Arc::new(AuthorizedUserProvider::from_file(
        &config.token_file,
        config.http_timeout(),
    )?);
    let gmail = GmailClient::new(tokens, config.http_timeout())?;
    let dispatcher = Dispatcher::new(
        &config.downstream_url,
        config.max_concurrency,
        config.http_timeout(),
    )?
    .with_retry(RetryConfig::attempts(config.delivery_attempts));
    let mut poller = Poller::new(gmail, dispatcher, &config);

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received, finishing in-flight tick");
            signal_cancel.cancel();
        }
    });

    poller.run(cancel).await;
    Ok(())
}
