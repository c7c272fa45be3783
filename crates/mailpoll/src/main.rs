//! `mailpoll` - fetch message envelopes added since the last run.
//!
//! Runs one poll cycle and prints each new message as a JSON line on
//! stdout. Configuration comes from the JSON file named by the first
//! argument, or from the environment when no argument is given.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod checkpoint;
mod config;
mod poll;

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use checkpoint::JsonFileStore;
use config::PollConfig;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailpoll=info,mailpoll_imap=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match std::env::args_os().nth(1) {
        Some(path) => PollConfig::from_file(Path::new(&path))
            .with_context(|| format!("Loading {}", Path::new(&path).display()))?,
        None => PollConfig::from_env().context("Loading configuration from environment")?,
    };

    let imap = config.imap_config();
    info!(host = %imap.host, port = imap.port, security = ?imap.security, "Starting poll");

    let mut session = mailpoll_imap::connection::open(&imap)
        .await
        .with_context(|| format!("Connecting to {}:{}", imap.host, imap.port))?;
    session
        .login(&config.username, &config.password)
        .await
        .context("Logging in")?;

    let mut store = JsonFileStore::new(&config.checkpoint_path);
    tracing::debug!(path = %store.path().display(), "Using checkpoint file");
    let stdout = std::io::stdout();
    let result = poll::run_cycle(&mut session, &mut store, &config, |record| {
        let mut out = stdout.lock();
        serde_json::to_writer(&mut out, record)?;
        out.write_all(b"\n")?;
        Ok(())
    })
    .await;

    if let Err(e) = session.close().await {
        tracing::debug!(error = %e, "Error closing connection");
    }

    let report = result?;
    info!(
        start = report.start,
        delivered = report.delivered,
        checkpoint = report.checkpoint,
        "Done"
    );
    Ok(())
}
