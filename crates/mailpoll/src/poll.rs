//! One poll cycle: fetch every message added since the last checkpoint.

use anyhow::{Context, Result};
use mailpoll_imap::{FetchAttribute, FetchItems, FetchedMessage, SequenceSet, Session};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info};

use crate::checkpoint::CheckpointStore;
use crate::config::PollConfig;

/// Outcome of a poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    /// First sequence number requested.
    pub start: u32,
    /// Records handed to the sink.
    pub delivered: usize,
    /// Checkpoint written at the end of the cycle, if any.
    pub checkpoint: Option<u32>,
}

/// Runs one poll cycle on a logged-in session.
///
/// Reads the checkpoint, selects the mailbox, fetches envelopes from the
/// message after the checkpoint onward and hands each record to `sink`.
/// A server answers `N:*` with the last message when `N` is past the end
/// of the mailbox, so records numbered below the start are dropped. The
/// checkpoint is written once, after the fetch completed.
///
/// # Errors
///
/// Returns an error if the checkpoint cannot be read or written, if it
/// does not hold a sequence number, if the sink fails, or on any IMAP
/// error. The checkpoint is left untouched in every error case.
pub async fn run_cycle<S, C, F>(
    session: &mut Session<S>,
    store: &mut C,
    config: &PollConfig,
    mut sink: F,
) -> Result<CycleReport>
where
    S: AsyncRead + AsyncWrite + Unpin,
    C: CheckpointStore,
    F: FnMut(&FetchedMessage) -> Result<()>,
{
    let key = config.checkpoint_key.as_str();
    let last = store
        .get(key)
        .context("Reading checkpoint")?
        .map(|value| {
            value
                .trim()
                .parse::<u32>()
                .with_context(|| format!("Checkpoint {key} is not a sequence number: {value:?}"))
        })
        .transpose()?;
    let start = last.map_or(1, |n| n.saturating_add(1));

    let mailbox = session
        .select(&config.mailbox)
        .await
        .with_context(|| format!("Selecting {}", config.mailbox))?;
    info!(mailbox = %mailbox.path, exists = mailbox.exists, start, "Mailbox selected");

    let sequence = SequenceSet::range_from(start).context("Start sequence number is zero")?;
    let mut records = session
        .fetch(&sequence, FetchItems::Items(vec![FetchAttribute::Envelope]))
        .await
        .context("Issuing FETCH")?;

    let mut delivered = 0;
    let mut highest = None;
    while let Some(record) = records.next().await {
        let record = record.context("Fetching envelopes")?;
        let seq = record.seq.get();
        if seq < start {
            debug!(seq, start, "Nothing new past the checkpoint");
            continue;
        }
        sink(&record)?;
        delivered += 1;
        highest = highest.max(Some(seq));
    }

    let checkpoint = highest.filter(|&seq| last.is_none_or(|last| seq > last));
    if let Some(seq) = checkpoint {
        store
            .put(key, &seq.to_string())
            .context("Writing checkpoint")?;
    }

    info!(delivered, checkpoint, "Poll cycle finished");
    Ok(CycleReport {
        start,
        delivered,
        checkpoint,
    })
}
