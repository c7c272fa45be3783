//! Core IMAP types.
//!
//! Identifiers and sequence sets used to build commands, and the typed
//! records produced from responses.

#![allow(clippy::missing_const_for_fn)]

mod envelope;
mod identifiers;
mod mailbox;
mod sequence;
mod status;

pub use envelope::{Address, Envelope, FetchedMessage};
pub use identifiers::{SeqNum, Tag};
pub use mailbox::{ExtraValue, Mailbox};
pub use sequence::SequenceSet;
pub use status::Status;
