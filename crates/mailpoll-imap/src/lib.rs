//! # mailpoll-imap
//!
//! A small IMAP client engine for polling a single mailbox: log in, select
//! the mailbox, fetch envelopes from a sequence number onward.
//!
//! ## Features
//!
//! - **Line framing**: CRLF lines with `{n}` literals kept inside the
//!   line that announced them
//! - **Sans-I/O parser**: Responses parsed into an attribute tree
//! - **Serialized commands**: One command in flight, fixed tags
//!   `A001`/`A002`/`A003`
//! - **Lazy FETCH**: Records decoded one at a time as they arrive
//! - **TLS via rustls**: Secure connections without OpenSSL dependency
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailpoll_imap::{Config, FetchAttribute, FetchItems, SequenceSet};
//!
//! #[tokio::main]
//! async fn main() -> mailpoll_imap::Result<()> {
//!     let config = Config::new("imap.example.com");
//!     let mut session = mailpoll_imap::connection::open(&config).await?;
//!
//!     session.login("user@example.com", "password").await?;
//!     let mailbox = session.select("INBOX").await?;
//!     println!("Messages: {}", mailbox.exists);
//!
//!     let mut records = session
//!         .fetch(
//!             &SequenceSet::range_from(1).unwrap(),
//!             FetchItems::Items(vec![FetchAttribute::Envelope]),
//!         )
//!         .await?;
//!     while let Some(record) = records.next().await {
//!         let record = record?;
//!         let subject = record.envelope.and_then(|e| e.subject);
//!         println!("{}: {subject:?}", record.seq);
//!     }
//!     drop(records);
//!
//!     session.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Connection States
//!
//! ```text
//! Disconnected ── connect() ──→ Connected ── login() ──→ Idle ── select() ──→ MailboxSelected
//!                                                         ▲                        │
//!                                                         └──── select() fails ────┘
//! ```
//!
//! A PREAUTH greeting skips straight to `Idle`. Any transport failure,
//! timeout or rejected login drops the connection and returns the session
//! to `Disconnected`.
//!
//! ## Modules
//!
//! - [`command`]: Command types and wire serialization
//! - [`connection`]: Transport, framing and the command session
//! - [`extract`]: Mailbox metadata and FETCH record extraction
//! - [`parser`]: Sans-I/O response parser
//! - [`types`]: Core IMAP types (mailboxes, envelopes, sequences, etc.)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod extract;
pub mod parser;
mod stream_fetch;
pub mod types;

pub use command::{Command, FetchAttribute, FetchItems};
pub use connection::{
    Config, ConfigBuilder, ConnectionState, FramedStream, ImapStream, LineFramer, Security,
    Session,
};
pub use error::{Error, Result};
pub use extract::{MailboxBuilder, MalformedRecord};
pub use parser::{Attribute, Response, ResponseParser, UntaggedResponse};
pub use stream_fetch::FetchStream;
pub use types::{
    Address, Envelope, ExtraValue, FetchedMessage, Mailbox, SeqNum, SequenceSet, Status, Tag,
};
