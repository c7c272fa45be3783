//! IMAP command builder.
//!
//! Only the three commands a poll cycle needs exist. Each kind is sent
//! under its own fixed tag; the session never has more than one command
//! outstanding, so the tag alone identifies the completion.

mod serialize;
mod types;

use crate::types::{SequenceSet, Tag};

pub use types::{FetchAttribute, FetchItems};

use serialize::{write_astring, write_fetch_items, write_quoted};

pub(crate) use serialize::is_quotable;

/// Tag used for LOGIN.
pub const LOGIN_TAG: &str = "A001";
/// Tag used for SELECT.
pub const SELECT_TAG: &str = "A002";
/// Tag used for FETCH.
pub const FETCH_TAG: &str = "A003";

/// IMAP command.
#[derive(Clone, PartialEq, Eq)]
pub enum Command {
    /// LOGIN command.
    Login {
        /// Username.
        username: String,
        /// Password.
        password: String,
    },
    /// SELECT command.
    Select {
        /// Mailbox to select.
        mailbox: String,
    },
    /// FETCH command.
    Fetch {
        /// Sequence set.
        sequence: SequenceSet,
        /// Items to fetch.
        items: FetchItems,
    },
}

impl Command {
    /// Returns the fixed tag for this command kind.
    #[must_use]
    pub fn tag(&self) -> Tag {
        Tag::new(match self {
            Self::Login { .. } => LOGIN_TAG,
            Self::Select { .. } => SELECT_TAG,
            Self::Fetch { .. } => FETCH_TAG,
        })
    }

    /// Returns the command verb.
    #[must_use]
    pub const fn verb(&self) -> &'static str {
        match self {
            Self::Login { .. } => "LOGIN",
            Self::Select { .. } => "SELECT",
            Self::Fetch { .. } => "FETCH",
        }
    }

    /// Serializes the command, tag and CRLF included.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(self.tag().as_str().as_bytes());
        buf.push(b' ');
        buf.extend_from_slice(self.verb().as_bytes());
        buf.push(b' ');
        self.write_arguments(&mut buf);
        buf.extend_from_slice(b"\r\n");
        buf
    }

    /// Returns the arguments as sent, e.g. `1:* (ENVELOPE)` for FETCH.
    ///
    /// Not meant for LOGIN, whose arguments include the password.
    #[must_use]
    pub fn arguments(&self) -> String {
        let mut buf = Vec::new();
        self.write_arguments(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn write_arguments(&self, buf: &mut Vec<u8>) {
        match self {
            Self::Login { username, password } => {
                write_astring(buf, username);
                buf.push(b' ');
                write_astring(buf, password);
            }
            Self::Select { mailbox } => write_quoted(buf, mailbox),
            Self::Fetch { sequence, items } => {
                buf.extend_from_slice(sequence.to_string().as_bytes());
                buf.push(b' ');
                write_fetch_items(buf, items);
            }
        }
    }
}

/// Keeps the password out of logs.
impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Login { username, .. } => f
                .debug_struct("Login")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Self::Select { mailbox } => f.debug_struct("Select").field("mailbox", mailbox).finish(),
            Self::Fetch { sequence, items } => f
                .debug_struct("Fetch")
                .field("sequence", sequence)
                .field("items", items)
                .finish(),
        }
    }
}
