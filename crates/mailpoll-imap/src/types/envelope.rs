//! Message envelope records.

use chrono::{DateTime, FixedOffset};

use super::SeqNum;
use crate::parser::Attribute;

/// Email address from an envelope.
///
/// The display name is already decoded from RFC 2047 encoded-words. The
/// source route slot of the wire form is dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Address {
    /// Display name.
    pub name: Option<String>,
    /// Mailbox name (local part).
    pub mailbox: Option<String>,
    /// Host name (domain part).
    pub host: Option<String>,
}

impl Address {
    /// Returns the full email address.
    #[must_use]
    pub fn email(&self) -> Option<String> {
        match (&self.mailbox, &self.host) {
            (Some(m), Some(h)) => Some(format!("{m}@{h}")),
            _ => None,
        }
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.name, self.email()) {
            (Some(name), Some(email)) => write!(f, "{name} <{email}>"),
            (None, Some(email)) => f.write_str(&email),
            (Some(name), None) => f.write_str(name),
            (None, None) => Ok(()),
        }
    }
}

/// Message envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Envelope {
    /// Date header, if it could be parsed.
    pub date: Option<DateTime<FixedOffset>>,
    /// Subject header, decoded.
    pub subject: Option<String>,
    /// From addresses.
    pub from: Option<Vec<Address>>,
    /// Sender addresses.
    pub sender: Option<Vec<Address>>,
    /// Reply-To addresses.
    pub reply_to: Option<Vec<Address>>,
    /// To addresses.
    pub to: Option<Vec<Address>>,
    /// Cc addresses.
    pub cc: Option<Vec<Address>>,
    /// Bcc addresses.
    pub bcc: Option<Vec<Address>>,
    /// In-Reply-To header, raw.
    pub in_reply_to: Option<String>,
    /// Message-ID header, raw.
    pub message_id: Option<String>,
}

/// One message record from a FETCH.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FetchedMessage {
    /// Message sequence number.
    pub seq: SeqNum,
    /// Decoded envelope, if ENVELOPE was part of the record.
    pub envelope: Option<Envelope>,
    /// The record's raw key/value attribute list.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub attributes: Vec<Attribute>,
}

impl FetchedMessage {
    /// Returns the value following `key` in the raw attribute list.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&Attribute> {
        self.attributes
            .chunks_exact(2)
            .find(|pair| pair[0].as_atom().is_some_and(|k| k.eq_ignore_ascii_case(key)))
            .map(|pair| &pair[1])
    }
}
