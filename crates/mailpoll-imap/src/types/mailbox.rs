//! Selected-mailbox snapshot.

use std::collections::BTreeMap;

/// Value of a `[KEY value]` response code seen during SELECT.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(untagged))]
pub enum ExtraValue {
    /// The value parsed as an integer.
    Integer(i64),
    /// Anything that is not an integer.
    Text(String),
}

impl ExtraValue {
    /// Returns the integer value, if any.
    #[must_use]
    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            Self::Text(_) => None,
        }
    }
}

/// Mailbox state reported by a successful SELECT.
///
/// A fresh snapshot is built for every SELECT; nothing carries over from a
/// previous one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Mailbox {
    /// Mailbox name as passed to SELECT.
    pub path: String,
    /// Number of messages in the mailbox.
    pub exists: u32,
    /// Number of recent messages.
    pub recent: u32,
    /// Flags defined for this mailbox, without the leading `\`.
    pub flags: Vec<String>,
    /// Flags that can be permanently stored, without the leading `\`.
    pub permanent_flags: Vec<String>,
    /// Other `[KEY value]` codes, keyed by lower-cased key
    /// (`uidvalidity`, `uidnext`, `unseen`, ...).
    pub extra: BTreeMap<String, ExtraValue>,
    /// Whether the server granted read-only access.
    pub read_only: bool,
}

impl Mailbox {
    /// Returns an integer-valued extra code such as `uidnext`.
    #[must_use]
    pub fn extra_integer(&self, key: &str) -> Option<i64> {
        self.extra.get(key).and_then(ExtraValue::as_integer)
    }
}
