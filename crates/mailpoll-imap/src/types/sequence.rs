//! Sequence sets for message ranges.

use super::SeqNum;

/// Sequence set for specifying message ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceSet {
    /// Single sequence number.
    Single(SeqNum),
    /// Range of sequence numbers (inclusive).
    Range(SeqNum, SeqNum),
    /// Range from start to end of mailbox.
    RangeFrom(SeqNum),
    /// All messages (*).
    All,
    /// Multiple sequence specifications.
    Set(Vec<Self>),
    /// Caller-supplied text, sent as is.
    Raw(String),
}

impl SequenceSet {
    /// Creates a sequence set from a single number.
    #[must_use]
    pub fn single(n: u32) -> Option<Self> {
        SeqNum::new(n).map(Self::Single)
    }

    /// Creates a range sequence set.
    #[must_use]
    pub fn range(start: u32, end: u32) -> Option<Self> {
        Some(Self::Range(SeqNum::new(start)?, SeqNum::new(end)?))
    }

    /// Creates `start:*`.
    #[must_use]
    pub fn range_from(start: u32) -> Option<Self> {
        SeqNum::new(start).map(Self::RangeFrom)
    }

    /// Wraps caller-supplied sequence-set text such as `"2,4:7"`.
    ///
    /// Returns `None` if the text contains anything but digits, `:`, `,`
    /// and `*`, so that it cannot break out of the command line.
    #[must_use]
    pub fn raw(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        is_sequence_text(&text).then_some(Self::Raw(text))
    }

    /// Returns false if a [`Raw`](Self::Raw) part, however it was built,
    /// holds anything but sequence-set characters.
    pub(crate) fn is_sendable(&self) -> bool {
        match self {
            Self::Raw(text) => is_sequence_text(text),
            Self::Set(items) => items.iter().all(Self::is_sendable),
            _ => true,
        }
    }
}

fn is_sequence_text(text: &str) -> bool {
    !text.is_empty()
        && text
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b':' | b',' | b'*'))
}

impl std::fmt::Display for SequenceSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single(n) => write!(f, "{n}"),
            Self::Range(start, end) => write!(f, "{start}:{end}"),
            Self::RangeFrom(start) => write!(f, "{start}:*"),
            Self::All => write!(f, "*"),
            Self::Set(items) => {
                let s: Vec<_> = items.iter().map(ToString::to_string).collect();
                write!(f, "{}", s.join(","))
            }
            Self::Raw(text) => f.write_str(text),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn single_zero_returns_none() {
        assert!(SequenceSet::single(0).is_none());
        assert!(SequenceSet::range(0, 10).is_none());
        assert!(SequenceSet::range_from(0).is_none());
    }

    #[test]
    fn display_forms() {
        assert_eq!(SequenceSet::single(42).unwrap().to_string(), "42");
        assert_eq!(SequenceSet::range(1, 100).unwrap().to_string(), "1:100");
        assert_eq!(SequenceSet::range_from(50).unwrap().to_string(), "50:*");
        assert_eq!(SequenceSet::All.to_string(), "*");
    }

    #[test]
    fn display_set() {
        let seq = SequenceSet::Set(vec![
            SequenceSet::single(1).unwrap(),
            SequenceSet::range(5, 10).unwrap(),
        ]);
        assert_eq!(format!("{seq}"), "1,5:10");
    }

    #[test]
    fn raw_text() {
        assert_eq!(SequenceSet::raw("2,4:*").unwrap().to_string(), "2,4:*");
        assert!(SequenceSet::raw("").is_none());
        assert!(SequenceSet::raw("1:* (BODY[])\r\nA9 LOGOUT").is_none());
    }

    #[test]
    fn hand_built_raw_is_checked() {
        assert!(SequenceSet::raw("1:4,7").unwrap().is_sendable());
        assert!(!SequenceSet::Raw("1\r\nA9 LOGOUT".into()).is_sendable());
        assert!(!SequenceSet::Set(vec![SequenceSet::All, SequenceSet::Raw(String::new())]).is_sendable());
    }
}
