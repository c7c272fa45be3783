//! What a FETCH asks for.

/// The data items of a FETCH command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchItems {
    /// The `ALL` macro.
    All,
    /// The `FULL` macro.
    Full,
    /// The `FAST` macro.
    Fast,
    /// An explicit list, always sent parenthesized.
    Items(Vec<FetchAttribute>),
}

/// One FETCH data item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchAttribute {
    /// `FLAGS`.
    Flags,
    /// `INTERNALDATE`.
    InternalDate,
    /// `RFC822.SIZE`.
    Rfc822Size,
    /// `ENVELOPE`, decoded into [`Envelope`](crate::Envelope).
    Envelope,
    /// `UID`.
    Uid,
    /// `BODY[section]` or `BODY.PEEK[section]`.
    Body {
        /// Section specifier, e.g. `HEADER.FIELDS (SUBJECT)`.
        section: Option<String>,
        /// Leave the `\Seen` flag alone.
        peek: bool,
    },
}

impl FetchItems {
    /// Returns false if any body section could break out of its brackets
    /// or the command line.
    #[must_use]
    pub fn is_sendable(&self) -> bool {
        match self {
            Self::Items(attrs) => attrs.iter().all(FetchAttribute::is_sendable),
            Self::All | Self::Full | Self::Fast => true,
        }
    }
}

impl FetchAttribute {
    /// `BODY.PEEK[section]`.
    ///
    /// The section is checked when the command is issued; see
    /// [`is_sendable`](Self::is_sendable).
    #[must_use]
    pub fn body_peek(section: impl Into<String>) -> Self {
        Self::Body {
            section: Some(section.into()),
            peek: true,
        }
    }

    /// Returns false for a body section holding brackets, CR, LF or NUL.
    #[must_use]
    pub fn is_sendable(&self) -> bool {
        match self {
            Self::Body {
                section: Some(section),
                ..
            } => !section
                .bytes()
                .any(|b| matches!(b, b'[' | b']' | b'\r' | b'\n' | 0)),
            _ => true,
        }
    }
}
