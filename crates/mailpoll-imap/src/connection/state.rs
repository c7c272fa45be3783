//! Connection state.

/// Where a [`Session`](super::Session) is in the LOGIN / SELECT / FETCH
/// lifecycle.
///
/// ```text
/// Disconnected ── connect ──→ Connected ── login ──→ Authenticating ──→ Idle
///                                 │                                    │  ▲
///                                 └──── PREAUTH greeting ──────────────┘  │
///                                                          select │       │ select NO/BAD
///                                                                 ▼       │
///                                                          MailboxSelected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No protocol exchange has happened yet, or the session was closed.
    #[default]
    Disconnected,
    /// The greeting was read; waiting for LOGIN.
    Connected,
    /// LOGIN is outstanding.
    Authenticating,
    /// Logged in, no mailbox selected.
    Idle,
    /// A mailbox is selected and FETCH is allowed.
    MailboxSelected,
}

impl ConnectionState {
    /// Returns `true` once LOGIN has succeeded.
    #[must_use]
    pub const fn is_authenticated(self) -> bool {
        matches!(self, Self::Idle | Self::MailboxSelected)
    }

    /// Returns `true` if a mailbox is selected.
    #[must_use]
    pub const fn is_selected(self) -> bool {
        matches!(self, Self::MailboxSelected)
    }
}
