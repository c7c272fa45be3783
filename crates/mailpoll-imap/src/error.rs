//! Error types for the IMAP engine.

use std::time::Duration;

use thiserror::Error;

use crate::connection::ConnectionState;

/// Errors that can occur during IMAP operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport failure while reading or writing.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer closed the connection, or the session was closed locally.
    #[error("Connection closed")]
    ConnectionClosed,

    /// The server refused the session in its greeting.
    #[error("Server closed connection: {0}")]
    Bye(String),

    /// TLS handshake or encryption error.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Invalid DNS name for TLS.
    #[error("Invalid DNS name: {0}")]
    InvalidDnsName(#[from] rustls::pki_types::InvalidDnsNameError),

    /// A line did not match the response grammar.
    #[error("Parse error at position {position}: {message} (line: {line:?})")]
    Parse {
        /// The offending raw line.
        line: String,
        /// Byte position where the error occurred.
        position: usize,
        /// Description of what went wrong.
        message: String,
    },

    /// LOGIN was rejected.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// SELECT was rejected.
    #[error("Cannot select mailbox {mailbox:?}: {text}")]
    Mailbox {
        /// Mailbox that was requested.
        mailbox: String,
        /// Server-supplied reason.
        text: String,
    },

    /// FETCH was rejected.
    #[error("FETCH {query} failed: {text}")]
    Fetch {
        /// The sequence set and attributes that were requested.
        query: String,
        /// The last raw line received before the failure.
        last_response: String,
        /// Server-supplied reason.
        text: String,
    },

    /// Malformed or unexpected response, including a BAD completion.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The operation is not valid in the current connection state.
    #[error("Invalid state: expected {expected}, connection is {actual:?}")]
    InvalidState {
        /// State(s) the operation requires.
        expected: &'static str,
        /// State the connection was in.
        actual: ConnectionState,
    },

    /// A command did not complete within the configured deadline.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
