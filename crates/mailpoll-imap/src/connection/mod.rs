//! IMAP connection management.
//!
//! This module provides connection handling for IMAP servers, including:
//! - Configuration (host, port, security mode)
//! - TLS/plaintext stream abstraction
//! - Line framing for the IMAP wire format
//! - The command session and its state machine

mod config;
mod framed;
mod session;
mod state;
mod stream;

pub use config::{Config, ConfigBuilder, Security};
pub use framed::{FramedStream, LineFramer};
pub use session::Session;
pub use state::ConnectionState;
pub use stream::{ImapStream, connect_plain, connect_tls, create_tls_connector, open};
