//! Error types for header text decoding.

use std::string::FromUtf8Error;

/// Result type alias for decoding operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Decoding error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed encoded-word or transfer encoding.
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    /// Base64 decode error.
    #[error("Base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// UTF-8 decode error.
    #[error("UTF-8 decode error: {0}")]
    Utf8Decode(#[from] FromUtf8Error),

    /// Charset this crate cannot map to Unicode.
    #[error("Unsupported charset: {0}")]
    UnsupportedCharset(String),
}
