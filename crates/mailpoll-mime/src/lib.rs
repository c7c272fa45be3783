//! # mailpoll-mime
//!
//! Header text decoding used by the mailpoll IMAP engine.
//!
//! IMAP envelopes hand back header fields more or less as the sender wrote
//! them, which means free text (subjects, display names) may still carry
//! RFC 2047 encoded-words and dates come in any of the RFC 5322 forms,
//! obsolete ones included.
//!
//! ```
//! use mailpoll_mime::encoding::decode_encoded_words;
//!
//! assert_eq!(decode_encoded_words("=?utf-8?Q?Jane?= Doe"), "Jane Doe");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod date;
mod error;

pub mod encoding;

pub use date::parse_date;
pub use encoding::{decode_encoded_words, decode_rfc2047};
pub use error::{Error, Result};
