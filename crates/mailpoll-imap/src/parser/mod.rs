//! IMAP protocol parser.
//!
//! This module provides a sans-I/O parser for IMAP server responses.
//!
//! # Architecture
//!
//! The parser is split into two main components:
//!
//! - **Lexer**: Tokenizes raw bytes into IMAP tokens (atoms, strings, numbers, etc.)
//! - **Response Parser**: Builds a generic attribute tree from tokens
//!
//! # Example
//!
//! ```
//! use mailpoll_imap::parser::{Response, ResponseParser};
//!
//! let response = ResponseParser::parse(b"* 3 EXISTS\r\n").unwrap();
//!
//! match response {
//!     Response::Untagged(untagged) => {
//!         assert_eq!(untagged.number, Some(3));
//!         assert_eq!(untagged.verb, "EXISTS");
//!     }
//!     _ => panic!("Expected untagged response"),
//! }
//! ```

pub mod lexer;
pub mod response;

pub use lexer::{Lexer, Token};
pub use response::{Attribute, Response, ResponseParser, UntaggedResponse};
