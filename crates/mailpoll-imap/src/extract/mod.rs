//! Typed views over parsed responses.
//!
//! Both extractors read the generic attribute tree produced by
//! [`ResponseParser`](crate::parser::ResponseParser); neither looks at raw
//! bytes.

mod mailbox;
mod record;

pub use mailbox::MailboxBuilder;
pub use record::{MalformedRecord, extract_record};
