//! Wire encoding of command arguments.

use super::types::{FetchAttribute, FetchItems};

/// Writes `s` bare when it is a valid atom, quoted otherwise.
pub fn write_astring(buf: &mut Vec<u8>, s: &str) {
    if s.is_empty() || s.bytes().any(needs_quoting) {
        write_quoted(buf, s);
    } else {
        buf.extend_from_slice(s.as_bytes());
    }
}

/// Writes a quoted string.
pub fn write_quoted(buf: &mut Vec<u8>, s: &str) {
    buf.push(b'"');
    for b in s.bytes() {
        if b == b'"' || b == b'\\' {
            buf.push(b'\\');
        }
        buf.push(b);
    }
    buf.push(b'"');
}

/// Bytes that cannot appear in a bare atom.
const fn needs_quoting(b: u8) -> bool {
    matches!(b, b' ' | b'"' | b'\\' | b'(' | b')' | b'{' | b'%' | b'*' | b']') || b < 0x20 || b >= 0x7F
}

/// Writes a macro name or a parenthesized item list.
pub fn write_fetch_items(buf: &mut Vec<u8>, items: &FetchItems) {
    match items {
        FetchItems::All => buf.extend_from_slice(b"ALL"),
        FetchItems::Full => buf.extend_from_slice(b"FULL"),
        FetchItems::Fast => buf.extend_from_slice(b"FAST"),
        FetchItems::Items(attrs) => {
            buf.push(b'(');
            for (i, attr) in attrs.iter().enumerate() {
                if i > 0 {
                    buf.push(b' ');
                }
                write_fetch_attribute(buf, attr);
            }
            buf.push(b')');
        }
    }
}

/// Writes one FETCH data item.
pub fn write_fetch_attribute(buf: &mut Vec<u8>, attr: &FetchAttribute) {
    match attr {
        FetchAttribute::Flags => buf.extend_from_slice(b"FLAGS"),
        FetchAttribute::InternalDate => buf.extend_from_slice(b"INTERNALDATE"),
        FetchAttribute::Rfc822Size => buf.extend_from_slice(b"RFC822.SIZE"),
        FetchAttribute::Envelope => buf.extend_from_slice(b"ENVELOPE"),
        FetchAttribute::Uid => buf.extend_from_slice(b"UID"),
        FetchAttribute::Body { section, peek } => {
            if *peek {
                buf.extend_from_slice(b"BODY.PEEK[");
            } else {
                buf.extend_from_slice(b"BODY[");
            }
            if let Some(s) = section {
                buf.extend_from_slice(s.as_bytes());
            }
            buf.push(b']');
        }
    }
}

/// Returns true if `s` can be sent inside a quoted string.
pub fn is_quotable(s: &str) -> bool {
    !s.bytes().any(|b| matches!(b, b'\r' | b'\n' | 0))
}
