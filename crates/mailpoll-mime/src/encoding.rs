//! Encoded-word (RFC 2047) decoding.
//!
//! Header text inside IMAP envelopes is 7-bit; anything else travels as
//! `=?charset?encoding?payload?=` words where `encoding` is `B` (Base64) or
//! `Q` (a Quoted-Printable variant with `_` for space).

use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};

/// Decodes Base64 data, tolerating missing padding.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(data)
        .or_else(|_| STANDARD_NO_PAD.decode(data.trim_end_matches('=')))
        .map_err(Into::into)
}

/// Decodes the payload of a `Q` encoded-word into raw bytes.
///
/// # Errors
///
/// Returns an error on a truncated or non-hex `=XX` escape.
pub fn decode_q(text: &str) -> Result<Vec<u8>> {
    let bytes = text.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'_' => result.push(b' '),
            b'=' => {
                let hex = bytes
                    .get(i + 1..i + 3)
                    .ok_or_else(|| Error::InvalidEncoding("Incomplete escape sequence".into()))?;
                let hex = std::str::from_utf8(hex)
                    .map_err(|_| Error::InvalidEncoding("Non-ASCII escape".into()))?;
                let byte = u8::from_str_radix(hex, 16)
                    .map_err(|e| Error::InvalidEncoding(format!("Invalid hex: {e}")))?;
                result.push(byte);
                i += 2;
            }
            b => result.push(b),
        }
        i += 1;
    }

    Ok(result)
}

/// Maps decoded bytes in `charset` to a Rust string.
///
/// UTF-8 and ASCII are validated, the Latin-1 family maps byte for
/// codepoint, and anything else is read as UTF-8 with replacement
/// characters.
///
/// # Errors
///
/// Returns an error if UTF-8 or ASCII text is not valid UTF-8.
pub fn decode_charset(charset: &str, bytes: Vec<u8>) -> Result<String> {
    // RFC 2231 allows a language suffix: utf-8*en
    let charset = charset.split('*').next().unwrap_or(charset);

    match charset.to_ascii_lowercase().as_str() {
        "utf-8" | "utf8" | "us-ascii" | "ascii" => String::from_utf8(bytes).map_err(Into::into),
        "iso-8859-1" | "iso8859-1" | "iso_8859-1" | "latin1" | "latin-1" | "l1" | "cp819" => {
            Ok(bytes.into_iter().map(char::from).collect())
        }
        _ => Ok(String::from_utf8_lossy(&bytes).into_owned()),
    }
}

/// Decodes a single RFC 2047 encoded-word.
///
/// Text that is not shaped like an encoded-word is returned unchanged.
///
/// # Errors
///
/// Returns an error if the word is shaped like an encoded-word but its
/// encoding or payload is invalid.
pub fn decode_rfc2047(text: &str) -> Result<String> {
    let Some(inner) = text
        .strip_prefix("=?")
        .and_then(|rest| rest.strip_suffix("?="))
    else {
        return Ok(text.to_string());
    };

    let parts: Vec<&str> = inner.splitn(3, '?').collect();
    let [charset, encoding, payload] = parts[..] else {
        return Err(Error::InvalidEncoding(
            "Invalid RFC 2047 format".to_string(),
        ));
    };

    let bytes = match encoding {
        "B" | "b" => decode_base64(payload)?,
        "Q" | "q" => decode_q(payload)?,
        _ => {
            return Err(Error::InvalidEncoding(format!(
                "Unknown encoding: {encoding}"
            )));
        }
    };

    decode_charset(charset, bytes)
}

/// Decodes every encoded-word in a header value.
///
/// Plain text is kept verbatim. Whitespace separating two adjacent
/// encoded-words is dropped, as RFC 2047 section 6.2 requires. A word that
/// fails to decode is left as it was received.
#[must_use]
pub fn decode_encoded_words(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    let mut after_word = false;

    while let Some(start) = rest.find("=?") {
        let (before, candidate) = rest.split_at(start);

        let Some((word, tail)) = split_encoded_word(candidate) else {
            out.push_str(before);
            out.push_str("=?");
            rest = &candidate[2..];
            after_word = false;
            continue;
        };

        match decode_rfc2047(word) {
            Ok(decoded) => {
                if !(after_word && before.chars().all(char::is_whitespace)) {
                    out.push_str(before);
                }
                out.push_str(&decoded);
                after_word = true;
            }
            Err(_) => {
                out.push_str(before);
                out.push_str(word);
                after_word = false;
            }
        }
        rest = tail;
    }

    out.push_str(rest);
    out
}

/// Splits `=?charset?e?payload?=` off the front of `s`.
fn split_encoded_word(s: &str) -> Option<(&str, &str)> {
    let body = s.strip_prefix("=?")?;

    let charset_end = body.find('?')?;
    if charset_end == 0 {
        return None;
    }
    let after_charset = body[charset_end + 1..].as_bytes();
    if !after_charset.first()?.is_ascii_alphabetic() || *after_charset.get(1)? != b'?' {
        return None;
    }

    let payload_start = charset_end + 3;
    let payload_len = body[payload_start..].find("?=")?;
    let end = 2 + payload_start + payload_len + 2;

    let word = &s[..end];
    if word.chars().any(char::is_whitespace) {
        return None;
    }
    Some((word, &s[end..]))
}
