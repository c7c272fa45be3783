//! Framed I/O for IMAP protocol.
//!
//! IMAP uses CRLF-terminated lines with embedded literals (`{n}\r\n` followed
//! by exactly `n` raw bytes). [`LineFramer`] does the framing without doing
//! any I/O, so the same code serves a socket, a test fixture, or a
//! push-driven transport. [`FramedStream`] drives it from a tokio stream.

#![allow(clippy::missing_errors_doc)]

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::{Error, Result};

/// Default buffer size for reading.
const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Maximum line length to prevent memory exhaustion.
const MAX_LINE_LENGTH: usize = 1024 * 1024; // 1 MB

/// Maximum literal size to prevent memory exhaustion.
const MAX_LITERAL_SIZE: usize = 100 * 1024 * 1024; // 100 MB

/// Maximum size of one logical line, literals included.
const MAX_RESPONSE_SIZE: usize = 128 * 1024 * 1024; // 128 MB

/// Splits an arbitrarily chunked byte stream into logical protocol lines.
///
/// Each emitted line excludes its final CRLF. A line that announces a
/// literal keeps the announcement's CRLF, the literal bytes, and whatever
/// follows up to the next unliteral CRLF, so joining every emitted line
/// with `\r\n` gives back the input byte for byte. The output does not
/// depend on where the chunk boundaries fall.
#[derive(Debug)]
pub struct LineFramer {
    buffer: BytesMut,
    /// Start of the segment that follows the most recent literal.
    segment_start: usize,
    /// Where the next CRLF search begins.
    scan_from: usize,
    /// Literal bytes still owed before line framing resumes.
    literal_remaining: usize,
    max_response_size: usize,
}

impl Default for LineFramer {
    fn default() -> Self {
        Self {
            buffer: BytesMut::new(),
            segment_start: 0,
            scan_from: 0,
            literal_remaining: 0,
            max_response_size: MAX_RESPONSE_SIZE,
        }
    }
}

impl LineFramer {
    /// Creates an empty framer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps the size of one logical line, literals included.
    #[must_use]
    pub const fn with_max_response_size(mut self, max: usize) -> Self {
        self.max_response_size = max;
        self
    }

    /// Appends a chunk received from the transport.
    pub fn extend(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Number of bytes held that have not been emitted yet.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Returns the next complete line, or `None` if more bytes are needed.
    pub fn next_line(&mut self) -> Result<Option<Bytes>> {
        loop {
            if self.literal_remaining > 0 {
                let available = self.buffer.len() - self.scan_from;
                if available < self.literal_remaining {
                    self.literal_remaining -= available;
                    self.scan_from = self.buffer.len();
                    return Ok(None);
                }
                self.scan_from += self.literal_remaining;
                self.literal_remaining = 0;
                self.segment_start = self.scan_from;
            }

            let Some(offset) = find_crlf(&self.buffer[self.scan_from..]) else {
                if self.buffer.len() - self.segment_start > MAX_LINE_LENGTH
                    || self.buffer.len() > self.max_response_size
                {
                    return Err(Error::Protocol("line too long".to_string()));
                }
                // A trailing CR may pair with an LF in the next chunk.
                self.scan_from = self
                    .buffer
                    .len()
                    .saturating_sub(1)
                    .max(self.segment_start);
                return Ok(None);
            };
            let crlf = self.scan_from + offset;

            if let Some(literal_len) = parse_literal_length(&self.buffer[self.segment_start..crlf])
            {
                if literal_len > MAX_LITERAL_SIZE {
                    return Err(Error::Protocol(format!(
                        "literal too large: {literal_len} bytes (max {MAX_LITERAL_SIZE})"
                    )));
                }
                if (crlf + 2).saturating_add(literal_len) > self.max_response_size {
                    return Err(Error::Protocol(format!(
                        "response too large: more than {} bytes",
                        self.max_response_size
                    )));
                }
                self.scan_from = crlf + 2;
                self.segment_start = self.scan_from;
                self.literal_remaining = literal_len;
                continue;
            }

            let line = self.buffer.split_to(crlf + 2).freeze();
            self.segment_start = 0;
            self.scan_from = 0;
            return Ok(Some(line.slice(..crlf)));
        }
    }
}

/// Framed connection for IMAP protocol.
///
/// Reads whole logical lines through a [`LineFramer`] and writes commands
/// unbuffered. Reading stops at the line the caller asked for; nothing
/// further is pulled from the transport until the next call.
pub struct FramedStream<S> {
    stream: S,
    framer: LineFramer,
    read_buf: Box<[u8]>,
}

impl<S> FramedStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new framed stream.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            framer: LineFramer::new(),
            read_buf: vec![0; DEFAULT_BUFFER_SIZE].into_boxed_slice(),
        }
    }

    /// Reads the next logical line, without its terminator.
    ///
    /// Fails with [`Error::ConnectionClosed`] when the peer closes the
    /// stream before a full line arrives.
    pub async fn read_line(&mut self) -> Result<Bytes> {
        loop {
            if let Some(line) = self.framer.next_line()? {
                return Ok(line);
            }

            let n = self.stream.read(&mut self.read_buf).await?;
            if n == 0 {
                return Err(Error::ConnectionClosed);
            }
            self.framer.extend(&self.read_buf[..n]);
        }
    }

    /// Writes a command to the stream.
    pub async fn write_command(&mut self, data: &[u8]) -> Result<()> {
        self.stream.write_all(data).await?;
        self.stream.flush().await?;

        Ok(())
    }

    /// Shuts down the write half of the stream.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.stream.shutdown().await?;
        Ok(())
    }
}

/// Finds the position of CRLF in a buffer.
fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

/// Parses a literal length from the end of a line segment.
///
/// Matches `{123}` or `{123+}` (non-synchronizing) as the last thing on the
/// segment, which must not include the CRLF.
fn parse_literal_length(segment: &[u8]) -> Option<usize> {
    let inner = segment.strip_suffix(b"}")?;
    let open = inner.iter().rposition(|&b| b == b'{')?;
    let digits = &inner[open + 1..];
    let digits = digits.strip_suffix(b"+").unwrap_or(digits);

    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }

    std::str::from_utf8(digits).ok()?.parse().ok()
}
