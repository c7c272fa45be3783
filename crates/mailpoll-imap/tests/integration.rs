//! Integration tests for the IMAP session.
//!
//! These tests use a mock stream to simulate IMAP server responses
//! without requiring a real server connection.

#![allow(clippy::unwrap_used)]

use std::io::{self, Cursor};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use mailpoll_imap::{
    ConnectionState, Error, FetchAttribute, FetchItems, Response, ResponseParser, SequenceSet,
    Session,
};

/// Mock stream that returns predefined responses.
struct MockStream {
    /// Responses to return (in order).
    responses: Cursor<Vec<u8>>,
    /// Captured commands sent by the client.
    sent: Arc<Mutex<Vec<u8>>>,
}

impl MockStream {
    fn new(responses: &[u8]) -> Self {
        Self {
            responses: Cursor::new(responses.to_vec()),
            sent: Arc::default(),
        }
    }

    fn sent_handle(&self) -> Arc<Mutex<Vec<u8>>> {
        Arc::clone(&self.sent)
    }
}

impl AsyncRead for MockStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let data = self.responses.get_ref();
        let pos = self.responses.position() as usize;

        if pos >= data.len() {
            return Poll::Ready(Ok(()));
        }

        let remaining = &data[pos..];
        let to_read = remaining.len().min(buf.remaining());
        buf.put_slice(&remaining[..to_read]);
        self.responses.set_position((pos + to_read) as u64);

        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for MockStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.sent.lock().unwrap().extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

const GREETING_AND_SELECT: &[u8] = b"* OK IMAP4rev1 ready\r\n\
A001 OK LOGIN completed\r\n\
* FLAGS (\\Seen)\r\n\
* 3 EXISTS\r\n\
* 0 RECENT\r\n\
* OK [UIDVALIDITY 1700000000] UIDs valid\r\n\
* OK [UIDNEXT 4] Predicted next UID\r\n\
A002 OK [READ-WRITE] SELECT completed\r\n";

fn server(tail: &[u8]) -> MockStream {
    let mut script = GREETING_AND_SELECT.to_vec();
    script.extend_from_slice(tail);
    MockStream::new(&script)
}

async fn selected(stream: MockStream) -> Session<MockStream> {
    let mut session = Session::new(stream);
    session.connect().await.unwrap();
    session.login("user@example.com", "secret").await.unwrap();
    session.select("INBOX").await.unwrap();
    session
}

fn envelope_items() -> FetchItems {
    FetchItems::Items(vec![FetchAttribute::Envelope])
}

#[tokio::test]
async fn test_poll_flow() {
    let stream = server(
        b"* 1 FETCH (ENVELOPE (\"Mon, 7 Feb 1994 21:52:25 -0800\" \"First\" ((\"Jane\" NIL \"jane\" \"example.com\")) NIL NIL NIL NIL NIL NIL \"<1@example.com>\"))\r\n\
* 2 FETCH (ENVELOPE (NIL \"Second\" NIL NIL NIL NIL NIL NIL NIL \"<2@example.com>\"))\r\n\
* 3 FETCH (ENVELOPE (NIL \"=?UTF-8?B?VGhpcmQ=?=\" NIL NIL NIL NIL NIL NIL NIL NIL))\r\n\
A003 OK FETCH completed\r\n",
    );
    let sent = stream.sent_handle();
    let mut session = Session::new(stream);

    session.connect().await.unwrap();
    assert_eq!(session.state(), ConnectionState::Connected);

    session.login("user@example.com", "secret").await.unwrap();
    assert_eq!(session.state(), ConnectionState::Idle);

    let mailbox = session.select("INBOX").await.unwrap();
    assert_eq!(mailbox.exists, 3);
    assert_eq!(mailbox.recent, 0);
    assert_eq!(mailbox.flags, ["Seen"]);
    assert_eq!(mailbox.extra_integer("uidnext"), Some(4));
    assert!(!mailbox.read_only);
    assert_eq!(session.state(), ConnectionState::MailboxSelected);

    let messages = session
        .fetch(&SequenceSet::range_from(1).unwrap(), envelope_items())
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();

    let seqs: Vec<u32> = messages.iter().map(|m| m.seq.get()).collect();
    assert_eq!(seqs, [1, 2, 3]);

    let first = messages[0].envelope.as_ref().unwrap();
    assert_eq!(first.subject.as_deref(), Some("First"));
    assert_eq!(first.from.as_ref().unwrap()[0].to_string(), "Jane <jane@example.com>");
    assert!(first.date.is_some());

    let third = messages[2].envelope.as_ref().unwrap();
    assert_eq!(third.subject.as_deref(), Some("Third"));

    let sent = String::from_utf8(sent.lock().unwrap().clone()).unwrap();
    assert_eq!(
        sent,
        "A001 LOGIN user@example.com secret\r\n\
A002 SELECT \"INBOX\"\r\n\
A003 FETCH 1:* (ENVELOPE)\r\n"
    );
}

#[tokio::test]
async fn test_fetch_failure_after_records() {
    let stream = server(
        b"* 1 FETCH (ENVELOPE (NIL \"One\" NIL NIL NIL NIL NIL NIL NIL NIL))\r\n\
A003 NO Some messages could not be fetched\r\n",
    );
    let mut session = selected(stream).await;

    let mut records = session
        .fetch(&SequenceSet::range_from(1).unwrap(), envelope_items())
        .await
        .unwrap();

    let first = records.next().await.unwrap().unwrap();
    assert_eq!(first.seq.get(), 1);

    match records.next().await {
        Some(Err(Error::Fetch {
            query,
            last_response,
            text,
        })) => {
            assert_eq!(query, "1:* (ENVELOPE)");
            assert!(last_response.starts_with("* 1 FETCH"));
            assert_eq!(text, "Some messages could not be fetched");
        }
        other => panic!("Expected fetch error, got {other:?}"),
    }
    assert!(records.next().await.is_none());
}

#[tokio::test]
async fn test_malformed_record_skipped() {
    let stream = server(
        b"* 1 FETCH (ENVELOPE (NIL \"short\"))\r\n\
* 2 FETCH (ENVELOPE (NIL \"Fine\" NIL NIL NIL NIL NIL NIL NIL NIL))\r\n\
A003 OK FETCH completed\r\n",
    );
    let mut session = selected(stream).await;

    let messages = session
        .fetch(&SequenceSet::range_from(1).unwrap(), envelope_items())
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();

    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].seq.get(), 2);
}

#[tokio::test]
async fn test_literal_in_envelope() {
    let stream = server(
        b"* 1 FETCH (ENVELOPE (NIL {12}\r\nHello\r\nWorld NIL NIL NIL NIL NIL NIL NIL NIL))\r\n\
A003 OK FETCH completed\r\n",
    );
    let mut session = selected(stream).await;

    let messages = session
        .fetch(&SequenceSet::range_from(1).unwrap(), envelope_items())
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();

    let envelope = messages[0].envelope.as_ref().unwrap();
    assert_eq!(envelope.subject.as_deref(), Some("Hello\r\nWorld"));
}

#[tokio::test]
async fn test_eof_mid_fetch() {
    let stream = server(b"* 1 FETCH (ENVELOPE (NIL \"One\" NIL NIL NIL NIL NIL NIL NIL NIL))\r\n");
    let mut session = selected(stream).await;

    let result = session
        .fetch(&SequenceSet::range_from(1).unwrap(), envelope_items())
        .await
        .unwrap()
        .collect()
        .await;

    assert!(matches!(result, Err(Error::ConnectionClosed)));
    assert_eq!(session.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_select_rejected_keeps_login() {
    let stream = MockStream::new(
        b"* OK ready\r\n\
A001 OK LOGIN completed\r\n\
A002 NO Mailbox does not exist\r\n",
    );
    let mut session = Session::new(stream);
    session.connect().await.unwrap();
    session.login("user", "pass").await.unwrap();

    let err = session.select("Missing").await.unwrap_err();
    assert!(matches!(err, Error::Mailbox { ref mailbox, .. } if mailbox == "Missing"));
    assert_eq!(session.state(), ConnectionState::Idle);
    assert!(session.mailbox().is_none());
}

#[test]
fn test_parser_fetch_response() {
    let parsed = ResponseParser::parse(b"* 12 FETCH (FLAGS (\\Seen) UID 100)\r\n").unwrap();

    match parsed {
        Response::Untagged(untagged) => {
            assert_eq!(untagged.number, Some(12));
            assert!(untagged.is("FETCH"));
            assert_eq!(untagged.attributes.len(), 1);
        }
        other => panic!("Expected FETCH response, got {other:?}"),
    }
}
