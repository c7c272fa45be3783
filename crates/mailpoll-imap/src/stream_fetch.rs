//! Lazy FETCH results.
//!
//! Records are decoded one at a time as their lines arrive; nothing is
//! read from the transport until the caller asks for the next record.

use tokio::io::{AsyncRead, AsyncWrite};

use crate::command::FETCH_TAG;
use crate::connection::Session;
use crate::extract::extract_record;
use crate::parser::Response;
use crate::types::{FetchedMessage, SeqNum, Status};
use crate::{Error, Result};

/// The records of one FETCH command.
///
/// Obtained from [`Session::fetch`]. Call [`next`](Self::next) until it
/// returns `None`. Dropping the stream early is allowed: the session reads
/// past the remaining records before its next command.
pub struct FetchStream<'a, S> {
    session: &'a mut Session<S>,
    query: String,
    last_response: String,
    previous_seq: Option<SeqNum>,
    done: bool,
}

impl<S> std::fmt::Debug for FetchStream<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchStream")
            .field("query", &self.query)
            .field("previous_seq", &self.previous_seq)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

impl<'a, S> FetchStream<'a, S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub(crate) const fn new(session: &'a mut Session<S>, query: String) -> Self {
        Self {
            session,
            query,
            last_response: String::new(),
            previous_seq: None,
            done: false,
        }
    }

    /// Returns the FETCH arguments, e.g. `1:* (ENVELOPE)`.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Waits for the next record.
    ///
    /// Returns `None` after the tagged OK. A NO completion is returned as
    /// [`Error::Fetch`], even when records were already yielded; BAD is
    /// [`Error::Protocol`]. Records that do not have the expected shape are
    /// logged and skipped. After an error the stream is finished.
    pub async fn next(&mut self) -> Option<Result<FetchedMessage>> {
        if self.done {
            return None;
        }

        loop {
            let (line, response) = match self.session.next_response().await {
                Ok(Some(next)) => next,
                Ok(None) => continue,
                Err(e) => return self.finish(Err(e)),
            };

            match response {
                Response::Tagged {
                    tag, status, text, ..
                } if tag.as_str() == FETCH_TAG => {
                    self.session.complete();
                    return match status {
                        Status::Ok => self.finish(Ok(None)),
                        Status::No => {
                            let err = Error::Fetch {
                                query: self.query.clone(),
                                last_response: std::mem::take(&mut self.last_response),
                                text,
                            };
                            self.finish(Err(err))
                        }
                        Status::Bad => {
                            self.finish(Err(Error::Protocol(format!("FETCH rejected: {text}"))))
                        }
                    };
                }
                Response::Untagged(untagged) if untagged.is("FETCH") => {
                    self.last_response = String::from_utf8_lossy(&line).into_owned();
                    match extract_record(&untagged) {
                        Ok(message) => {
                            self.check_order(message.seq);
                            return Some(Ok(message));
                        }
                        Err(reason) => {
                            tracing::warn!(
                                seq = untagged.number,
                                %reason,
                                "Skipping malformed FETCH record"
                            );
                        }
                    }
                }
                other => {
                    self.last_response = String::from_utf8_lossy(&line).into_owned();
                    Session::<S>::ignore(&other);
                }
            }
        }
    }

    /// Drains the stream into a vector.
    ///
    /// # Errors
    ///
    /// Returns the first error [`next`](Self::next) reports; records read
    /// before it are lost.
    pub async fn collect(mut self) -> Result<Vec<FetchedMessage>> {
        let mut messages = Vec::new();
        while let Some(message) = self.next().await {
            messages.push(message?);
        }
        Ok(messages)
    }

    fn check_order(&mut self, seq: SeqNum) {
        if let Some(previous) = self.previous_seq
            && seq <= previous
        {
            tracing::warn!(
                seq = seq.get(),
                previous = previous.get(),
                "FETCH record out of order or repeated"
            );
        }
        self.previous_seq = Some(seq);
    }

    fn finish(&mut self, result: Result<Option<FetchedMessage>>) -> Option<Result<FetchedMessage>> {
        self.done = true;
        result.transpose()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tokio_test::io::{Builder, Mock};

    use super::*;
    use crate::command::FetchItems;
    use crate::types::SequenceSet;

    fn selected(builder: &mut Builder) -> &mut Builder {
        builder
            .read(b"* OK ready\r\n")
            .write(b"A001 LOGIN user pass\r\n")
            .read(b"A001 OK done\r\n")
            .write(b"A002 SELECT \"INBOX\"\r\n")
            .read(b"* 3 EXISTS\r\nA002 OK done\r\n")
    }

    async fn open(mock: Mock) -> Session<Mock> {
        let mut session = Session::new(mock);
        session.connect().await.unwrap();
        session.login("user", "pass").await.unwrap();
        session.select("INBOX").await.unwrap();
        session
    }

    #[tokio::test]
    async fn test_out_of_order_passed_through() {
        let mock = selected(&mut Builder::new())
            .write(b"A003 FETCH 1:* (UID)\r\n")
            .read(b"* 2 FETCH (UID 20)\r\n* 1 FETCH (UID 10)\r\n* 1 FETCH (UID 10)\r\n")
            .read(b"A003 OK done\r\n")
            .build();
        let mut session = open(mock).await;

        let messages = session
            .fetch(&SequenceSet::range_from(1).unwrap(), FetchItems::Items(vec![
                crate::command::FetchAttribute::Uid,
            ]))
            .await
            .unwrap()
            .collect()
            .await
            .unwrap();

        let seqs: Vec<u32> = messages.iter().map(|m| m.seq.get()).collect();
        assert_eq!(seqs, [2, 1, 1]);
    }

    #[tokio::test]
    async fn test_bad_completion() {
        let mock = selected(&mut Builder::new())
            .write(b"A003 FETCH * ALL\r\n")
            .read(b"A003 BAD Invalid sequence\r\n")
            .build();
        let mut session = open(mock).await;

        let mut stream = session.fetch(&SequenceSet::All, FetchItems::All).await.unwrap();
        assert!(matches!(stream.next().await, Some(Err(Error::Protocol(_)))));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_early_drop_is_drained() {
        let mock = selected(&mut Builder::new())
            .write(b"A003 FETCH 1:* ALL\r\n")
            .read(b"* 1 FETCH (UID 10)\r\n")
            .read(b"* 2 FETCH (UID 20)\r\n* 3 FETCH (UID 30)\r\nA003 OK done\r\n")
            .write(b"A002 SELECT \"Archive\"\r\n")
            .read(b"* 9 EXISTS\r\nA002 OK done\r\n")
            .build();
        let mut session = open(mock).await;

        {
            let mut stream = session
                .fetch(&SequenceSet::range_from(1).unwrap(), FetchItems::All)
                .await
                .unwrap();
            let first = stream.next().await.unwrap().unwrap();
            assert_eq!(first.seq.get(), 1);
        }

        let mailbox = session.select("Archive").await.unwrap();
        assert_eq!(mailbox.exists, 9);
    }

    #[tokio::test]
    async fn test_unparseable_untagged_skipped() {
        let mock = selected(&mut Builder::new())
            .write(b"A003 FETCH * ALL\r\n")
            .read(b"* 1 FETCH (UID \"open\r\n")
            .read(b"* 2 FETCH (UID 20)\r\nA003 OK done\r\n")
            .build();
        let mut session = open(mock).await;

        let messages = session
            .fetch(&SequenceSet::All, FetchItems::All)
            .await
            .unwrap()
            .collect()
            .await
            .unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].seq.get(), 2);
    }
}
