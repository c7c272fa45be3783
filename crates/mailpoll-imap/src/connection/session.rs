//! Command session: one connection, one outstanding command.
//!
//! [`Session`] issues LOGIN, SELECT and FETCH, routes every response line
//! to the command it belongs to and tracks the [`ConnectionState`].

use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::Instant;

use super::framed::FramedStream;
use super::state::ConnectionState;
use crate::command::{Command, FetchItems, LOGIN_TAG, SELECT_TAG, is_quotable};
use crate::extract::MailboxBuilder;
use crate::parser::{Response, ResponseParser};
use crate::stream_fetch::FetchStream;
use crate::types::{Mailbox, SequenceSet, Status, Tag};
use crate::{Error, Result};

/// An IMAP session over any ordered byte stream.
///
/// Commands are strictly serialized: a command is only written once the
/// previous one has seen its tagged completion. If a [`FetchStream`] is
/// dropped before its completion arrived, the next command first reads
/// and discards the rest of that FETCH.
pub struct Session<S> {
    stream: Option<FramedStream<S>>,
    state: ConnectionState,
    mailbox: Option<Mailbox>,
    /// Tag of the command whose completion has not been read yet.
    outstanding: Option<Tag>,
    timeout: Option<Duration>,
    deadline: Option<Instant>,
}

impl<S> std::fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("mailbox", &self.mailbox.as_ref().map(|m| &m.path))
            .field("outstanding", &self.outstanding)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps a transport. Nothing is read until [`connect`](Self::connect).
    pub fn new(stream: S) -> Self {
        Self {
            stream: Some(FramedStream::new(stream)),
            state: ConnectionState::Disconnected,
            mailbox: None,
            outstanding: None,
            timeout: None,
            deadline: None,
        }
    }

    /// Sets a deadline for each command, the greeting included.
    ///
    /// When it expires the session is closed and the command fails with
    /// [`Error::Timeout`].
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Changes the per-command deadline. `None` waits forever.
    pub const fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
    }

    /// Returns the connection state.
    #[must_use]
    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    /// Returns the selected mailbox snapshot.
    ///
    /// Only present in [`ConnectionState::MailboxSelected`].
    #[must_use]
    pub const fn mailbox(&self) -> Option<&Mailbox> {
        self.mailbox.as_ref()
    }

    /// Reads the server greeting.
    ///
    /// `* OK` moves to [`ConnectionState::Connected`], `* PREAUTH` straight
    /// to [`ConnectionState::Idle`].
    ///
    /// # Errors
    ///
    /// [`Error::Bye`] if the server refuses the session, [`Error::Protocol`]
    /// for any other greeting, and transport errors as they occur.
    pub async fn connect(&mut self) -> Result<()> {
        self.require(self.state == ConnectionState::Disconnected, "Disconnected")?;
        if self.stream.is_none() {
            return Err(Error::ConnectionClosed);
        }

        self.start_deadline();
        let line = self.read_line().await?;
        let response = match ResponseParser::parse(&line) {
            Ok(response) => response,
            Err(e) => {
                self.abort();
                return Err(e);
            }
        };

        match response {
            Response::Untagged(greeting) if greeting.is("OK") => {
                tracing::debug!(text = greeting.text(), "Greeting");
                self.state = ConnectionState::Connected;
                Ok(())
            }
            Response::Untagged(greeting) if greeting.is("PREAUTH") => {
                tracing::debug!(text = greeting.text(), "Pre-authenticated greeting");
                self.state = ConnectionState::Idle;
                Ok(())
            }
            Response::Untagged(greeting) if greeting.is("BYE") => {
                let text = greeting.text().unwrap_or_default().to_string();
                tracing::info!(%text, "BYE");
                self.abort();
                Err(Error::Bye(text))
            }
            other => {
                self.abort();
                Err(Error::Protocol(format!("Unexpected greeting: {other:?}")))
            }
        }
    }

    /// Logs in with LOGIN.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] unless [`ConnectionState::Connected`].
    /// [`Error::Auth`] if the server answers NO or BAD, [`Error::Parse`] if
    /// the completion does not parse; the session is then closed.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<()> {
        self.require(self.state == ConnectionState::Connected, "Connected")?;
        if !is_quotable(username) || !is_quotable(password) {
            return Err(Error::Auth(
                "Credentials must not contain line breaks".to_string(),
            ));
        }

        self.state = ConnectionState::Authenticating;
        self.send(&Command::Login {
            username: username.to_string(),
            password: password.to_string(),
        })
        .await?;

        loop {
            match self.next_response().await? {
                Some((_, Response::Tagged { tag, status, text, .. })) if tag.as_str() == LOGIN_TAG => {
                    self.complete();
                    if status.is_ok() {
                        tracing::debug!(username, "Logged in");
                        self.state = ConnectionState::Idle;
                        return Ok(());
                    }
                    tracing::debug!(username, %status, %text, "Login rejected");
                    self.abort();
                    return Err(Error::Auth(text));
                }
                Some((_, response)) => Self::ignore(&response),
                None => {}
            }
        }
    }

    /// Selects a mailbox and returns its snapshot.
    ///
    /// Any previous snapshot is discarded as soon as the command is issued.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] before login. [`Error::Mailbox`] on NO and
    /// [`Error::Protocol`] on BAD; in both cases the state falls back to
    /// [`ConnectionState::Idle`].
    pub async fn select(&mut self, path: &str) -> Result<&Mailbox> {
        self.require(self.state.is_authenticated(), "Idle or MailboxSelected")?;
        if !is_quotable(path) {
            return Err(Error::Mailbox {
                mailbox: path.to_string(),
                text: "Mailbox name must not contain line breaks".to_string(),
            });
        }

        self.mailbox = None;
        self.state = ConnectionState::Idle;
        self.send(&Command::Select {
            mailbox: path.to_string(),
        })
        .await?;

        let mut builder = MailboxBuilder::new(path);
        loop {
            match self.next_response().await? {
                Some((
                    _,
                    Response::Tagged {
                        tag,
                        status,
                        code,
                        text,
                    },
                )) if tag.as_str() == SELECT_TAG => {
                    self.complete();
                    return match status {
                        Status::Ok => {
                            builder.observe_completion(code.as_deref());
                            let mailbox = builder.finish();
                            tracing::debug!(
                                mailbox = %mailbox.path,
                                exists = mailbox.exists,
                                recent = mailbox.recent,
                                read_only = mailbox.read_only,
                                "Mailbox selected"
                            );
                            self.state = ConnectionState::MailboxSelected;
                            let mailbox = self.mailbox.insert(mailbox);
                            Ok(&*mailbox)
                        }
                        Status::No => Err(Error::Mailbox {
                            mailbox: path.to_string(),
                            text,
                        }),
                        Status::Bad => Err(Error::Protocol(format!("SELECT rejected: {text}"))),
                    };
                }
                Some((_, Response::Untagged(untagged))) => {
                    if !builder.observe(&untagged) {
                        Self::ignore(&Response::Untagged(untagged));
                    }
                }
                Some((_, response)) => Self::ignore(&response),
                None => {}
            }
        }
    }

    /// Issues FETCH and returns the records as a lazy stream.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] unless a mailbox is selected.
    /// [`Error::Protocol`] without sending anything if the sequence set or
    /// a body section could break out of the command line. Transport errors
    /// while writing the command. Errors reported by the server come out of
    /// [`FetchStream::next`].
    pub async fn fetch(
        &mut self,
        sequence: &SequenceSet,
        items: FetchItems,
    ) -> Result<FetchStream<'_, S>> {
        self.require(self.state.is_selected(), "MailboxSelected")?;
        if !sequence.is_sendable() || !items.is_sendable() {
            return Err(Error::Protocol(
                "FETCH arguments must not contain brackets or line breaks".to_string(),
            ));
        }

        let command = Command::Fetch {
            sequence: sequence.clone(),
            items,
        };
        let query = command.arguments();
        self.send(&command).await?;

        Ok(FetchStream::new(self, query))
    }

    /// Shuts the transport down. The session ends up
    /// [`ConnectionState::Disconnected`] whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns the transport error if the shutdown itself failed.
    pub async fn close(&mut self) -> Result<()> {
        let stream = self.stream.take();
        self.abort();
        match stream {
            Some(mut stream) => stream.shutdown().await,
            None => Ok(()),
        }
    }

    const fn require(&self, allowed: bool, expected: &'static str) -> Result<()> {
        if allowed {
            Ok(())
        } else {
            Err(Error::InvalidState {
                expected,
                actual: self.state,
            })
        }
    }

    /// Writes a command once the previous one has completed.
    async fn send(&mut self, command: &Command) -> Result<()> {
        self.drain().await?;

        let tag = command.tag();
        tracing::debug!(%tag, command = command.verb(), "Sending command");

        self.start_deadline();
        let bytes = command.serialize();
        let Some(stream) = self.stream.as_mut() else {
            return Err(Error::ConnectionClosed);
        };
        let result = match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, stream.write_command(&bytes))
                .await
                .unwrap_or_else(|_| Err(Error::Timeout(self.timeout.unwrap_or_default()))),
            None => stream.write_command(&bytes).await,
        };
        if result.is_err() {
            self.abort();
        }
        result?;

        self.outstanding = Some(tag);
        Ok(())
    }

    /// Reads and discards responses up to the completion of the command
    /// left outstanding by a dropped fetch stream.
    async fn drain(&mut self) -> Result<()> {
        let Some(tag) = self.outstanding.clone() else {
            return Ok(());
        };
        tracing::debug!(%tag, "Draining unfinished command");

        loop {
            if let Some((_, Response::Tagged { tag: done, .. })) = self.next_response().await?
                && done == tag
            {
                self.complete();
                return Ok(());
            }
        }
    }

    /// Reads the next response.
    ///
    /// Untagged lines that do not parse are logged and reported as `None`;
    /// any other parse failure closes the session and is returned.
    pub(crate) async fn next_response(&mut self) -> Result<Option<(Bytes, Response)>> {
        let line = self.read_line().await?;
        match ResponseParser::parse(&line) {
            Ok(response) => Ok(Some((line, response))),
            Err(e) if line.starts_with(b"*") => {
                tracing::warn!(error = %e, "Skipping unparseable untagged response");
                Ok(None)
            }
            Err(e) => {
                // The completion for the command in flight is lost.
                self.abort();
                Err(e)
            }
        }
    }

    /// Marks the outstanding command as completed.
    pub(crate) fn complete(&mut self) {
        self.outstanding = None;
        self.deadline = None;
    }

    /// Logs a response that no command is interested in.
    pub(crate) fn ignore(response: &Response) {
        match response {
            Response::Untagged(untagged) if untagged.is("BYE") => {
                tracing::info!(text = untagged.text(), "BYE");
            }
            Response::Untagged(untagged) => {
                tracing::debug!(
                    verb = %untagged.verb,
                    number = untagged.number,
                    "Ignoring untagged response"
                );
            }
            Response::Tagged { tag, status, .. } => {
                tracing::warn!(%tag, %status, "Ignoring completion for unknown tag");
            }
            Response::Continuation { .. } => {
                tracing::debug!("Ignoring continuation request");
            }
        }
    }

    async fn read_line(&mut self) -> Result<Bytes> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(Error::ConnectionClosed);
        };
        let result = match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, stream.read_line())
                .await
                .unwrap_or_else(|_| Err(Error::Timeout(self.timeout.unwrap_or_default()))),
            None => stream.read_line().await,
        };
        if result.is_err() {
            self.abort();
        }
        result
    }

    fn start_deadline(&mut self) {
        self.deadline = self.timeout.map(|t| Instant::now() + t);
    }

    /// Drops the transport and forgets all per-connection state.
    fn abort(&mut self) {
        if self.stream.take().is_some() {
            tracing::debug!(state = ?self.state, "Closing connection");
        }
        self.state = ConnectionState::Disconnected;
        self.mailbox = None;
        self.outstanding = None;
        self.deadline = None;
    }
}
