//! Byte transports: plain TCP or TLS over TCP.

#![allow(clippy::missing_errors_doc)]

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use rustls::pki_types::ServerName;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;

use super::config::{Config, Security};
use super::session::Session;
use crate::{Error, Result};

/// The socket a [`Session`] runs over.
pub enum ImapStream {
    /// Plaintext TCP stream.
    Plain(TcpStream),
    /// TLS over TCP, boxed.
    Tls(Box<TlsStream<TcpStream>>),
}

impl ImapStream {
    /// Runs the TLS handshake over a plaintext stream.
    pub async fn upgrade_to_tls(self, host: &str) -> Result<Self> {
        match self {
            Self::Plain(tcp) => {
                let connector = create_tls_connector()?;
                let server_name = ServerName::try_from(host.to_string())?;
                let tls = connector.connect(server_name, tcp).await?;
                Ok(Self::Tls(Box::new(tls)))
            }
            Self::Tls(_) => Err(Error::Protocol("Stream is already TLS".to_string())),
        }
    }

    /// Returns true if the stream is TLS-encrypted.
    #[must_use]
    pub const fn is_tls(&self) -> bool {
        matches!(self, Self::Tls(_))
    }
}

impl AsyncRead for ImapStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_read(cx, buf),
            Self::Tls(stream) => Pin::new(stream).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for ImapStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_write(cx, buf),
            Self::Tls(stream) => Pin::new(stream).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_flush(cx),
            Self::Tls(stream) => Pin::new(stream).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_shutdown(cx),
            Self::Tls(stream) => Pin::new(stream).poll_shutdown(cx),
        }
    }
}

/// TLS client trusting the Mozilla root set from `webpki-roots`.
pub fn create_tls_connector() -> Result<TlsConnector> {
    let root_store = rustls::RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };

    let config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    Ok(TlsConnector::from(Arc::new(config)))
}

/// Connects to a server with TLS from the start.
pub async fn connect_tls(host: &str, port: u16) -> Result<ImapStream> {
    connect_plain(host, port).await?.upgrade_to_tls(host).await
}

/// Connects to a server without TLS.
pub async fn connect_plain(host: &str, port: u16) -> Result<ImapStream> {
    let addr = format!("{host}:{port}");
    let tcp = TcpStream::connect(&addr).await?;
    Ok(ImapStream::Plain(tcp))
}

/// Dials the server described by `config` and reads its greeting.
///
/// With [`Security::StartTls`] the TLS handshake runs on the fresh socket
/// before any protocol byte is read. The returned session carries the
/// configured command timeout.
///
/// # Errors
///
/// [`Error::Timeout`] if dialing takes longer than `connect_timeout`, and
/// any error from the handshake or [`Session::connect`].
pub async fn open(config: &Config) -> Result<Session<ImapStream>> {
    let dial = async {
        match config.security {
            Security::None => connect_plain(&config.host, config.port).await,
            Security::Implicit => connect_tls(&config.host, config.port).await,
            Security::StartTls => {
                let plain = connect_plain(&config.host, config.port).await?;
                plain.upgrade_to_tls(&config.host).await
            }
        }
    };
    let stream = tokio::time::timeout(config.connect_timeout, dial)
        .await
        .map_err(|_| Error::Timeout(config.connect_timeout))??;

    tracing::debug!(
        host = %config.host,
        port = config.port,
        tls = stream.is_tls(),
        "Connected"
    );

    let mut session = Session::new(stream);
    session.set_timeout(config.command_timeout);
    session.connect().await?;
    Ok(session)
}
