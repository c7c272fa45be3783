//! Where and how to dial the IMAP server.

use std::time::Duration;

/// How the transport is protected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum Security {
    /// Plain TCP on port 143. Credentials travel in the clear.
    None,
    /// Dial in plaintext, then run the TLS handshake on that socket before
    /// the greeting is read (port 143).
    StartTls,
    /// TLS from the first byte on port 993.
    #[default]
    Implicit,
}

impl Security {
    /// Port used when none is configured.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::None | Self::StartTls => 143,
            Self::Implicit => 993,
        }
    }
}

/// Transport settings for [`open`](super::open).
#[derive(Debug, Clone)]
pub struct Config {
    /// Host to dial; also the TLS server name.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Transport protection.
    pub security: Security,
    /// Deadline for the TCP connect and TLS handshake.
    pub connect_timeout: Duration,
    /// Deadline for each command, see [`Session::with_timeout`](super::Session::with_timeout).
    pub command_timeout: Option<Duration>,
}

impl Config {
    /// Implicit TLS on port 993 with default timeouts.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        ConfigBuilder::new(host).build()
    }

    /// Starts a [`ConfigBuilder`] for `host`.
    #[must_use]
    pub fn builder(host: impl Into<String>) -> ConfigBuilder {
        ConfigBuilder::new(host)
    }
}

/// Builder for [`Config`]. The port follows the security mode unless
/// set explicitly.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    host: String,
    port: Option<u16>,
    security: Security,
    connect_timeout: Duration,
    command_timeout: Option<Duration>,
}

impl ConfigBuilder {
    /// Starts from implicit TLS and a 30 second connect timeout.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            security: Security::Implicit,
            connect_timeout: Duration::from_secs(30),
            command_timeout: None,
        }
    }

    /// Overrides the port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Chooses the transport protection.
    #[must_use]
    pub const fn security(mut self, security: Security) -> Self {
        self.security = security;
        self
    }

    /// Limits how long dialing and the TLS handshake may take.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the per-command deadline.
    #[must_use]
    pub const fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = Some(timeout);
        self
    }

    /// Finishes the configuration.
    #[must_use]
    pub fn build(self) -> Config {
        Config {
            host: self.host,
            port: self.port.unwrap_or_else(|| self.security.default_port()),
            security: self.security,
            connect_timeout: self.connect_timeout,
            command_timeout: self.command_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_follows_security() {
        for (security, port) in [
            (Security::None, 143),
            (Security::StartTls, 143),
            (Security::Implicit, 993),
        ] {
            let config = Config::builder("mail.example.org").security(security).build();
            assert_eq!(config.port, port);
        }
    }

    #[test]
    fn test_defaults() {
        let config = Config::new("mail.example.org");
        assert_eq!(config.security, Security::Implicit);
        assert_eq!(config.connect_timeout, Duration::from_secs(30));
        assert_eq!(config.command_timeout, None);
    }

    #[test]
    fn test_explicit_port_wins() {
        let config = Config::builder("mail.example.org")
            .security(Security::StartTls)
            .port(10143)
            .connect_timeout(Duration::from_secs(5))
            .command_timeout(Duration::from_secs(60))
            .build();

        assert_eq!(config.port, 10143);
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.command_timeout, Some(Duration::from_secs(60)));
    }
}
