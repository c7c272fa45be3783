//! Poller configuration.
//!
//! Loaded either from a JSON file or from environment variables:
//!
//! | Variable          | Field             |
//! |-------------------|-------------------|
//! | `IMAP_HOST`       | `host`            |
//! | `IMAP_PORT`       | `port`            |
//! | `IMAP_SECURE`     | `security`        |
//! | `EMAIL`           | `username`        |
//! | `EMAIL_PASS`      | `password`        |
//! | `IMAP_MAILBOX`    | `mailbox`         |
//! | `CHECKPOINT_PATH` | `checkpoint_path` |

use std::path::{Path, PathBuf};
use std::time::Duration;

use mailpoll_imap::Security;
use serde::Deserialize;

/// Default checkpoint key, shared with earlier deployments.
pub const DEFAULT_CHECKPOINT_KEY: &str = "lastSeq";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required setting is absent.
    #[error("Missing setting: {0}")]
    Missing(&'static str),

    /// A setting has a value that cannot be used.
    #[error("Invalid value for {key}: {value:?}")]
    Invalid {
        /// Setting name.
        key: &'static str,
        /// Offending value.
        value: String,
    },

    /// The configuration file could not be read.
    #[error("Cannot read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid JSON.
    #[error("Invalid configuration file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything one poll cycle needs.
#[derive(Clone, Deserialize)]
pub struct PollConfig {
    /// IMAP server hostname.
    pub host: String,
    /// IMAP server port; defaults to the port of the security mode.
    #[serde(default)]
    pub port: Option<u16>,
    /// Transport security.
    #[serde(default)]
    pub security: Security,
    /// Login name.
    pub username: String,
    /// Login password.
    pub password: String,
    /// Mailbox to poll.
    #[serde(default = "default_mailbox")]
    pub mailbox: String,
    /// Checkpoint file.
    #[serde(default = "default_checkpoint_path")]
    pub checkpoint_path: PathBuf,
    /// Key of the checkpoint inside the file.
    #[serde(default = "default_checkpoint_key")]
    pub checkpoint_key: String,
    /// Per-command deadline in seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_mailbox() -> String {
    "INBOX".to_string()
}

fn default_checkpoint_path() -> PathBuf {
    PathBuf::from("mailpoll-checkpoint.json")
}

fn default_checkpoint_key() -> String {
    DEFAULT_CHECKPOINT_KEY.to_string()
}

impl std::fmt::Debug for PollConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("security", &self.security)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("mailbox", &self.mailbox)
            .field("checkpoint_path", &self.checkpoint_path)
            .field("checkpoint_key", &self.checkpoint_key)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl PollConfig {
    /// Reads the configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let bytes = std::fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is unset or a value does
    /// not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from a variable lookup function.
    ///
    /// `IMAP_SECURE` accepts `true`/`false` (implicit TLS or plaintext),
    /// `1`/`0`, and the mode names `implicit`, `starttls`, `none`.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is unset or a value does
    /// not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |key: &'static str| lookup(key).ok_or(ConfigError::Missing(key));

        let port = lookup("IMAP_PORT")
            .map(|value| {
                value
                    .trim()
                    .parse::<u16>()
                    .map_err(|_| ConfigError::Invalid {
                        key: "IMAP_PORT",
                        value,
                    })
            })
            .transpose()?;

        let security = lookup("IMAP_SECURE")
            .map(|value| parse_security(&value).ok_or(ConfigError::Invalid {
                key: "IMAP_SECURE",
                value,
            }))
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            host: required("IMAP_HOST")?,
            port,
            security,
            username: required("EMAIL")?,
            password: required("EMAIL_PASS")?,
            mailbox: lookup("IMAP_MAILBOX").unwrap_or_else(default_mailbox),
            checkpoint_path: lookup("CHECKPOINT_PATH")
                .map_or_else(default_checkpoint_path, PathBuf::from),
            checkpoint_key: default_checkpoint_key(),
            timeout_secs: None,
        })
    }

    /// Returns the transport configuration for this poller.
    #[must_use]
    pub fn imap_config(&self) -> mailpoll_imap::Config {
        let mut builder = mailpoll_imap::Config::builder(&self.host).security(self.security);
        if let Some(port) = self.port {
            builder = builder.port(port);
        }
        if let Some(secs) = self.timeout_secs {
            builder = builder.command_timeout(Duration::from_secs(secs));
        }
        builder.build()
    }
}

fn parse_security(value: &str) -> Option<Security> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "implicit" | "tls" => Some(Security::Implicit),
        "false" | "0" | "none" => Some(Security::None),
        "starttls" => Some(Security::StartTls),
        _ => None,
    }
}
