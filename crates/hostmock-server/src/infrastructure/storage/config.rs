//! TOML configuration for the mock endpoints served by one process.
//!
//! The file is a list of `[[endpoint]]` blocks, one per listener:
//!
//! ```toml
//! [[endpoint]]
//! port = 6789
//! terminator = "\r\n\n"
//! reply = "ack"
//! expect = "^<root/>$"
//!
//! [[endpoint.forward]]
//! on = "<root/>"
//! host = "127.0.0.1"
//! port = 9400
//! payload = "<notify/>"
//! ```
//!
//! # Defaults
//!
//! Every key except `port` carries a `#[serde(default = "...")]` value, so a
//! minimal block of `port = NNNN` yields a plain acknowledging endpoint with
//! the standard CR LF LF terminator.  When no config file exists yet,
//! [`load_or_init`] writes a commented starter file and runs with
//! [`HostMockConfig::default`].
//!
//! Unknown keys are rejected rather than ignored: a typo in a test fixture
//! should fail the run, not silently change which replies go out.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use hostmock_core::{
    Delivery, Expectation, ExpectationError, ResponseRegistry, Terminator, TerminatorError,
};

use crate::domain::{EndpointOptions, ReplyMode};

/// Config file name looked up in the working directory when `--config` is not
/// given.
pub const DEFAULT_CONFIG_PATH: &str = "hostmock.toml";

/// Port of the single endpoint in [`HostMockConfig::default`].
pub const DEFAULT_PORT: u16 = 6789;

/// Error type for configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// The configured terminator cannot frame messages.
    #[error("endpoint {port}: {source}")]
    BadTerminator {
        port: u16,
        #[source]
        source: TerminatorError,
    },

    /// The configured `expect` pattern is not a valid regular expression.
    #[error("endpoint {port}: {source}")]
    BadPattern {
        port: u16,
        #[source]
        source: ExpectationError,
    },
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration: one `[[endpoint]]` block per mock listener.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HostMockConfig {
    #[serde(default, rename = "endpoint")]
    pub endpoints: Vec<EndpointConfig>,
}

/// One mock TCP endpoint as written in the config file.
///
/// Strings stand in for raw bytes here; [`EndpointConfig::options`] converts
/// them into the domain types the connection handler consumes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EndpointConfig {
    /// TCP port to listen on.  `0` asks the OS for an ephemeral port.
    pub port: u16,
    /// Byte sequence that ends an inbound message.
    #[serde(default = "default_terminator")]
    pub terminator: String,
    /// Bytes written back as the positive acknowledgement.
    #[serde(default = "default_ack")]
    pub ack: String,
    /// Bytes written back as the negative acknowledgement.
    #[serde(default = "default_nak")]
    pub nak: String,
    /// Reply selection: `"ack"`, `"always-nak"` or `"none"`.
    #[serde(default)]
    pub reply: ReplyPolicy,
    /// Optional regex every received message must match.
    #[serde(default)]
    pub expect: Option<String>,
    /// Close the connection after the first reply.
    #[serde(default)]
    pub close_after_reply: bool,
    /// Seconds one read may block before it is logged as idle.
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,
    /// Outbound messages sent when a matching message arrives.
    #[serde(default, rename = "forward")]
    pub forwards: Vec<ForwardRule>,
}

/// Which reply an endpoint writes after each completed message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReplyPolicy {
    /// ACK on success, NAK when the `expect` pattern rejects the message.
    #[default]
    Ack,
    /// NAK every message regardless of validation.
    AlwaysNak,
    /// Write nothing back.
    None,
}

/// One outbound delivery triggered by a received message.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForwardRule {
    /// Message key (terminator stripped) that triggers this rule.
    pub on: String,
    /// Target host name or IP address.
    pub host: String,
    /// Target TCP port.
    pub port: u16,
    /// Payload text written to the target.
    pub payload: String,
    /// Wait for a one-byte acknowledgement from the target.
    #[serde(default)]
    pub await_ack: bool,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_terminator() -> String {
    "\r\n\n".to_string()
}
fn default_ack() -> String {
    "A".to_string()
}
fn default_nak() -> String {
    "N".to_string()
}
fn default_read_timeout_secs() -> u64 {
    30
}

impl Default for HostMockConfig {
    fn default() -> Self {
        Self {
            endpoints: vec![EndpointConfig::default()],
        }
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            terminator: default_terminator(),
            ack: default_ack(),
            nak: default_nak(),
            reply: ReplyPolicy::default(),
            expect: None,
            close_after_reply: false,
            read_timeout_secs: default_read_timeout_secs(),
            forwards: Vec::new(),
        }
    }
}

// ── Schema → domain conversion ────────────────────────────────────────────────

impl EndpointConfig {
    /// Converts the parsed block into connection handling options.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::BadTerminator`] when the terminator string is
    /// empty and [`ConfigError::BadPattern`] when `expect` is not a valid
    /// regular expression.
    pub fn options(&self) -> Result<EndpointOptions, ConfigError> {
        let terminator =
            Terminator::new(self.terminator.as_bytes()).map_err(|source| {
                ConfigError::BadTerminator {
                    port: self.port,
                    source,
                }
            })?;

        let mut options = EndpointOptions::default()
            .with_terminator(terminator)
            .with_ack(self.ack.as_bytes())
            .with_nak(self.nak.as_bytes())
            .with_reply_mode(self.reply.into())
            .with_close_after_reply(self.close_after_reply)
            .with_read_timeout(Duration::from_secs(self.read_timeout_secs));

        if let Some(pattern) = &self.expect {
            let expectation =
                Expectation::new(pattern).map_err(|source| ConfigError::BadPattern {
                    port: self.port,
                    source,
                })?;
            options = options.with_expectation(expectation);
        }

        Ok(options)
    }

    /// Builds the response registry from this endpoint's forward rules.
    pub fn registry(&self) -> ResponseRegistry {
        let mut registry = ResponseRegistry::new();
        for rule in &self.forwards {
            let mut delivery = Delivery::text(&rule.host, rule.port, &rule.payload);
            if rule.await_ack {
                delivery = delivery.with_await_ack();
            }
            registry.add(&rule.on, delivery);
        }
        registry
    }
}

impl From<ReplyPolicy> for ReplyMode {
    fn from(policy: ReplyPolicy) -> Self {
        match policy {
            ReplyPolicy::Ack => ReplyMode::Ack,
            ReplyPolicy::AlwaysNak => ReplyMode::AlwaysNak,
            ReplyPolicy::None => ReplyMode::None,
        }
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Starter file written when no config exists yet.  Must stay in sync with
/// [`HostMockConfig::default`]; a test parses it and compares.
const DEFAULT_CONFIG_TEMPLATE: &str = r#"# HostMock configuration.
#
# Each [[endpoint]] block starts one mock TCP listener.  Every key except
# `port` is optional; the commented lines show the default values.

[[endpoint]]
port = 6789
# terminator = "\r\n\n"
# ack = "A"
# nak = "N"
# reply = "ack"              # "ack" | "always-nak" | "none"
# expect = "^<root/>$"       # regex the received message must match
# close_after_reply = false
# read_timeout_secs = 30

# Forward rules relay a payload to another host whenever the named message
# arrives.  Repeat [[endpoint.forward]] for additional rules.
#
# [[endpoint.forward]]
# on = "<root/>"
# host = "127.0.0.1"
# port = 9400
# payload = "<notify/>"
# await_ack = false
"#;

/// Loads the configuration from `path`, writing a commented starter file and
/// returning [`HostMockConfig::default`] when none exists yet.
///
/// Every endpoint block is validated eagerly so that a bad terminator or
/// `expect` pattern fails at startup instead of on the first connection.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// [`ConfigError::Parse`] for malformed TOML, and the validation variants
/// from [`EndpointConfig::options`].
pub fn load_or_init(path: &Path) -> Result<HostMockConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let config: HostMockConfig =
                toml::from_str(&content).map_err(|source| ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?;
            for endpoint in &config.endpoints {
                endpoint.options()?;
            }
            info!(
                path = %path.display(),
                endpoints = config.endpoints.len(),
                "configuration loaded"
            );
            Ok(config)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            match std::fs::write(path, DEFAULT_CONFIG_TEMPLATE) {
                Ok(()) => info!(path = %path.display(), "wrote starter config"),
                // Running with defaults still works; the file is a convenience.
                Err(e) => warn!(path = %path.display(), error = %e, "could not write starter config"),
            }
            Ok(HostMockConfig::default())
        }
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
