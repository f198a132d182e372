//! HostMock entry point.
//!
//! This binary stands in for host-system TCP endpoints during integration
//! tests.  Each configured endpoint accepts connections, frames inbound bytes
//! on a terminator sequence, answers with ACK/NAK bytes, and optionally
//! relays follow-up messages to other hosts.
//!
//! # Usage
//!
//! ```text
//! hostmock [OPTIONS]
//!
//! Options:
//!   --config <PATH>  TOML config file [default: hostmock.toml]
//!   --port   <PORT>  Serve one default endpoint on PORT, ignore the config
//! ```
//!
//! # Environment variable overrides
//!
//! CLI args take precedence when both are present.
//!
//! | Variable          | Default         | Description                     |
//! |-------------------|-----------------|---------------------------------|
//! | `HOSTMOCK_CONFIG` | `hostmock.toml` | Config file path                |
//! | `HOSTMOCK_PORT`   | unset           | Single-endpoint shortcut port   |
//!
//! # Architecture overview
//!
//! ```text
//! test client  (terminator-framed bytes over TCP)
//!       ↕
//! hostmock  ← this process
//!   domain/          endpoint behaviour options, received messages
//!   application/     ServerPool owning one listener per port
//!   infrastructure/
//!     network/       listener, per-connection worker, outbound dispatch
//!     storage/       TOML configuration
//!       ↕
//! forward targets  (other hosts receiving relayed payloads)
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use hostmock_server::application::ServerPool;
use hostmock_server::infrastructure::network::LogHooks;
use hostmock_server::infrastructure::storage::config::{self, DEFAULT_CONFIG_PATH};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Mock TCP endpoints for host-system integration tests.
///
/// Without arguments the process reads `hostmock.toml` from the working
/// directory, writing a commented starter file first if none exists.
#[derive(Debug, Parser)]
#[command(
    name = "hostmock",
    about = "Configurable mock TCP endpoints for host-system integration tests",
    version
)]
struct Cli {
    /// Path to the TOML configuration file.
    ///
    /// When the file does not exist, a commented starter config is written
    /// there and the built-in defaults serve this run.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH, env = "HOSTMOCK_CONFIG")]
    config: PathBuf,

    /// Serve a single endpoint with default behaviour on this port.
    ///
    /// The configuration file is not read in this mode; useful for quick
    /// manual checks against one acknowledging endpoint.
    #[arg(long, env = "HOSTMOCK_PORT")]
    port: Option<u16>,
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Program entry point.
///
/// # What happens at startup
///
/// 1. `tracing_subscriber` is initialised; the level is controlled by the
///    `RUST_LOG` environment variable (e.g., `RUST_LOG=debug`).
/// 2. CLI arguments are parsed with `clap` into a [`Cli`] struct.
/// 3. With `--port`, one default endpoint starts on that port.  Otherwise the
///    config file is loaded (or a starter file written) and one endpoint
///    starts per `[[endpoint]]` block.
/// 4. The process blocks until Ctrl+C, then shuts the pool down, which joins
///    every connection worker before exiting.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // `EnvFilter::try_from_default_env()` reads `RUST_LOG`; absent or invalid
    // values fall back to `info` level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let pool = ServerPool::new();

    if let Some(port) = cli.port {
        let bound = pool
            .add(port)
            .await
            .with_context(|| format!("could not start endpoint on port {port}"))?;
        info!("mock endpoint ready on port {bound}");
    } else {
        let config = config::load_or_init(&cli.config)
            .with_context(|| format!("could not load config from {}", cli.config.display()))?;

        if config.endpoints.is_empty() {
            warn!("configuration lists no endpoints; nothing to serve");
        }

        for endpoint in &config.endpoints {
            let bound = pool
                .add_endpoint(
                    endpoint.port,
                    endpoint.options()?,
                    endpoint.registry(),
                    Arc::new(LogHooks),
                )
                .await
                .with_context(|| {
                    format!("could not start endpoint on port {}", endpoint.port)
                })?;
            info!("mock endpoint ready on port {bound}");
        }
    }

    info!("hostmock running.  Press Ctrl-C to exit.");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    info!("shutdown signal received");

    pool.shutdown().await;
    info!("hostmock stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_to_standard_config_path() {
        // Arrange: parse with no arguments (all defaults apply)
        let cli = Cli::parse_from(["hostmock"]);

        // Assert
        assert_eq!(cli.config, PathBuf::from("hostmock.toml"));
    }

    #[test]
    fn test_cli_defaults_to_no_shortcut_port() {
        let cli = Cli::parse_from(["hostmock"]);
        assert_eq!(cli.port, None);
    }

    #[test]
    fn test_cli_config_override() {
        // Arrange: override --config
        let cli = Cli::parse_from(["hostmock", "--config", "/tmp/fixtures/mock.toml"]);

        // Assert
        assert_eq!(cli.config, PathBuf::from("/tmp/fixtures/mock.toml"));
    }

    #[test]
    fn test_cli_port_override() {
        let cli = Cli::parse_from(["hostmock", "--port", "6789"]);
        assert_eq!(cli.port, Some(6789));
    }

    #[test]
    fn test_cli_rejects_non_numeric_port() {
        let result = Cli::try_parse_from(["hostmock", "--port", "not-a-port"]);
        assert!(result.is_err());
    }
}
