//! Structured logging using **tracing**.
//!
//! Library code only emits events (`tracing::{debug, info, warn, error}`);
//! installing a subscriber is left to the binaries. Everything goes to
//! stderr so stdout stays free for reports and the LSP transport.

use tracing_subscriber::EnvFilter;

/// Output shape of the global subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Machine-readable JSON lines
    #[default]
    Json,
    /// Compact human-readable lines
    Compact,
}

/// Initializes the global tracing collector (subscriber).
///
/// Call once at the start of a binary. Repeated calls are ignored.
///
/// # Environment Variables
/// - `RUST_LOG`: Controls log filtering (e.g., `RUST_LOG=deprecss_core=debug`),
///   defaults to `info`.
pub fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let result = match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_ansi(false)
            .with_level(true)
            .with_target(true)
            .with_current_span(true)
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
        LogFormat::Compact => tracing_subscriber::fmt()
            .compact()
            .with_ansi(false)
            .with_target(false)
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
    };

    if let Err(e) = result {
        tracing::debug!(error = %e, "tracing subscriber already installed");
    }
}
