//! Tracing subscriber setup for the binary.
//!
//! Library code only emits `tracing` events; installing a subscriber is the
//! binary's job and happens once, here. `RUST_LOG` wins over the configured
//! level so a single run can be made chatty without editing config.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Output shape of log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable, one line per event.
    #[default]
    Compact,
    /// JSON lines for log shippers.
    Json,
}

/// Filter for `level` unless `RUST_LOG` is set.
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_ascii_lowercase()))
}

/// Install the global subscriber. Logs go to stderr so command output on
/// stdout stays clean. A second call is a no-op.
pub fn init(level: &str, format: LogFormat) {
    let registry = tracing_subscriber::registry().with(env_filter(level));
    let result = match format {
        LogFormat::Compact => registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
    };
    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
