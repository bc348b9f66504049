//! Structured telemetry initialisation for the daemon.
//!
//! Stdout carries protocol frames, so human and machine logs go to stderr.
//! Records at or above the configured bridge level are also published on a
//! [`LogSource`] for forwarding as `daemon.logMessage` events.

use std::io::{self, IsTerminal};

use devhost_config::{BridgeLevel, Config, LogFormat};
use once_cell::sync::OnceCell;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, Layer};

use crate::log_bridge::{LogBridgeLayer, LogSource};

static TELEMETRY: OnceCell<LogSource> = OnceCell::new();

/// Handle returned when telemetry has been initialised.
#[derive(Debug, Clone)]
pub struct TelemetryHandle {
    logs: LogSource,
}

impl TelemetryHandle {
    /// Source of records forwarded to the protocol peer.
    #[must_use]
    pub fn logs(&self) -> LogSource {
        self.logs.clone()
    }
}

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Failed to parse the configured log filter expression.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// Failed to install the tracing subscriber.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(TryInitError),
}

/// Configures the global tracing subscriber when invoked for the first time.
///
/// Repeated calls are idempotent: only the first invocation installs the
/// subscriber, and every call returns a handle to the same log source.
///
/// # Errors
///
/// Returns an error when the filter expression is invalid or another global
/// subscriber is already installed.
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    TELEMETRY
        .get_or_try_init(|| install_subscriber(config))
        .map(|logs| TelemetryHandle { logs: logs.clone() })
}

fn install_subscriber(config: &Config) -> Result<LogSource, TelemetryError> {
    let filter = EnvFilter::try_new(config.log_filter())
        .map_err(|error| TelemetryError::Filter(error.to_string()))?;

    let base = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(io::stderr)
        // Avoid stray colour codes in non-TTY sinks while keeping colour on
        // interactive terminals.
        .with_ansi(io::stderr().is_terminal())
        .with_timer(UtcTime::rfc_3339());

    let stderr_layer = match config.log_format() {
        LogFormat::Json => base.json().flatten_event(true).with_filter(filter).boxed(),
        LogFormat::Compact => base.compact().with_filter(filter).boxed(),
    };

    let logs = LogSource::new();
    let bridge = LogBridgeLayer::new(logs.clone())
        .with_filter(bridge_filter(config.bridge_level()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(bridge)
        .try_init()
        .map_err(TelemetryError::Subscriber)?;
    Ok(logs)
}

/// Most verbose level forwarded over the protocol.
pub fn bridge_filter(level: BridgeLevel) -> LevelFilter {
    match level {
        BridgeLevel::Error => LevelFilter::ERROR,
        BridgeLevel::Warn => LevelFilter::WARN,
        BridgeLevel::Info => LevelFilter::INFO,
        BridgeLevel::Debug => LevelFilter::DEBUG,
        BridgeLevel::Trace => LevelFilter::TRACE,
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(BridgeLevel::Error, LevelFilter::ERROR)]
    #[case(BridgeLevel::Info, LevelFilter::INFO)]
    #[case(BridgeLevel::Trace, LevelFilter::TRACE)]
    fn maps_bridge_levels(#[case] level: BridgeLevel, #[case] expected: LevelFilter) {
        assert_eq!(bridge_filter(level), expected);
    }

    #[test]
    fn rejects_invalid_filter() {
        let config = Config {
            log_filter: "devhostd=loud".to_owned(),
            ..Config::default()
        };
        assert!(matches!(
            install_subscriber(&config),
            Err(TelemetryError::Filter(_))
        ));
    }
}
