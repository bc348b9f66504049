use std::time::Duration;

use crate::logging::{BridgeLevel, LogFormat};

/// Default log filter expression used by the daemon.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default interval between device enumeration polls, in milliseconds.
pub const DEFAULT_DEVICE_POLL_INTERVAL_MS: u64 = 2_000;

/// Upper bound on the device poll backoff after repeated failures.
pub const MAX_DEVICE_POLL_BACKOFF: Duration = Duration::from_secs(30);

/// Default log filter expression used by the daemon.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Default logging format for the daemon.
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default minimum level forwarded to the client.
pub fn default_bridge_level() -> BridgeLevel {
    BridgeLevel::Info
}
