//! Shared configuration for the devhost daemon.
//!
//! Settings resolve with the usual precedence: command-line flags override
//! `DEVHOST_*` environment variables, which override the built-in defaults.
//! The daemon only ever writes protocol frames to stdout, so every logging
//! option here concerns stderr or the `daemon.logMessage` bridge.

mod defaults;
mod logging;

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use thiserror::Error;

pub use defaults::{
    DEFAULT_DEVICE_POLL_INTERVAL_MS, DEFAULT_LOG_FILTER, MAX_DEVICE_POLL_BACKOFF,
    default_bridge_level, default_log_filter, default_log_format,
};
pub use logging::{BridgeLevel, LogFormat, LogFormatParseError};

/// Errors raised while resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Command-line or environment input was rejected.
    #[error(transparent)]
    Cli(#[from] clap::Error),
    /// The poll interval must be positive.
    #[error("device poll interval must be greater than zero")]
    ZeroPollInterval,
}

impl ConfigError {
    /// Returns the underlying `clap` error when the failure came from argument
    /// parsing, so callers can let `clap` render help and usage output.
    pub fn as_cli(&self) -> Option<&clap::Error> {
        match self {
            Self::Cli(error) => Some(error),
            Self::ZeroPollInterval => None,
        }
    }
}

/// Resolved daemon configuration.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(
    name = "devhostd",
    version,
    about = "Development host daemon speaking a framed JSON protocol over stdio"
)]
pub struct Config {
    /// Tracing filter expression for stderr logging.
    #[arg(long, env = "DEVHOST_LOG_FILTER", default_value = DEFAULT_LOG_FILTER)]
    pub log_filter: String,
    /// Output format for stderr logging (`json` or `compact`).
    #[arg(long, env = "DEVHOST_LOG_FORMAT", default_value_t = LogFormat::Json)]
    pub log_format: LogFormat,
    /// Minimum level forwarded to the client as `daemon.logMessage`.
    #[arg(long, env = "DEVHOST_BRIDGE_LEVEL", default_value_t = BridgeLevel::Info)]
    pub bridge_level: BridgeLevel,
    /// Command printing the current device list as a JSON array.
    #[arg(long, env = "DEVHOST_DEVICE_COMMAND")]
    pub device_command: Option<String>,
    /// Interval between device enumeration polls, in milliseconds.
    #[arg(
        long,
        env = "DEVHOST_DEVICE_POLL_INTERVAL_MS",
        default_value_t = DEFAULT_DEVICE_POLL_INTERVAL_MS
    )]
    pub device_poll_interval_ms: u64,
    /// Command used to launch an application on a device.
    #[arg(long, env = "DEVHOST_LAUNCH_COMMAND")]
    pub launch_command: Option<String>,
    /// Root directory of the provisioned toolchain.
    #[arg(long, env = "DEVHOST_SDK_ROOT")]
    pub sdk_root: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter().to_owned(),
            log_format: default_log_format(),
            bridge_level: default_bridge_level(),
            device_command: None,
            device_poll_interval_ms: DEFAULT_DEVICE_POLL_INTERVAL_MS,
            launch_command: None,
            sdk_root: None,
        }
    }
}

impl Config {
    /// Loads configuration from the process arguments and environment.
    ///
    /// # Errors
    ///
    /// Returns an error when arguments or environment values are invalid.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_iter(std::env::args_os())
    }

    /// Loads configuration from an explicit argument list.
    ///
    /// The first element is the program name, matching `std::env::args_os`.
    ///
    /// # Errors
    ///
    /// Returns an error when arguments or environment values are invalid.
    pub fn load_from_iter<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let config = Self::try_parse_from(args)?;
        if config.device_poll_interval_ms == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        Ok(config)
    }

    /// Tracing filter expression.
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Logging output format.
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Minimum level forwarded over the protocol.
    pub fn bridge_level(&self) -> BridgeLevel {
        self.bridge_level
    }

    /// Device enumeration command split into program and arguments.
    pub fn device_command(&self) -> Option<Vec<String>> {
        split_command(self.device_command.as_deref())
    }

    /// Interval between device enumeration polls.
    pub fn device_poll_interval(&self) -> Duration {
        Duration::from_millis(self.device_poll_interval_ms)
    }

    /// Application launch command split into program and arguments.
    pub fn launch_command(&self) -> Option<Vec<String>> {
        split_command(self.launch_command.as_deref())
    }

    /// Toolchain root directory, if configured.
    pub fn sdk_root(&self) -> Option<&Path> {
        self.sdk_root.as_deref()
    }
}

fn split_command(raw: Option<&str>) -> Option<Vec<String>> {
    let parts: Vec<String> = raw?.split_whitespace().map(str::to_owned).collect();
    if parts.is_empty() { None } else { Some(parts) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_commands_on_whitespace() {
        let config = Config {
            device_command: Some("  adb   devices --json ".to_owned()),
            ..Config::default()
        };
        assert_eq!(
            config.device_command(),
            Some(vec![
                "adb".to_owned(),
                "devices".to_owned(),
                "--json".to_owned()
            ])
        );
    }

    #[test]
    fn blank_command_is_unset() {
        let config = Config {
            launch_command: Some("   ".to_owned()),
            ..Config::default()
        };
        assert!(config.launch_command().is_none());
    }

    #[test]
    fn rejects_zero_poll_interval() {
        let error = Config::load_from_iter(["devhostd", "--device-poll-interval-ms", "0"])
            .expect_err("zero interval should fail");
        assert!(matches!(error, ConfigError::ZeroPollInterval));
    }
}
