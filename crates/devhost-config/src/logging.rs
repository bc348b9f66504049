use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Supported logging output formats.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// Structured JSON suitable for ingestion by logging stacks.
    #[default]
    Json,
    /// Human-readable single line output.
    Compact,
}

/// Minimum severity forwarded to the client as `daemon.logMessage` events.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum BridgeLevel {
    /// Forward errors only.
    Error,
    /// Forward warnings and errors.
    Warn,
    /// Forward informational records and above.
    #[default]
    Info,
    /// Forward debug records and above.
    Debug,
    /// Forward everything.
    Trace,
}

/// Errors encountered while parsing a [`LogFormat`] or [`BridgeLevel`] from
/// text.
pub type LogFormatParseError = strum::ParseError;
