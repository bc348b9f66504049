//! Payload of `daemon.logMessage` events.

use serde::Serialize;

/// Severity reported to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Failures.
    Error,
    /// Recoverable problems.
    Warning,
    /// Progress and status information.
    Status,
    /// Verbose diagnostics.
    Trace,
}

/// One forwarded log record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogMessage {
    /// Record severity.
    pub level: LogLevel,
    /// Rendered message text.
    pub message: String,
    /// Optional stack trace captured alongside the record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
}
