//! Error types for routing and command execution.
//!
//! Routing failures describe requests that never reached a handler. Command
//! failures are raised by handlers. Both are reported to the client as the
//! `error` string of the request's response and never terminate the daemon.

use std::path::PathBuf;

use thiserror::Error;

use crate::runner::RunnerError;
use crate::toolchain::ToolchainError;

/// Errors raised while routing a request to its handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// The method has no `<domain>.` prefix.
    #[error("method not understood: {method}")]
    MethodNotUnderstood { method: String },

    /// The method prefix names no registered domain.
    #[error("no domain for method: {method}")]
    UnknownDomain { method: String },

    /// The domain has no handler for the command.
    #[error("command not understood: {domain}.{command}")]
    UnknownCommand { domain: String, command: String },
}

impl DispatchError {
    /// Creates a method-not-understood error.
    pub fn method_not_understood(method: impl Into<String>) -> Self {
        Self::MethodNotUnderstood {
            method: method.into(),
        }
    }

    /// Creates an unknown domain error.
    pub fn unknown_domain(method: impl Into<String>) -> Self {
        Self::UnknownDomain {
            method: method.into(),
        }
    }

    /// Creates an unknown command error.
    pub fn unknown_command(domain: impl Into<String>, command: impl Into<String>) -> Self {
        Self::UnknownCommand {
            domain: domain.into(),
            command: command.into(),
        }
    }
}

/// Errors raised while executing a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Routing failed inside the domain.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// Parameters are missing or have the wrong shape.
    #[error("invalid params: {message}")]
    InvalidParams { message: String },

    /// The project directory does not exist.
    #[error("project directory does not exist: {}", path.display())]
    InvalidProjectDirectory { path: PathBuf },

    /// Provisioning the toolchain failed.
    #[error(transparent)]
    Toolchain(#[from] ToolchainError),

    /// The application runner failed.
    #[error(transparent)]
    Runner(#[from] RunnerError),

    /// The application exited with a non-zero status.
    #[error("app exited with code {code}")]
    AppExited { code: i32 },

    /// The handler result could not be serialised.
    #[error("failed to serialise result: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The handler panicked.
    #[error("handler panicked: {message}")]
    Panicked { message: String },
}

impl CommandError {
    /// Creates an invalid params error.
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams {
            message: message.into(),
        }
    }
}
