//! Development host daemon.
//!
//! `devhostd` speaks a framed JSON protocol over stdin and stdout with a
//! single client, typically an editor or IDE plugin. Requests name a method
//! in `<domain>.<command>` form; the [`dispatch`] layer routes them to the
//! `daemon`, `app` or `device` domain, runs each handler as its own task, and
//! writes one response per request alongside unsolicited events.
//!
//! Device discovery runs in the background for the daemon's whole lifetime.
//! The [`discovery`] engine polls a [`DeviceSource`], reconciles each snapshot
//! against the known devices, and emits `device.added`, `device.changed` and
//! `device.removed` events as the set changes.
//!
//! Everything outside the protocol is reached through narrow traits so tests
//! can substitute it: the [`Toolchain`] that provisions an SDK, the
//! [`AppRunner`] that launches applications, and the [`DeviceSource`] and
//! [`DeviceCache`] used by discovery. Logging goes to stderr; records at or
//! above the configured bridge level are also forwarded to the client as
//! `daemon.logMessage` events.

mod bootstrap;
pub mod discovery;
pub mod dispatch;
mod domains;
mod health;
mod log_bridge;
mod process;
mod runner;
mod services;
mod telemetry;
mod toolchain;

pub use bootstrap::{
    Bootstrap, BootstrapError, ConfigLoader, StaticConfigLoader, SystemConfigLoader,
    bootstrap_with,
};
pub use discovery::{DeviceCache, DeviceSource};
pub use domains::ShutdownRequester;
pub use health::{HealthReporter, StructuredHealthReporter};
pub use log_bridge::{LOG_BUFFER, LogBridgeLayer, LogSource, bridge_level};
pub use process::{LaunchError, report_launch_failure, run_daemon};
pub use runner::{AppRunner, LaunchOptions, ProcessAppRunner, RunnerError, STARTUP_GRACE};
pub use services::DaemonServices;
pub use telemetry::{TelemetryError, TelemetryHandle, bridge_filter};
pub use toolchain::{LocalToolchain, PackageRef, Toolchain, ToolchainError, ToolchainHandle};

#[cfg(test)]
mod tests;
