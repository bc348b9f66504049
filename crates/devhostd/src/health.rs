//! Structured health reporting for daemon lifecycle events.

use std::sync::Arc;

use devhost_config::Config;

use crate::bootstrap::BootstrapError;
use crate::discovery::DeviceSourceError;

/// Tracing target for lifecycle events.
pub(crate) const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked when device tracking cannot start.
    fn device_source_unavailable(&self, error: &DeviceSourceError);

    /// Invoked once the daemon has stopped serving.
    fn daemon_stopped(&self, status: i32);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn device_source_unavailable(&self, error: &DeviceSourceError) {
        (**self).device_source_unavailable(error);
    }

    fn daemon_stopped(&self, status: i32) {
        (**self).daemon_stopped(status);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting daemon bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            log_filter = %config.log_filter(),
            log_format = %config.log_format(),
            bridge_level = %config.bridge_level(),
            device_poll_interval_ms = config.device_poll_interval_ms,
            "daemon bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "daemon bootstrap failed"
        );
    }

    fn device_source_unavailable(&self, error: &DeviceSourceError) {
        tracing::warn!(
            target: HEALTH_TARGET,
            event = "device_source_unavailable",
            error = %error,
            "device discovery disabled"
        );
    }

    fn daemon_stopped(&self, status: i32) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "daemon_stopped",
            status,
            "daemon stopped"
        );
    }
}
