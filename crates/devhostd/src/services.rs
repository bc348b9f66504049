//! External collaborators injected into the daemon.

use std::path::Path;
use std::sync::Arc;

use devhost_config::Config;

use crate::discovery::{CommandDeviceSource, DeviceCache, DeviceSource, SharedDeviceCache};
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::log_bridge::LogSource;
use crate::runner::{AppRunner, ProcessAppRunner};
use crate::toolchain::{LocalToolchain, Toolchain};

/// Everything the daemon's domains depend on beyond the protocol itself.
#[derive(Clone)]
pub struct DaemonServices {
    /// Toolchain used by `app.start`.
    pub toolchain: Arc<dyn Toolchain>,
    /// Launches and stops applications.
    pub runner: Arc<dyn AppRunner>,
    /// Produces device snapshots for discovery.
    pub devices: Arc<dyn DeviceSource>,
    /// Per-device cache evicted when a device disappears.
    pub cache: Arc<dyn DeviceCache>,
    /// Records forwarded as `daemon.logMessage`.
    pub logs: LogSource,
    /// Lifecycle observer.
    pub reporter: Arc<dyn HealthReporter>,
}

impl DaemonServices {
    /// Builds the default collaborators from configuration.
    pub fn from_config(config: &Config, logs: LogSource) -> Self {
        Self {
            toolchain: Arc::new(LocalToolchain::new(config.sdk_root().map(Path::to_path_buf))),
            runner: Arc::new(ProcessAppRunner::new(config.launch_command())),
            devices: Arc::new(CommandDeviceSource::new(
                config.device_command(),
                config.device_poll_interval(),
            )),
            cache: Arc::new(SharedDeviceCache::new()),
            logs,
            reporter: Arc::new(StructuredHealthReporter::new()),
        }
    }
}

impl std::fmt::Debug for DaemonServices {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("DaemonServices")
            .field("logs", &self.logs)
            .finish_non_exhaustive()
    }
}
