//! Daemon services assembled from test doubles.

use std::sync::Arc;

use devhost_protocol::{DeviceRecord, Platform};
use tokio::sync::mpsc;

use crate::discovery::SharedDeviceCache;
use crate::log_bridge::LogSource;
use crate::services::DaemonServices;

use super::collaborators::{FakeAppRunner, FakeDeviceSource, FakeToolchain};
use super::reporter::RecordingHealthReporter;

/// Builds a raw device record as reported by a source.
pub fn device(id: &str, available: bool) -> DeviceRecord {
    DeviceRecord {
        id: id.to_owned(),
        name: format!("Device {id}"),
        platform: Platform::AndroidX64,
        available,
    }
}

/// Test doubles for every collaborator, kept accessible for assertions.
pub struct TestServices {
    pub runner: Arc<FakeAppRunner>,
    pub toolchain: Arc<FakeToolchain>,
    pub cache: Arc<SharedDeviceCache>,
    pub reporter: Arc<RecordingHealthReporter>,
    pub logs: LogSource,
    source: Arc<FakeDeviceSource>,
    snapshots: Option<mpsc::UnboundedSender<Vec<DeviceRecord>>>,
}

impl TestServices {
    /// Services with a default runner and a source fed by [`Self::report`].
    pub fn new() -> Self {
        Self::with_runner(FakeAppRunner::default())
    }

    /// Services using `runner`.
    pub fn with_runner(runner: FakeAppRunner) -> Self {
        let (source, snapshots) = FakeDeviceSource::new();
        Self {
            runner: Arc::new(runner),
            toolchain: Arc::new(FakeToolchain::default()),
            cache: Arc::new(SharedDeviceCache::new()),
            reporter: Arc::new(RecordingHealthReporter::default()),
            logs: LogSource::new(),
            source: Arc::new(source),
            snapshots: Some(snapshots),
        }
    }

    /// Services whose device source cannot start.
    pub fn without_device_source() -> Self {
        Self {
            source: Arc::new(FakeDeviceSource::unavailable()),
            snapshots: None,
            ..Self::new()
        }
    }

    /// Replaces the toolchain.
    #[must_use]
    pub fn with_toolchain(mut self, toolchain: FakeToolchain) -> Self {
        self.toolchain = Arc::new(toolchain);
        self
    }

    /// Pushes one snapshot to the device source.
    pub fn report(&self, devices: Vec<DeviceRecord>) {
        self.snapshots
            .as_ref()
            .expect("device source is available")
            .send(devices)
            .expect("discovery engine is tracking");
    }

    /// Collaborators as handed to the daemon.
    pub fn daemon_services(&self) -> DaemonServices {
        DaemonServices {
            toolchain: self.toolchain.clone(),
            runner: self.runner.clone(),
            devices: self.source.clone(),
            cache: self.cache.clone(),
            logs: self.logs.clone(),
            reporter: self.reporter.clone(),
        }
    }
}
