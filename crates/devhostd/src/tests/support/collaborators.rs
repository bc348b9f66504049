//! Scriptable stand-ins for the daemon's external collaborators.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use devhost_protocol::DeviceRecord;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::discovery::{Device, DeviceSnapshots, DeviceSource, DeviceSourceError};
use crate::runner::{AppRunner, LaunchOptions, RunnerError};
use crate::toolchain::{PackageRef, Toolchain, ToolchainError, ToolchainHandle};

/// Device source fed by the test through a channel.
#[derive(Debug)]
pub struct FakeDeviceSource {
    snapshots: Mutex<Option<mpsc::UnboundedReceiver<Vec<DeviceRecord>>>>,
}

impl FakeDeviceSource {
    /// Creates a source and the sender used to push snapshots.
    pub fn new() -> (Self, mpsc::UnboundedSender<Vec<DeviceRecord>>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                snapshots: Mutex::new(Some(receiver)),
            },
            sender,
        )
    }

    /// Creates a source that refuses to start tracking.
    pub fn unavailable() -> Self {
        Self {
            snapshots: Mutex::new(None),
        }
    }
}

impl DeviceSource for FakeDeviceSource {
    fn track(&self) -> Result<DeviceSnapshots, DeviceSourceError> {
        let receiver = self
            .snapshots
            .lock()
            .expect("device source mutex poisoned")
            .take()
            .ok_or(DeviceSourceError::NotConfigured)?;
        Ok(UnboundedReceiverStream::new(receiver).boxed())
    }
}

/// Toolchain that succeeds without touching the filesystem, or always fails.
#[derive(Debug, Default)]
pub struct FakeToolchain {
    fail: bool,
}

impl FakeToolchain {
    /// Creates a toolchain whose download always fails.
    pub fn failing() -> Self {
        Self { fail: true }
    }
}

#[async_trait]
impl Toolchain for FakeToolchain {
    async fn download(&self) -> Result<ToolchainHandle, ToolchainError> {
        if self.fail {
            return Err(ToolchainError::NotConfigured);
        }
        Ok(ToolchainHandle::new("/opt/devhost-sdk"))
    }

    async fn resolve_packages(
        &self,
        project_directory: &std::path::Path,
    ) -> Result<Vec<PackageRef>, ToolchainError> {
        Ok(vec![PackageRef {
            name: "app".to_owned(),
            project_directory: project_directory.to_path_buf(),
        }])
    }
}

/// Arguments recorded for one `start` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartCall {
    pub devices: Vec<String>,
    pub packages: Vec<String>,
    pub options: LaunchOptions,
}

/// Runner with scripted latency and outcome that records its calls.
#[derive(Debug, Default)]
pub struct FakeAppRunner {
    delay: Duration,
    exit_code: i32,
    panics: bool,
    starts: Mutex<Vec<StartCall>>,
    stops: Mutex<Vec<Vec<String>>>,
}

impl FakeAppRunner {
    /// Delays every start by `delay`.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Makes every start report `code`.
    #[must_use]
    pub fn exiting_with(mut self, code: i32) -> Self {
        self.exit_code = code;
        self
    }

    /// Makes every start panic.
    #[must_use]
    pub fn panicking(mut self) -> Self {
        self.panics = true;
        self
    }

    /// Recorded start calls.
    pub fn starts(&self) -> Vec<StartCall> {
        self.starts.lock().expect("runner mutex poisoned").clone()
    }

    /// Package names passed to each `stop_all` call.
    pub fn stops(&self) -> Vec<Vec<String>> {
        self.stops.lock().expect("runner mutex poisoned").clone()
    }
}

#[async_trait]
impl AppRunner for FakeAppRunner {
    async fn start(
        &self,
        devices: &[Device],
        packages: &[PackageRef],
        _toolchain: &ToolchainHandle,
        options: &LaunchOptions,
    ) -> Result<i32, RunnerError> {
        self.starts
            .lock()
            .expect("runner mutex poisoned")
            .push(StartCall {
                devices: devices.iter().map(|device| device.id().to_owned()).collect(),
                packages: packages.iter().map(|package| package.name.clone()).collect(),
                options: options.clone(),
            });
        assert!(!self.panics, "runner exploded");
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.exit_code)
    }

    async fn stop_all(
        &self,
        _devices: &[Device],
        packages: &[PackageRef],
    ) -> Result<bool, RunnerError> {
        self.stops
            .lock()
            .expect("runner mutex poisoned")
            .push(packages.iter().map(|package| package.name.clone()).collect());
        Ok(!packages.is_empty())
    }
}
