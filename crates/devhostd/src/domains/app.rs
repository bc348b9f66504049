//! `app` domain: launching and stopping applications on known devices.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::discovery::{DeviceCache, DeviceDirectory};
use crate::dispatch::{CommandError, CommandResult, Domain, DomainName, Outbound, to_payload};
use crate::runner::{AppRunner, LaunchOptions, RUNNER_TARGET};
use crate::services::DaemonServices;
use crate::toolchain::{PackageRef, Toolchain};

/// Parameters of `app.start`. Names are accepted in camelCase or snake_case.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartParams {
    #[serde(alias = "project_directory")]
    project_directory: PathBuf,
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    route: Option<String>,
    #[serde(default = "checked_by_default")]
    checked: bool,
}

const fn checked_by_default() -> bool {
    true
}

impl StartParams {
    fn parse(params: Option<Value>) -> Result<Self, CommandError> {
        let params = params.ok_or_else(|| {
            CommandError::invalid_params("missing required parameter: projectDirectory")
        })?;
        serde_json::from_value(params).map_err(|error| CommandError::invalid_params(error.to_string()))
    }

    fn into_options(self) -> LaunchOptions {
        LaunchOptions {
            project_directory: self.project_directory,
            target: self.target,
            route: self.route,
            checked: self.checked,
        }
    }
}

struct AppCommands {
    toolchain: Arc<dyn Toolchain>,
    runner: Arc<dyn AppRunner>,
    cache: Arc<dyn DeviceCache>,
    devices: DeviceDirectory,
    last_packages: Mutex<Vec<PackageRef>>,
}

impl AppCommands {
    async fn start(&self, params: Option<Value>) -> CommandResult {
        let options = StartParams::parse(params)?.into_options();
        let project = options.project_directory.clone();
        let is_dir = tokio::fs::metadata(&project)
            .await
            .is_ok_and(|metadata| metadata.is_dir());
        if !is_dir {
            return Err(CommandError::InvalidProjectDirectory { path: project });
        }

        let toolchain = self.toolchain.download().await?;
        let packages = self.toolchain.resolve_packages(&project).await?;
        let devices = self.devices.devices();
        let code = self
            .runner
            .start(&devices, &packages, &toolchain, &options)
            .await?;

        if code != 0 {
            return Err(CommandError::AppExited { code });
        }
        *self
            .last_packages
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = packages;
        for device in &devices {
            self.cache.remember(device.id());
        }
        info!(
            target: RUNNER_TARGET,
            project = %project.display(),
            devices = devices.len(),
            "app started"
        );
        Ok(None)
    }

    async fn stop_all(&self) -> CommandResult {
        let packages = self
            .last_packages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let devices = self.devices.devices();
        let stopped = self.runner.stop_all(&devices, &packages).await?;
        to_payload(&stopped)
    }
}

/// Builds the `app` domain over the devices in `devices`.
pub(crate) fn build(outbound: Outbound, services: &DaemonServices, devices: DeviceDirectory) -> Domain {
    let commands = Arc::new(AppCommands {
        toolchain: Arc::clone(&services.toolchain),
        runner: Arc::clone(&services.runner),
        cache: Arc::clone(&services.cache),
        devices,
        last_packages: Mutex::new(Vec::new()),
    });

    let mut domain = Domain::new(DomainName::App, outbound);
    let start = Arc::clone(&commands);
    domain.register_handler("start", move |params| {
        let commands = Arc::clone(&start);
        async move { commands.start(params).await }
    });
    domain.register_handler("stopAll", move |_| {
        let commands = Arc::clone(&commands);
        async move { commands.stop_all().await }
    });
    domain
}
