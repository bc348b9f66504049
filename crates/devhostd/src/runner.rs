//! Application launch on devices.

use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::discovery::Device;
use crate::toolchain::{PackageRef, ToolchainHandle};

/// Tracing target for runner operations.
pub(crate) const RUNNER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::runner");

/// How long a freshly launched process must survive to count as started.
pub const STARTUP_GRACE: Duration = Duration::from_millis(500);

/// Exit status reported for a process terminated by a signal.
const SIGNALLED: i32 = -1;

/// Errors raised while launching or stopping applications.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// No launch command is configured.
    #[error("app runner is not configured; set --launch-command or DEVHOST_LAUNCH_COMMAND")]
    NotConfigured,
    /// The launch command could not be spawned.
    #[error("failed to launch {program}: {source}")]
    Spawn {
        /// Launch program.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// A launched process could not be inspected or stopped.
    #[error("failed to manage app process: {0}")]
    Process(#[from] io::Error),
}

/// Launch settings taken from `app.start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
    /// Project to launch.
    pub project_directory: PathBuf,
    /// Entry point within the project.
    pub target: Option<String>,
    /// Initial route.
    pub route: Option<String>,
    /// Whether to run in checked mode.
    pub checked: bool,
}

/// Starts and stops applications on devices.
#[async_trait]
pub trait AppRunner: Send + Sync {
    /// Starts `packages` on every device.
    ///
    /// Returns the runner's exit code; zero means every launch succeeded.
    async fn start(
        &self,
        devices: &[Device],
        packages: &[PackageRef],
        toolchain: &ToolchainHandle,
        options: &LaunchOptions,
    ) -> Result<i32, RunnerError>;

    /// Stops `packages` on every device.
    ///
    /// Returns `true` if anything was stopped.
    async fn stop_all(
        &self,
        devices: &[Device],
        packages: &[PackageRef],
    ) -> Result<bool, RunnerError>;
}

struct Launched {
    device: String,
    package: String,
    child: Child,
}

/// Runner that spawns a configured launch command per device and package.
///
/// Each process receives the project directory, device id, package name,
/// target, route and checked mode as arguments and the toolchain root in
/// `DEVHOST_SDK_ROOT`. Processes still running after [`STARTUP_GRACE`] are
/// tracked until [`AppRunner::stop_all`].
pub struct ProcessAppRunner {
    command: Option<Vec<String>>,
    launched: Mutex<Vec<Launched>>,
}

impl ProcessAppRunner {
    /// Creates a runner using `command` as the launch program and its
    /// leading arguments.
    pub fn new(command: Option<Vec<String>>) -> Self {
        Self {
            command,
            launched: Mutex::new(Vec::new()),
        }
    }
}

#[cfg(test)]
impl ProcessAppRunner {
    async fn tracked(&self) -> usize {
        self.launched.lock().await.len()
    }
}

impl std::fmt::Debug for ProcessAppRunner {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ProcessAppRunner")
            .field("command", &self.command)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AppRunner for ProcessAppRunner {
    async fn start(
        &self,
        devices: &[Device],
        packages: &[PackageRef],
        toolchain: &ToolchainHandle,
        options: &LaunchOptions,
    ) -> Result<i32, RunnerError> {
        let Some((program, base_args)) = self.command.as_deref().and_then(<[String]>::split_first)
        else {
            return Err(RunnerError::NotConfigured);
        };
        if devices.is_empty() {
            info!(target: RUNNER_TARGET, "no devices available; nothing to start");
            return Ok(0);
        }

        let mut started = Vec::with_capacity(devices.len().saturating_mul(packages.len()));
        for device in devices {
            for package in packages {
                let child = Command::new(program)
                    .args(base_args)
                    .args(launch_args(device, package, options))
                    .env("DEVHOST_SDK_ROOT", toolchain.root())
                    .stdin(Stdio::null())
                    .stdout(Stdio::null())
                    .kill_on_drop(true)
                    .spawn()
                    .map_err(|source| RunnerError::Spawn {
                        program: program.clone(),
                        source,
                    })?;
                debug!(
                    target: RUNNER_TARGET,
                    device = device.id(),
                    package = package.name.as_str(),
                    pid = ?child.id(),
                    "app launched"
                );
                started.push(Launched {
                    device: device.id().to_owned(),
                    package: package.name.clone(),
                    child,
                });
            }
        }

        tokio::time::sleep(STARTUP_GRACE).await;

        let mut exit_code = 0;
        let mut running = Vec::with_capacity(started.len());
        for mut launched in started {
            match launched.child.try_wait()? {
                None => running.push(launched),
                Some(status) if status.success() => {}
                Some(status) => {
                    let code = status.code().unwrap_or(SIGNALLED);
                    warn!(
                        target: RUNNER_TARGET,
                        device = launched.device.as_str(),
                        package = launched.package.as_str(),
                        code,
                        "app exited during startup"
                    );
                    if exit_code == 0 {
                        exit_code = code;
                    }
                }
            }
        }
        let mut launched = self.launched.lock().await;
        prune_exited(&mut launched);
        launched.extend(running);
        Ok(exit_code)
    }

    async fn stop_all(
        &self,
        devices: &[Device],
        packages: &[PackageRef],
    ) -> Result<bool, RunnerError> {
        let targets: Vec<Launched> = {
            let mut launched = self.launched.lock().await;
            let (targets, kept) = launched.drain(..).partition(|entry| {
                packages.iter().any(|package| package.name == entry.package)
                    && devices.iter().any(|device| device.id() == entry.device)
            });
            *launched = kept;
            targets
        };

        let stopped = !targets.is_empty();
        for mut entry in targets {
            if entry.child.try_wait()?.is_none() {
                entry.child.kill().await?;
            }
            debug!(
                target: RUNNER_TARGET,
                device = entry.device.as_str(),
                package = entry.package.as_str(),
                "app stopped"
            );
        }
        Ok(stopped)
    }
}

/// Drops tracked processes that have already exited.
fn prune_exited(launched: &mut Vec<Launched>) {
    launched.retain_mut(|entry| match entry.child.try_wait() {
        Ok(Some(status)) => {
            debug!(
                target: RUNNER_TARGET,
                device = entry.device.as_str(),
                package = entry.package.as_str(),
                %status,
                "app no longer running"
            );
            false
        }
        Ok(None) | Err(_) => true,
    });
}

fn launch_args(device: &Device, package: &PackageRef, options: &LaunchOptions) -> Vec<String> {
    let mut args = vec![
        String::from("--project-directory"),
        options.project_directory.display().to_string(),
        String::from("--device-id"),
        device.id().to_owned(),
        String::from("--package"),
        package.name.clone(),
    ];
    if let Some(target) = &options.target {
        args.extend([String::from("--target"), target.clone()]);
    }
    if let Some(route) = &options.route {
        args.extend([String::from("--route"), route.clone()]);
    }
    args.push(String::from(if options.checked {
        "--checked"
    } else {
        "--no-checked"
    }));
    args
}

#[cfg(test)]
mod tests {
    use devhost_protocol::Platform;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    use super::*;

    fn shell(script: &str) -> Option<Vec<String>> {
        Some(vec![
            "sh".to_owned(),
            "-c".to_owned(),
            script.to_owned(),
            "launch".to_owned(),
        ])
    }

    #[fixture]
    fn project() -> TempDir {
        TempDir::new().expect("temp dir")
    }

    fn options(project: &TempDir) -> LaunchOptions {
        LaunchOptions {
            project_directory: project.path().to_path_buf(),
            target: Some("lib/main.dart".to_owned()),
            route: None,
            checked: true,
        }
    }

    fn package(project: &TempDir) -> PackageRef {
        PackageRef {
            name: "demo".to_owned(),
            project_directory: project.path().to_path_buf(),
        }
    }

    fn devices() -> Vec<Device> {
        vec![Device::new("emulator-5554", "Pixel", Platform::AndroidX64, true)]
    }

    #[test]
    fn launch_arguments_describe_the_launch() {
        let project = TempDir::new().expect("temp dir");
        let device = Device::new("d1", "D", Platform::Ios, true);
        let args = launch_args(&device, &package(&project), &options(&project));
        assert!(args.windows(2).any(|pair| pair == ["--device-id", "d1"]));
        assert!(args.windows(2).any(|pair| pair == ["--target", "lib/main.dart"]));
        assert!(!args.iter().any(|arg| arg == "--route"));
        assert_eq!(args.last().map(String::as_str), Some("--checked"));
    }

    #[rstest]
    #[tokio::test]
    async fn unconfigured_runner_refuses_to_start(project: TempDir) {
        let runner = ProcessAppRunner::new(None);
        let error = runner
            .start(
                &devices(),
                &[package(&project)],
                &ToolchainHandle::new(project.path()),
                &options(&project),
            )
            .await
            .expect_err("not configured");
        assert!(matches!(error, RunnerError::NotConfigured));
    }

    #[rstest]
    #[tokio::test]
    async fn early_failure_reports_exit_code(project: TempDir) {
        let runner = ProcessAppRunner::new(shell("exit 3"));
        let code = runner
            .start(
                &devices(),
                &[package(&project)],
                &ToolchainHandle::new(project.path()),
                &options(&project),
            )
            .await
            .expect("start");
        assert_eq!(code, 3);
        assert!(!runner.stop_all(&devices(), &[package(&project)]).await.expect("stop"));
    }

    #[rstest]
    #[tokio::test]
    async fn running_apps_are_stopped_once(project: TempDir) {
        let runner = ProcessAppRunner::new(shell("sleep 30"));
        let code = runner
            .start(
                &devices(),
                &[package(&project)],
                &ToolchainHandle::new(project.path()),
                &options(&project),
            )
            .await
            .expect("start");
        assert_eq!(code, 0);
        assert!(runner.stop_all(&devices(), &[package(&project)]).await.expect("stop"));
        assert!(!runner.stop_all(&devices(), &[package(&project)]).await.expect("stop"));
    }

    #[rstest]
    #[tokio::test]
    async fn exited_apps_are_pruned_on_next_start(project: TempDir) {
        let runner = ProcessAppRunner::new(shell("sleep 1"));
        let toolchain = ToolchainHandle::new(project.path());
        let first = PackageRef {
            name: "first".to_owned(),
            project_directory: project.path().to_path_buf(),
        };
        runner
            .start(&devices(), &[first], &toolchain, &options(&project))
            .await
            .expect("first start");
        assert_eq!(runner.tracked().await, 1);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        runner
            .start(&devices(), &[package(&project)], &toolchain, &options(&project))
            .await
            .expect("second start");

        assert_eq!(runner.tracked().await, 1);
        assert!(runner.stop_all(&devices(), &[package(&project)]).await.expect("stop"));
        assert_eq!(runner.tracked().await, 0);
    }
}
