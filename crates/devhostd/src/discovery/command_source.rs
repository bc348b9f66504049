//! Device source backed by an external enumeration command.

use std::process::Stdio;
use std::time::Duration;

use devhost_config::MAX_DEVICE_POLL_BACKOFF;
use devhost_protocol::DeviceRecord;
use futures::StreamExt;
use futures::stream;
use tokio::process::Command;
use tracing::{debug, warn};

use super::DISCOVERY_TARGET;
use super::source::{DeviceSnapshots, DeviceSource, DeviceSourceError};

/// Polls a command that prints the current devices as a JSON array.
///
/// The first poll runs immediately. Later polls wait for the configured
/// interval; consecutive failures double the wait up to a ceiling, and the
/// first success restores the base interval.
#[derive(Debug, Clone)]
pub struct CommandDeviceSource {
    command: Option<Vec<String>>,
    interval: Duration,
}

impl CommandDeviceSource {
    /// Creates a source running `command` every `interval`.
    pub fn new(command: Option<Vec<String>>, interval: Duration) -> Self {
        Self { command, interval }
    }
}

impl DeviceSource for CommandDeviceSource {
    fn track(&self) -> Result<DeviceSnapshots, DeviceSourceError> {
        let Some((program, args)) = self.command.as_deref().and_then(<[String]>::split_first)
        else {
            return Err(DeviceSourceError::NotConfigured);
        };
        let state = PollState {
            program: program.clone(),
            args: args.to_vec(),
            interval: self.interval,
            delay: Duration::ZERO,
            failures: 0,
        };
        Ok(stream::unfold(state, poll_next).boxed())
    }
}

struct PollState {
    program: String,
    args: Vec<String>,
    interval: Duration,
    delay: Duration,
    failures: u32,
}

async fn poll_next(mut state: PollState) -> Option<(Vec<DeviceRecord>, PollState)> {
    loop {
        if !state.delay.is_zero() {
            tokio::time::sleep(state.delay).await;
        }
        match enumerate(&state.program, &state.args).await {
            Ok(devices) => {
                state.failures = 0;
                state.delay = state.interval;
                return Some((devices, state));
            }
            Err(error) => {
                state.failures = state.failures.saturating_add(1);
                state.delay = backoff(state.interval, state.failures);
                warn!(
                    target: DISCOVERY_TARGET,
                    %error,
                    failures = state.failures,
                    retry_in_ms = u64::try_from(state.delay.as_millis()).unwrap_or(u64::MAX),
                    "device enumeration failed"
                );
            }
        }
    }
}

async fn enumerate(program: &str, args: &[String]) -> Result<Vec<DeviceRecord>, DeviceSourceError> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|error| DeviceSourceError::Unavailable {
            message: format!("failed to run {program}: {error}"),
        })?;
    if !output.status.success() {
        return Err(DeviceSourceError::Unavailable {
            message: format!(
                "{program} exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }
    let devices: Vec<DeviceRecord> =
        serde_json::from_slice(&output.stdout).map_err(|error| DeviceSourceError::Unavailable {
            message: format!("{program} printed an invalid device list: {error}"),
        })?;
    debug!(target: DISCOVERY_TARGET, count = devices.len(), "device snapshot");
    Ok(devices)
}

/// Wait before the next poll after `failures` consecutive failures.
fn backoff(interval: Duration, failures: u32) -> Duration {
    let ceiling = MAX_DEVICE_POLL_BACKOFF.max(interval);
    let factor = 1_u32.checked_shl(failures).unwrap_or(u32::MAX);
    interval.saturating_mul(factor).min(ceiling)
}
