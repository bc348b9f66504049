//! Process entry: bootstrap, runtime construction and the stdio loop.

use std::io::{self, Write};
use std::sync::Arc;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::SplitStream;
use tracing::info;

use crate::bootstrap::{BootstrapError, ConfigLoader, SystemConfigLoader, bootstrap_with};
use crate::dispatch::{Daemon, OutboundWriter, WriterError};
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::services::DaemonServices;

const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");

/// Errors surfaced while launching or running the daemon process.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Configuration or telemetry failed.
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
    /// The async runtime could not be built.
    #[error("failed to build runtime: {source}")]
    Runtime {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Flushing protocol output failed.
    #[error(transparent)]
    Writer(#[from] WriterError),
}

impl LaunchError {
    /// Returns the argument parsing error, if that is what failed.
    #[must_use]
    pub fn as_cli(&self) -> Option<&clap::Error> {
        match self {
            Self::Bootstrap(error) => error.as_cli(),
            Self::Runtime { .. } | Self::Writer(_) => None,
        }
    }
}

/// Writes a one-line report of a launch failure to `out`.
///
/// # Errors
///
/// Returns an error when `out` cannot be written.
pub fn report_launch_failure<W: Write>(out: &mut W, error: &LaunchError) -> io::Result<()> {
    writeln!(out, "{}: {error}", env!("CARGO_PKG_NAME"))
}

/// Runs the daemon over stdin and stdout with the production collaborators.
///
/// Returns the exit status resolved by the daemon.
///
/// # Errors
///
/// Returns an error when bootstrap fails, the runtime cannot be built, or
/// buffered output cannot be flushed.
pub fn run_daemon() -> Result<i32, LaunchError> {
    let reporter: Arc<dyn HealthReporter> = Arc::new(StructuredHealthReporter::new());
    run_daemon_with(&SystemConfigLoader, &reporter)
}

/// Runs the daemon with an injected configuration loader and reporter.
pub(crate) fn run_daemon_with(
    loader: &dyn ConfigLoader,
    reporter: &Arc<dyn HealthReporter>,
) -> Result<i32, LaunchError> {
    let bootstrap = bootstrap_with(loader, reporter)?;
    let mut services = DaemonServices::from_config(bootstrap.config(), bootstrap.telemetry().logs());
    services.reporter = Arc::clone(reporter);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|source| LaunchError::Runtime { source })?;

    let result = runtime.block_on(async {
        let (outbound, writer) = OutboundWriter::spawn(tokio::io::stdout());
        let mut daemon = Daemon::new(&services, outbound);
        info!(target: PROCESS_TARGET, pid = std::process::id(), "daemon ready");

        let lines = SplitStream::new(BufReader::new(tokio::io::stdin()).split(b'\n'));
        let status = daemon.serve(lines).await;
        drop(daemon);
        writer.finish().await?;
        Ok::<_, LaunchError>(status)
    });
    // A blocking stdin read may still be parked on the blocking pool.
    runtime.shutdown_background();

    let status = result?;
    reporter.daemon_stopped(status);
    Ok(status)
}
