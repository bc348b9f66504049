//! Binary entrypoint for the devhost daemon.
//!
//! Startup failures go to stderr directly because telemetry may not be
//! installed yet.

use std::io::{self, StderrLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    match devhostd::run_daemon() {
        Ok(status) => ExitCode::from(u8::try_from(status).unwrap_or(u8::MAX)),
        Err(error) => {
            if let Some(cli) = error.as_cli() {
                cli.exit();
            }
            let mut stderr: StderrLock<'_> = io::stderr().lock();
            // Nothing else can be reported if stderr itself is gone.
            devhostd::report_launch_failure(&mut stderr, &error).ok();
            ExitCode::FAILURE
        }
    }
}
