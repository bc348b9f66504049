//! Test harness utilities for the daemon behavioural suites.

mod collaborators;
mod harness;
mod reporter;
mod services;

pub use collaborators::{FakeAppRunner, FakeDeviceSource, FakeToolchain, StartCall};
pub use harness::{DaemonHarness, RECV_TIMEOUT};
pub use reporter::{HealthEvent, RecordingHealthReporter};
pub use services::{TestServices, device};
