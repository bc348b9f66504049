//! Test suites for the devhost daemon.

mod support;
