//! The daemon's command domains.
//!
//! Each submodule builds one [`Domain`](crate::dispatch::Domain), registering
//! its handlers and starting any background subscriptions it owns.

pub(crate) mod app;
pub(crate) mod daemon;
pub(crate) mod device;

pub use self::daemon::ShutdownRequester;
