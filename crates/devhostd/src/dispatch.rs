//! Framed request dispatch for the stdio protocol.
//!
//! The dispatcher reads protocol lines, decodes them with the frame codec from
//! [`devhost_protocol`], routes each request to a domain by the prefix of its
//! method, and hands the command to that domain as an independent task. The
//! loop never waits for a handler, so several commands may be in flight at
//! once and responses may leave in a different order from their requests.
//!
//! ## Protocol
//!
//! ```text
//! -> [{"id":1,"method":"daemon.version"}]
//! <- [{"id":1,"result":"0.1.0"}]
//! <- [{"event":"device.added","params":{"id":"emulator-5554",...}}]
//! ```
//!
//! Every outbound line funnels through a single [`Outbound`] channel drained by
//! one writer task, so lines are never interleaved.

mod daemon;
mod domain;
mod errors;
mod exit;
mod outbound;
mod router;

pub use self::daemon::Daemon;
pub use self::domain::{CommandResult, Domain, EventEmitter, to_payload};
pub use self::errors::{CommandError, DispatchError};
pub use self::exit::{EXIT_SUCCESS, ExitSignal};
pub(crate) use self::outbound::OUTBOUND_TARGET;
pub use self::outbound::{Outbound, OutboundWriter, WriterError, WriterHandle};
pub use self::router::{DomainName, DomainRouter};

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");
