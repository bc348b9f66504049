//! Wire types for the devhost stdio protocol.
//!
//! The daemon and its clients exchange one JSON object per line, wrapped in a
//! single-element array (`[{...}]`). Inbound lines carry a [`Request`];
//! outbound lines carry either a [`Response`] correlated by the echoed request
//! identifier or an unsolicited [`Event`]. The [`frame`] module owns the
//! bracket framing so that neither side has to reason about it.

pub mod device;
pub mod frame;
pub mod log;
pub mod message;

pub use device::{DeviceRecord, Platform, PlatformParseError};
pub use frame::{FrameError, decode_frame, encode_frame};
pub use log::{LogLevel, LogMessage};
pub use message::{Event, OutboundMessage, Request, Response};

/// Protocol version reported by `daemon.version`.
pub const PROTOCOL_VERSION: &str = "0.1.0";
