//! Forwarding of tracing records to the protocol peer.
//!
//! [`LogBridgeLayer`] renders each record it sees into a [`LogMessage`] and
//! publishes it on a [`LogSource`]. The daemon domain subscribes to the source
//! and emits every message as a `daemon.logMessage` event.

use std::fmt::{self, Write as _};

use devhost_protocol::{LogLevel, LogMessage};
use tokio::sync::broadcast;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use crate::dispatch::OUTBOUND_TARGET;

/// Tracing target for bridge diagnostics. Records under this target are not
/// forwarded.
pub(crate) const LOG_BRIDGE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::log_bridge");

/// Number of records buffered for a slow subscriber before it starts lagging.
pub const LOG_BUFFER: usize = 256;

/// Broadcast source of forwarded log records.
#[derive(Debug, Clone)]
pub struct LogSource {
    sender: broadcast::Sender<LogMessage>,
}

impl LogSource {
    /// Creates a source buffering [`LOG_BUFFER`] records per subscriber.
    pub fn new() -> Self {
        let (sender, _receiver) = broadcast::channel(LOG_BUFFER);
        Self { sender }
    }

    /// Subscribes to records published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<LogMessage> {
        self.sender.subscribe()
    }

    /// Publishes `message` to current subscribers; without subscribers the
    /// record is discarded.
    pub fn publish(&self, message: LogMessage) {
        let _ = self.sender.send(message);
    }
}

impl Default for LogSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracing layer publishing records to a [`LogSource`].
#[derive(Debug, Clone)]
pub struct LogBridgeLayer {
    source: LogSource,
}

impl LogBridgeLayer {
    /// Creates a layer publishing to `source`.
    pub fn new(source: LogSource) -> Self {
        Self { source }
    }
}

impl<S: Subscriber> Layer<S> for LogBridgeLayer {
    fn on_event(&self, event: &Event<'_>, _context: Context<'_, S>) {
        let metadata = event.metadata();
        let target = metadata.target();
        if target.starts_with(OUTBOUND_TARGET) || target.starts_with(LOG_BRIDGE_TARGET) {
            return;
        }
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        self.source.publish(LogMessage {
            level: bridge_level(*metadata.level()),
            message: visitor.message,
            stack_trace: visitor.stack_trace,
        });
    }
}

/// Maps a tracing level onto the protocol's log levels.
pub fn bridge_level(level: Level) -> LogLevel {
    match level {
        Level::ERROR => LogLevel::Error,
        Level::WARN => LogLevel::Warning,
        Level::INFO => LogLevel::Status,
        _ => LogLevel::Trace,
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
    stack_trace: Option<String>,
}

impl MessageVisitor {
    fn append(&mut self, field: &Field, value: fmt::Arguments<'_>) {
        match field.name() {
            "message" => {
                let fields = std::mem::take(&mut self.message);
                let _ = write!(self.message, "{value}{fields}");
            }
            "stack_trace" => self.stack_trace = Some(value.to_string()),
            name => {
                let _ = write!(self.message, " {name}={value}");
            }
        }
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.append(field, format_args!("{value}"));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.append(field, format_args!("{value}"));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.append(field, format_args!("{value:?}"));
    }
}
