//! Built-in `daemon` domain: version, shutdown and log forwarding.

use devhost_protocol::PROTOCOL_VERSION;
use serde_json::Value;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::dispatch::{DISPATCH_TARGET, Domain, DomainName, Outbound};
use crate::log_bridge::{LOG_BRIDGE_TARGET, LogSource};

/// Event carrying forwarded log records.
pub const LOG_MESSAGE_EVENT: &str = "logMessage";

/// Asks the daemon to shut down once the current turn completes.
#[derive(Debug, Clone)]
pub struct ShutdownRequester {
    sender: mpsc::UnboundedSender<()>,
}

impl ShutdownRequester {
    /// Creates a requester and the receiver the daemon listens on.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<()>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Requests shutdown. Requests after the daemon stopped are ignored.
    pub fn request(&self) {
        if self.sender.send(()).is_err() {
            debug!(target: DISPATCH_TARGET, "shutdown already in progress");
        }
    }
}

/// Builds the `daemon` domain and subscribes it to `logs`.
pub(crate) fn build(outbound: Outbound, logs: &LogSource, shutdown: ShutdownRequester) -> Domain {
    let mut domain = Domain::new(DomainName::Daemon, outbound);
    domain.register_sync("version", |_| Ok(Some(Value::from(PROTOCOL_VERSION))));
    domain.register_sync("shutdown", move |_| {
        shutdown.request();
        Ok(None)
    });

    let mut records = logs.subscribe();
    let events = domain.events();
    let bridge = tokio::spawn(async move {
        loop {
            match records.recv().await {
                Ok(record) => events.send_serialized(LOG_MESSAGE_EVENT, &record),
                Err(RecvError::Lagged(skipped)) => warn!(
                    target: LOG_BRIDGE_TARGET,
                    skipped,
                    "log records dropped before forwarding"
                ),
                Err(RecvError::Closed) => break,
            }
        }
    });
    domain.attach(&bridge);
    domain
}

#[cfg(test)]
mod tests {
    use devhost_protocol::{LogLevel, LogMessage, OutboundMessage};
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn forwards_records_as_log_message_events() {
        let (outbound, mut messages) = Outbound::channel();
        let logs = LogSource::new();
        let (requester, _requests) = ShutdownRequester::channel();
        let _domain = build(outbound, &logs, requester);

        logs.publish(LogMessage {
            level: LogLevel::Status,
            message: "hello".to_owned(),
            stack_trace: None,
        });

        match messages.recv().await.expect("event") {
            OutboundMessage::Event(event) => {
                assert_eq!(event.name(), "daemon.logMessage");
                assert_eq!(
                    event.params(),
                    Some(&json!({"level": "status", "message": "hello"}))
                );
            }
            OutboundMessage::Response(response) => panic!("unexpected {response:?}"),
        }
    }

    #[tokio::test]
    async fn shutdown_command_requests_shutdown() {
        let (outbound, mut messages) = Outbound::channel();
        let (requester, mut requests) = ShutdownRequester::channel();
        let domain = build(outbound, &LogSource::new(), requester);

        domain.handle_command("shutdown", json!(1), None).await;

        assert!(requests.try_recv().is_ok());
        assert!(matches!(
            messages.recv().await,
            Some(OutboundMessage::Response(response)) if response.result().is_none()
                && response.error().is_none()
        ));
    }
}
