//! Drives a [`Daemon`] through in-memory input and output channels.

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use devhost_protocol::{Event, OutboundMessage, Response};
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::dispatch::{Daemon, ExitSignal, Outbound};
use crate::services::DaemonServices;

/// Upper bound on waiting for any single outbound message.
pub const RECV_TIMEOUT: Duration = Duration::from_secs(60);

/// Client side of a running daemon.
pub struct DaemonHarness {
    input: Option<mpsc::UnboundedSender<io::Result<Vec<u8>>>>,
    messages: mpsc::UnboundedReceiver<OutboundMessage>,
    pending: VecDeque<OutboundMessage>,
    exit: ExitSignal,
    serve: Option<JoinHandle<i32>>,
}

impl DaemonHarness {
    /// Builds a daemon over `services` and starts serving. Must be called
    /// inside a Tokio runtime.
    pub fn start(services: &DaemonServices) -> Self {
        let (outbound, messages) = Outbound::channel();
        let mut daemon = Daemon::new(services, outbound);
        let exit = daemon.exit_signal();
        let (input, lines) = mpsc::unbounded_channel();
        let serve =
            tokio::spawn(async move { daemon.serve(UnboundedReceiverStream::new(lines)).await });
        Self {
            input: Some(input),
            messages,
            pending: VecDeque::new(),
            exit,
            serve: Some(serve),
        }
    }

    /// Writes one input line.
    pub fn send_line(&self, line: &str) {
        self.send_bytes(line.as_bytes());
    }

    /// Writes one input line as raw bytes, which need not be UTF-8.
    pub fn send_bytes(&self, line: &[u8]) {
        if let Some(input) = &self.input {
            // The daemon may already have stopped reading.
            let _ = input.send(Ok(line.to_vec()));
        }
    }

    /// Writes a framed request.
    pub fn request(&self, id: u64, method: &str, params: Option<Value>) {
        let mut request = json!({ "id": id, "method": method });
        if let Some(params) = params {
            request["params"] = params;
        }
        self.send_line(&format!("[{request}]"));
    }

    /// Closes the daemon's input.
    pub fn close_input(&mut self) {
        self.input = None;
    }

    /// Delivers a read failure on the daemon's input.
    pub fn fail_input(&self) {
        if let Some(input) = &self.input {
            let _ = input.send(Err(io::Error::other("input stream broke")));
        }
    }

    /// Exit signal shared with the daemon.
    pub fn exit_signal(&self) -> ExitSignal {
        self.exit.clone()
    }

    /// Next outbound message in write order.
    pub async fn next_message(&mut self) -> OutboundMessage {
        if let Some(message) = self.pending.pop_front() {
            return message;
        }
        self.receive().await
    }

    /// Waits for the response to request `id`, buffering anything else.
    pub async fn response(&mut self, id: u64) -> Response {
        let expected = json!(id);
        if let Some(position) = self.pending.iter().position(
            |message| matches!(message, OutboundMessage::Response(response) if *response.id() == expected),
        ) && let Some(OutboundMessage::Response(response)) = self.pending.remove(position)
        {
            return response;
        }
        loop {
            match self.receive().await {
                OutboundMessage::Response(response) if *response.id() == expected => {
                    return response;
                }
                other => self.pending.push_back(other),
            }
        }
    }

    /// Waits for the next event named `name`, buffering anything else.
    pub async fn event(&mut self, name: &str) -> Event {
        if let Some(position) = self.pending.iter().position(
            |message| matches!(message, OutboundMessage::Event(event) if event.name() == name),
        ) && let Some(OutboundMessage::Event(event)) = self.pending.remove(position)
        {
            return event;
        }
        loop {
            match self.receive().await {
                OutboundMessage::Event(event) if event.name() == name => return event,
                other => self.pending.push_back(other),
            }
        }
    }

    /// Returns a message if one is ready without waiting.
    pub fn try_message(&mut self) -> Option<OutboundMessage> {
        self.pending
            .pop_front()
            .or_else(|| self.messages.try_recv().ok())
    }

    /// Waits for the serve loop to return its exit status.
    pub async fn exit_status(&mut self) -> i32 {
        let serve = self.serve.take().expect("serve loop already awaited");
        tokio::time::timeout(RECV_TIMEOUT, serve)
            .await
            .expect("daemon exits before timeout")
            .expect("serve loop completes")
    }

    async fn receive(&mut self) -> OutboundMessage {
        tokio::time::timeout(RECV_TIMEOUT, self.messages.recv())
            .await
            .expect("message before timeout")
            .expect("outbound channel open")
    }
}
