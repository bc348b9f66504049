//! The dispatcher owning every domain and the inbound request loop.

use std::io;

use devhost_protocol::{FrameError, Request, Response, decode_frame};
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::DISPATCH_TARGET;
use super::exit::{EXIT_SUCCESS, ExitSignal};
use super::outbound::Outbound;
use super::router::DomainRouter;
use crate::domains::{self, ShutdownRequester};
use crate::services::DaemonServices;

/// Routes framed requests to domains and tracks the daemon's lifetime.
///
/// Construction registers the `daemon`, `app` and `device` domains and starts
/// their background work, so it must happen inside a Tokio runtime.
#[derive(Debug)]
pub struct Daemon {
    router: DomainRouter,
    outbound: Outbound,
    exit: ExitSignal,
    shutdown_requests: mpsc::UnboundedReceiver<()>,
}

impl Daemon {
    /// Builds the daemon and its domains over `outbound`.
    #[must_use]
    pub fn new(services: &DaemonServices, outbound: Outbound) -> Self {
        let (requester, shutdown_requests) = ShutdownRequester::channel();
        let (device, directory) = domains::device::build(outbound.clone(), services);
        let app = domains::app::build(outbound.clone(), services, directory);
        let daemon = domains::daemon::build(outbound.clone(), &services.logs, requester);

        let mut router = DomainRouter::new();
        router.register(daemon);
        router.register(app);
        router.register(device);

        Self {
            router,
            outbound,
            exit: ExitSignal::new(),
            shutdown_requests,
        }
    }

    /// Signal resolved with the exit status when the daemon terminates.
    #[must_use]
    pub fn exit_signal(&self) -> ExitSignal {
        self.exit.clone()
    }

    /// Every method the daemon answers, sorted.
    #[must_use]
    pub fn methods(&self) -> Vec<String> {
        self.router.methods()
    }

    /// Disposes every domain and resolves the exit signal with success.
    ///
    /// Only the first call has any effect.
    pub fn shutdown(&self) {
        if self.exit.status().is_some() {
            return;
        }
        self.router.dispose_all();
        if self.exit.complete(EXIT_SUCCESS) {
            info!(target: DISPATCH_TARGET, "daemon shutting down");
        }
    }

    /// Serves requests from raw input `lines` until shutdown or end of input.
    ///
    /// Each item is one line without its terminator. Lines that are not valid
    /// UTF-8 are dropped like any other non-frame chatter; only a read error
    /// or the end of the stream stops the loop. Returns the exit status. Handlers are spawned as independent tasks;
    /// requests still running when this returns keep running until the
    /// runtime stops.
    pub async fn serve<S>(&mut self, mut lines: S) -> i32
    where
        S: Stream<Item = io::Result<Vec<u8>>> + Unpin,
    {
        let exit = self.exit.clone();
        loop {
            tokio::select! {
                biased;
                status = exit.wait() => return status,
                Some(()) = self.shutdown_requests.recv() => {
                    // Let the acknowledging response reach the writer first.
                    tokio::task::yield_now().await;
                    self.shutdown();
                }
                line = lines.next() => match line {
                    Some(Ok(line)) => self.dispatch_bytes(line),
                    Some(Err(error)) => {
                        warn!(target: DISPATCH_TARGET, %error, "failed to read input");
                        self.shutdown();
                    }
                    None => {
                        debug!(target: DISPATCH_TARGET, "input closed");
                        self.shutdown();
                    }
                },
            }
        }
    }

    fn dispatch_bytes(&self, line: Vec<u8>) {
        match String::from_utf8(line) {
            Ok(line) => self.dispatch_line(&line),
            Err(error) => {
                debug!(target: DISPATCH_TARGET, %error, "non-UTF-8 input line ignored");
            }
        }
    }

    /// Decodes and dispatches one input line.
    pub fn dispatch_line(&self, line: &str) {
        match decode_frame(line) {
            None => {}
            Some(Ok(request)) => self.dispatch(request),
            Some(Err(error)) => self.reject_frame(&error),
        }
    }

    fn dispatch(&self, request: Request) {
        let Request { id, method, params } = request;
        let Some(id) = id else {
            warn!(target: DISPATCH_TARGET, method = method.as_str(), "request without id dropped");
            return;
        };
        match self.router.resolve(&method) {
            Ok((domain, command)) => {
                tokio::spawn(domain.handle_command(command, id, params));
            }
            Err(error) => {
                warn!(target: DISPATCH_TARGET, %error, "request not routed");
                self.outbound.send(Response::failure(id, error.to_string()));
            }
        }
    }

    fn reject_frame(&self, error: &FrameError) {
        match error.request_id() {
            Some(id) => {
                warn!(target: DISPATCH_TARGET, %error, "invalid request frame");
                self.outbound
                    .send(Response::failure(id.clone(), error.to_string()));
            }
            None => warn!(target: DISPATCH_TARGET, %error, "malformed frame dropped"),
        }
    }
}
