//! Named command groups with uniform execution and event emission.

use std::any::Any;
use std::collections::HashMap;
use std::future::{self, Future};
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};

use devhost_protocol::{Event, Response};
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, warn};

use super::DISPATCH_TARGET;
use super::errors::{CommandError, DispatchError};
use super::outbound::Outbound;
use super::router::DomainName;

/// Outcome of a command handler: an optional result value or a failure.
pub type CommandResult = Result<Option<Value>, CommandError>;

type Handler = Arc<dyn Fn(Option<Value>) -> BoxFuture<'static, CommandResult> + Send + Sync>;

/// Serialises a handler result.
///
/// Devices serialise as their wire record, so any payload containing them
/// is encoded the same way as device events.
///
/// # Errors
///
/// Returns [`CommandError::Serialize`] if serialisation fails.
pub fn to_payload<T: Serialize + ?Sized>(value: &T) -> CommandResult {
    Ok(Some(serde_json::to_value(value)?))
}

/// Emits events on behalf of one domain.
#[derive(Debug, Clone)]
pub struct EventEmitter {
    domain: DomainName,
    outbound: Outbound,
}

impl EventEmitter {
    /// Emits `<domain>.<name>` with optional parameters.
    pub fn send(&self, name: &str, params: Option<Value>) {
        self.outbound
            .send(Event::new(self.domain.as_str(), name, params));
    }

    /// Emits `<domain>.<name>` with `params` serialised as the payload.
    pub fn send_serialized<T: Serialize + ?Sized>(&self, name: &str, params: &T) {
        match serde_json::to_value(params) {
            Ok(value) => self.send(name, Some(value)),
            Err(error) => warn!(
                target: DISPATCH_TARGET,
                domain = self.domain.as_str(),
                event = name,
                %error,
                "failed to serialise event payload"
            ),
        }
    }
}

/// A named group of command handlers.
///
/// Handlers are registered while the domain is built and the table is fixed
/// once the domain is handed to the router. Background subscriptions attached
/// to the domain are aborted by [`Domain::dispose`].
pub struct Domain {
    name: DomainName,
    handlers: HashMap<&'static str, Handler>,
    events: EventEmitter,
    subscriptions: Mutex<Vec<AbortHandle>>,
}

impl Domain {
    /// Creates a domain with no handlers.
    #[must_use]
    pub fn new(name: DomainName, outbound: Outbound) -> Self {
        Self {
            name,
            handlers: HashMap::new(),
            events: EventEmitter {
                domain: name,
                outbound,
            },
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    /// Domain name.
    #[must_use]
    pub const fn name(&self) -> DomainName {
        self.name
    }

    /// Registers an asynchronous handler; a later registration for the same
    /// command replaces the earlier one.
    pub fn register_handler<F, Fut>(&mut self, command: &'static str, handler: F)
    where
        F: Fn(Option<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CommandResult> + Send + 'static,
    {
        let handler: Handler = Arc::new(move |params| handler(params).boxed());
        if self.handlers.insert(command, handler).is_some() {
            debug!(
                target: DISPATCH_TARGET,
                domain = self.name.as_str(),
                command,
                "handler replaced"
            );
        }
    }

    /// Registers a synchronous handler on the same completion path as
    /// asynchronous ones.
    pub fn register_sync<F>(&mut self, command: &'static str, handler: F)
    where
        F: Fn(Option<Value>) -> CommandResult + Send + Sync + 'static,
    {
        self.register_handler(command, move |params| future::ready(handler(params)));
    }

    /// Sorted list of registered command names.
    #[must_use]
    pub fn commands(&self) -> Vec<&'static str> {
        let mut commands: Vec<&'static str> = self.handlers.keys().copied().collect();
        commands.sort_unstable();
        commands
    }

    /// Emitter for this domain's events.
    #[must_use]
    pub fn events(&self) -> EventEmitter {
        self.events.clone()
    }

    /// Emits `<domain>.<name>` with optional parameters.
    pub fn send_event(&self, name: &str, params: Option<Value>) {
        self.events.send(name, params);
    }

    /// Ties a background task to the domain's lifetime.
    pub fn attach<T>(&self, task: &JoinHandle<T>) {
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(task.abort_handle());
    }

    /// Releases background subscriptions. In-flight commands keep running.
    pub fn dispose(&self) {
        let subscriptions: Vec<AbortHandle> = self
            .subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        if !subscriptions.is_empty() {
            debug!(
                target: DISPATCH_TARGET,
                domain = self.name.as_str(),
                count = subscriptions.len(),
                "releasing domain subscriptions"
            );
        }
        for subscription in subscriptions {
            subscription.abort();
        }
    }

    /// Runs `command` and sends exactly one response for `id`.
    ///
    /// The returned future owns everything it needs, so the caller can spawn
    /// it and move on to the next request. Handler failures, including
    /// panics, become error responses.
    #[must_use]
    pub fn handle_command(
        &self,
        command: &str,
        id: Value,
        params: Option<Value>,
    ) -> BoxFuture<'static, ()> {
        let domain = self.name;
        let command = command.to_owned();
        let handler = self.handlers.get(command.as_str()).cloned();
        let outbound = self.events.outbound.clone();

        async move {
            let outcome = match handler {
                Some(handler) => invoke(&handler, params).await,
                None => Err(DispatchError::unknown_command(domain.as_str(), command.as_str()).into()),
            };
            let response = match outcome {
                Ok(None) => Response::empty(id),
                Ok(Some(result)) => Response::success(id, result),
                Err(error) => {
                    let method = format!("{}.{command}", domain.as_str());
                    warn!(
                        target: DISPATCH_TARGET,
                        method = method.as_str(),
                        %error,
                        "command failed"
                    );
                    Response::failure(id, error.to_string())
                }
            };
            outbound.send(response);
        }
        .boxed()
    }
}

impl std::fmt::Debug for Domain {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Domain")
            .field("name", &self.name)
            .field("commands", &self.commands())
            .finish_non_exhaustive()
    }
}

async fn invoke(handler: &Handler, params: Option<Value>) -> CommandResult {
    let handler = Arc::clone(handler);
    match AssertUnwindSafe(async move { handler(params).await })
        .catch_unwind()
        .await
    {
        Ok(outcome) => outcome,
        Err(payload) => Err(CommandError::Panicked {
            message: panic_message(payload.as_ref()),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_owned()
    }
}
