//! Request, response, and event envelopes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Command request received from the client.
///
/// The identifier is opaque: it is never inspected, only echoed back on the
/// matching [`Response`]. A JSON `null` identifier is treated as absent.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Request {
    /// Correlation identifier, echoed verbatim in the response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    /// Method in `<domain>.<command>` form.
    pub method: String,
    /// Optional structured parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Request {
    /// Splits the method on its first `.` into domain and command.
    ///
    /// Returns `None` when the method carries no separator.
    #[must_use]
    pub fn split_method(&self) -> Option<(&str, &str)> {
        self.method.split_once('.')
    }
}

/// Response correlated to a request by its identifier.
///
/// A response carries a result, an error, or neither (when the handler
/// produced no value), but never both.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl Response {
    /// Acknowledges a request whose handler produced no value.
    #[must_use]
    pub const fn empty(id: Value) -> Self {
        Self {
            id,
            result: None,
            error: None,
        }
    }

    /// Builds a successful response carrying `result`.
    #[must_use]
    pub const fn success(id: Value, result: Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Builds a failed response carrying a human-readable description.
    #[must_use]
    pub fn failure(id: Value, error: impl Into<String>) -> Self {
        Self {
            id,
            result: None,
            error: Some(error.into()),
        }
    }

    /// Identifier echoed from the request.
    #[must_use]
    pub const fn id(&self) -> &Value {
        &self.id
    }

    /// Result payload, if the handler returned a value.
    #[must_use]
    pub const fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    /// Error description, if the request failed.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Unsolicited notification emitted by a domain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<Value>,
}

impl Event {
    /// Builds an event named `<domain>.<name>`.
    #[must_use]
    pub fn new(domain: &str, name: &str, params: Option<Value>) -> Self {
        Self {
            event: format!("{domain}.{name}"),
            params,
        }
    }

    /// Fully qualified event name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.event
    }

    /// Event parameters, if any.
    #[must_use]
    pub const fn params(&self) -> Option<&Value> {
        self.params.as_ref()
    }
}

/// Any message the daemon writes to its output stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutboundMessage {
    /// Reply to a request.
    Response(Response),
    /// Unsolicited event.
    Event(Event),
}

impl From<Response> for OutboundMessage {
    fn from(response: Response) -> Self {
        Self::Response(response)
    }
}

impl From<Event> for OutboundMessage {
    fn from(event: Event) -> Self {
        Self::Event(event)
    }
}
