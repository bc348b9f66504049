//! Bracket framing for protocol lines.
//!
//! Only lines shaped like `[{...}]` are protocol frames. Anything else on the
//! stream is treated as unrelated chatter and ignored, which lets the protocol
//! share a pipe with diagnostic output. Outbound messages are wrapped the same
//! way, one frame per line.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::message::Request;

/// Errors raised while decoding a recognised frame.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The frame payload is not valid JSON.
    #[error("malformed frame: {source}")]
    Malformed {
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// The payload is JSON but does not describe a request.
    #[error("invalid request: {source}")]
    InvalidRequest {
        /// Identifier recovered from the payload, if one was present.
        id: Option<Value>,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

impl FrameError {
    /// Identifier of the request this frame belonged to, when recoverable.
    #[must_use]
    pub const fn request_id(&self) -> Option<&Value> {
        match self {
            Self::Malformed { .. } => None,
            Self::InvalidRequest { id, .. } => id.as_ref(),
        }
    }
}

/// Decodes one input line.
///
/// Returns `None` when the line is not a frame. Surrounding whitespace
/// (including a trailing carriage return) is ignored.
///
/// # Examples
///
/// ```
/// use devhost_protocol::decode_frame;
///
/// assert!(decode_frame("building...").is_none());
/// let request = decode_frame(r#"[{"id":1,"method":"daemon.version"}]"#)
///     .and_then(Result::ok)
///     .map(|request| request.method);
/// assert_eq!(request.as_deref(), Some("daemon.version"));
/// ```
#[must_use]
pub fn decode_frame(line: &str) -> Option<Result<Request, FrameError>> {
    frame_payload(line).map(parse_request)
}

/// Encodes an outbound message as a single framed line without a trailing
/// newline.
///
/// # Errors
///
/// Returns an error if the message cannot be serialised.
pub fn encode_frame<T: Serialize>(message: &T) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(message)?;
    Ok(format!("[{json}]"))
}

fn frame_payload(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    if !(trimmed.starts_with("[{") && trimmed.ends_with("}]")) {
        return None;
    }
    trimmed.strip_prefix('[')?.strip_suffix(']')
}

fn parse_request(payload: &str) -> Result<Request, FrameError> {
    let value: Value =
        serde_json::from_str(payload).map_err(|source| FrameError::Malformed { source })?;
    let id = value.get("id").filter(|id| !id.is_null()).cloned();
    serde_json::from_value(value).map_err(|source| FrameError::InvalidRequest { id, source })
}
