use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// Where in the request chain a fault was raised.
///
/// Not part of the wire envelope; the transport uses it to choose a status
/// code and nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    /// Command missing, spawn failure, non-zero exit, timeout or undecodable output.
    Execution,
    /// Structured output that failed to decode.
    Parse,
    /// No route matched the request path.
    Routing,
}

/// Uniform error value for every layer: a code and a message.
///
/// The code carries the process exit status when one is known and is 0
/// otherwise. A fault is terminal for the request that raised it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Error code: {code}, reason: {message}")]
pub struct Fault {
    pub code: i32,
    pub message: String,
    pub kind: FaultKind,
}

pub type FaultResult<T> = Result<T, Fault>;

impl Fault {
    /// Execution fault with code 0.
    pub fn new(message: impl Into<String>) -> Self {
        Self::execution(0, message)
    }

    pub fn execution(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            kind: FaultKind::Execution,
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self {
            code: 0,
            message: message.into(),
            kind: FaultKind::Parse,
        }
    }

    pub fn routing(path: &str) -> Self {
        Self {
            code: 0,
            message: format!("This url is not supported: {}", path),
            kind: FaultKind::Routing,
        }
    }

    pub fn is_routing(&self) -> bool {
        self.kind == FaultKind::Routing
    }

    /// The `{"code", "reason"}` envelope handed to the transport.
    pub fn to_json(&self) -> Value {
        json!({
            "code": self.code,
            "reason": self.message,
        })
    }
}
