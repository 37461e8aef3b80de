//! Commands that already print JSON (`lshw -json`).

use serde_json::Value;

use crate::core::status::{Fault, FaultResult};

/// Decode the whole text as one JSON document and return it unchanged.
pub fn parse_json(text: &str) -> FaultResult<Value> {
    serde_json::from_str(text).map_err(|e| Fault::parse(format!("parsing error: {}", e)))
}
