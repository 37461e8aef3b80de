pub mod config;
pub mod registry;
pub mod runner;
pub mod status;
pub mod telemetry;

pub use config::{ConfigError, HwcConfig};
pub use registry::{Handle, Registry};
pub use runner::{CommandRunner, CommandSpec, SystemRunner};
pub use status::{Fault, FaultKind, FaultResult};

use serde_json::Value;
use tracing::{info, warn};

/// Route `path` to its handle and run it.
///
/// The handle's value or fault is returned as-is; nothing here wraps or
/// rewrites a fault raised further down.
pub fn dispatch_path(reg: &Registry, runner: &dyn CommandRunner, path: &str) -> FaultResult<Value> {
    let handle = reg.resolve(path).inspect_err(|fault| {
        warn!(path, reason = %fault.message, "unsupported path");
    })?;

    info!(path, handle = handle.name(), command = %handle.command(), "dispatching");
    handle.call(runner).inspect_err(|fault| {
        warn!(path, handle = handle.name(), code = fault.code, reason = %fault.message, "request failed");
    })
}

/// Serialize a dispatch result as the response body.
pub fn render(value: &Value, pretty: bool) -> String {
    if pretty {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
    } else {
        value.to_string()
    }
}
