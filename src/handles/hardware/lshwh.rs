use serde_json::Value;

use crate::core::{
    registry::Handle,
    runner::{CommandRunner, CommandSpec},
    status::FaultResult,
};
use crate::parsers::passthrough;

/// `lshw -json`, returned as the document it prints.
pub struct LshwHandle {
    command: CommandSpec,
}

impl LshwHandle {
    pub fn new(command: CommandSpec) -> Self {
        Self { command }
    }
}

impl Handle for LshwHandle {
    fn name(&self) -> &'static str {
        "lshw"
    }

    fn command(&self) -> &CommandSpec {
        &self.command
    }

    fn call(&self, runner: &dyn CommandRunner) -> FaultResult<Value> {
        let output = runner.run(&self.command)?;
        passthrough::parse_json(&output)
    }
}
