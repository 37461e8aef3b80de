use serde_json::Value;

use super::cpuh::to_value;
use crate::core::{
    registry::Handle,
    runner::{CommandRunner, CommandSpec},
    status::FaultResult,
};
use crate::parsers::tokenized;

/// `lspci -mm -nn` as one object per device, in bus order.
pub struct LspciHandle {
    command: CommandSpec,
}

impl LspciHandle {
    pub fn new(command: CommandSpec) -> Self {
        Self { command }
    }
}

impl Handle for LspciHandle {
    fn name(&self) -> &'static str {
        "lspci"
    }

    fn command(&self) -> &CommandSpec {
        &self.command
    }

    fn call(&self, runner: &dyn CommandRunner) -> FaultResult<Value> {
        let output = runner.run(&self.command)?;
        to_value(tokenized::parse_pci(&output))
    }
}
