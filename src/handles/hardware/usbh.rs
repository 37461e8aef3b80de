use serde_json::Value;

use super::cpuh::to_value;
use crate::core::{
    registry::Handle,
    runner::{CommandRunner, CommandSpec},
    status::FaultResult,
};
use crate::parsers::tokenized;

pub struct LsusbHandle {
    command: CommandSpec,
}

impl LsusbHandle {
    pub fn new(command: CommandSpec) -> Self {
        Self { command }
    }
}

impl Handle for LsusbHandle {
    fn name(&self) -> &'static str {
        "lsusb"
    }

    fn command(&self) -> &CommandSpec {
        &self.command
    }

    fn call(&self, runner: &dyn CommandRunner) -> FaultResult<Value> {
        let output = runner.run(&self.command)?;
        to_value(tokenized::parse_usb(&output))
    }
}
