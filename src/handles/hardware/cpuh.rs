use serde_json::Value;

use crate::core::{
    registry::Handle,
    runner::{CommandRunner, CommandSpec},
    status::{Fault, FaultResult},
};
use crate::parsers::fields;

/// `lscpu` summary as a single object.
pub struct LscpuHandle {
    command: CommandSpec,
}

impl LscpuHandle {
    pub fn new(command: CommandSpec) -> Self {
        Self { command }
    }
}

impl Handle for LscpuHandle {
    fn name(&self) -> &'static str {
        "lscpu"
    }

    fn command(&self) -> &CommandSpec {
        &self.command
    }

    fn call(&self, runner: &dyn CommandRunner) -> FaultResult<Value> {
        let output = runner.run(&self.command)?;
        to_value(fields::parse_summary(&output))
    }
}

/// Raw `/proc/cpuinfo` as one object per logical processor.
pub struct CpuInfoHandle {
    command: CommandSpec,
}

impl CpuInfoHandle {
    pub fn new(command: CommandSpec) -> Self {
        Self { command }
    }
}

impl Handle for CpuInfoHandle {
    fn name(&self) -> &'static str {
        "cpu_info"
    }

    fn command(&self) -> &CommandSpec {
        &self.command
    }

    fn call(&self, runner: &dyn CommandRunner) -> FaultResult<Value> {
        let output = runner.run(&self.command)?;
        to_value(fields::parse_processors(&output))
    }
}

pub(super) fn to_value<T: serde::Serialize>(records: T) -> FaultResult<Value> {
    serde_json::to_value(records).map_err(|e| Fault::parse(e.to_string()))
}
