pub mod core;
pub mod handles;
pub mod parsers;
pub mod server;

pub use crate::core::{dispatch_path, render, CommandRunner, Fault, FaultResult, HwcConfig, Registry, SystemRunner};

/// Registry with every hardware handle installed from `config`.
pub fn build_registry(config: &HwcConfig) -> Registry {
    let mut reg = Registry::default();
    handles::register_all(&mut reg, &config.routes, &config.commands);
    reg
}
