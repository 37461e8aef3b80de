pub mod hardware;

use crate::core::config::{CommandsSection, RoutesSection};
use crate::core::Registry;

pub fn register_all(reg: &mut Registry, routes: &RoutesSection, commands: &CommandsSection) {
    hardware::register_hardware(reg, routes, commands);
}
