mod cpuh;
mod lshwh;
mod pcih;
mod usbh;

pub use cpuh::{CpuInfoHandle, LscpuHandle};
pub use lshwh::LshwHandle;
pub use pcih::LspciHandle;
pub use usbh::LsusbHandle;

use crate::core::config::{CommandsSection, RoutesSection};
use crate::core::Registry;

/// Priority order: lscpu, lspci, cpu_info, lshw, lsusb.
pub fn register_hardware(reg: &mut Registry, routes: &RoutesSection, commands: &CommandsSection) {
    reg.register_route(&routes.lscpu, LscpuHandle::new(commands.lscpu.clone()));
    reg.register_route(&routes.lspci, LspciHandle::new(commands.lspci.clone()));
    reg.register_route(&routes.cpu_info, CpuInfoHandle::new(commands.cpu_info.clone()));
    reg.register_route(&routes.lshw, LshwHandle::new(commands.lshw.clone()));
    reg.register_route(&routes.lsusb, LsusbHandle::new(commands.lsusb.clone()));
}
