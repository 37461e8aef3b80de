pub mod fields;
pub mod passthrough;
pub mod tokenized;

pub use fields::{parse_processors, parse_summary, CpuSummary, ProcessorRecord};
pub use passthrough::parse_json;
pub use tokenized::{parse_pci, parse_usb, PciDevice, UsbDevice};
