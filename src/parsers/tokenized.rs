//! Single-line device listings with positional tokens: `lsusb` and
//! `lspci -mm -nn`.
//!
//! Token positions and character offsets mirror the exact layout the two
//! commands print and are deliberately literal. Malformed lines yield fewer
//! fields or no record, never an error.

use serde::{Deserialize, Serialize};

/// One `lsusb` line: `Bus 001 Device 002: ID 8087:0aaa Intel Corp.`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsbDevice {
    pub bus_number: String,
    pub device_number: String,
    pub manufacture_id: String,
    pub device_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacture_device_name: Option<String>,
}

/// One `lspci -mm -nn` line:
/// `00:02.0 "VGA compatible controller [0300]" "Intel Corporation [8086]" "Device [3e92]" -r02 "Dell [1028]" "Device [085a]"`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PciDevice {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bus_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_class_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_vendor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_vendor_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision_number: Option<String>,
}

const USB_MIN_TOKENS: usize = 6;
const PCI_MIN_SEGMENTS: usize = 6;
/// Width of the `" -r"` label ahead of the revision in the seventh segment.
const PCI_REVISION_OFFSET: usize = 3;

/// Parse `lsusb` output, one record per line with at least six tokens.
///
/// Token 1 is the bus, token 3 the device with its trailing `:` dropped,
/// token 5 the `vendor:product` id pair, and tokens 6.. the free-text name
/// rejoined with single spaces.
pub fn parse_usb(text: &str) -> Vec<UsbDevice> {
    text.lines().filter_map(parse_usb_line).collect()
}

fn parse_usb_line(line: &str) -> Option<UsbDevice> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < USB_MIN_TOKENS {
        return None;
    }

    let mut ids = tokens[5].split(':');
    let manufacture_id = ids.next().unwrap_or_default().to_string();
    let device_id = ids.next().unwrap_or_default().to_string();

    let manufacture_device_name = if tokens.len() > USB_MIN_TOKENS {
        Some(tokens[USB_MIN_TOKENS..].join(" "))
    } else {
        None
    };

    Some(UsbDevice {
        bus_number: tokens[1].to_string(),
        device_number: drop_last_char(tokens[3]).to_string(),
        manufacture_id,
        device_id,
        manufacture_device_name,
    })
}

/// Parse `lspci -mm -nn` output, one record per line with at least six
/// `"`-delimited segments.
///
/// Segment 0 is `bus:device.function`; segments 1, 3 and 5 are
/// `name [id]` pairs for class, vendor and device; segment 6, when present,
/// carries the revision after a three-character label. A segment that does
/// not split as expected leaves its fields unset.
pub fn parse_pci(text: &str) -> Vec<PciDevice> {
    text.lines().filter_map(parse_pci_line).collect()
}

fn parse_pci_line(line: &str) -> Option<PciDevice> {
    let segments: Vec<&str> = line.split('"').collect();
    if segments.len() < PCI_MIN_SEGMENTS {
        return None;
    }

    let mut device = PciDevice::default();

    let numbers: Vec<&str> = segments[0].split(':').collect();
    if let [bus, rest] = numbers[..] {
        device.bus_number = Some(bus.to_string());
        let sub_numbers: Vec<&str> = rest.split('.').collect();
        if let [number, function] = sub_numbers[..] {
            device.device_number = Some(number.to_string());
            device.function_number = Some(function.to_string());
        }
    }

    if let Some((class, class_id)) = split_bracketed(segments[1]) {
        device.device_class = Some(class);
        device.device_class_id = Some(class_id);
    }
    if let Some((vendor, vendor_id)) = split_bracketed(segments[3]) {
        device.device_vendor = Some(vendor);
        device.device_vendor_id = Some(vendor_id);
    }
    if let Some((name, id)) = split_bracketed(segments[5]) {
        device.device_name = Some(name);
        device.device_id = Some(id);
    }

    device.revision_number = segments
        .get(6)
        .map(|segment| segment.chars().skip(PCI_REVISION_OFFSET).collect());

    Some(device)
}

/// `"Intel Corporation [8086]"` -> `("Intel Corporation ", "8086")`.
///
/// The segment must contain exactly one `[`; the character after the id is
/// assumed to be the closing bracket and dropped.
fn split_bracketed(segment: &str) -> Option<(String, String)> {
    let parts: Vec<&str> = segment.split('[').collect();
    match parts[..] {
        [name, id] => Some((name.to_string(), drop_last_char(id).to_string())),
        _ => None,
    }
}

fn drop_last_char(s: &str) -> &str {
    let mut chars = s.chars();
    chars.next_back();
    chars.as_str()
}
