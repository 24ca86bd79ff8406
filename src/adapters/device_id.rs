//! Hardware address of the radio.
//!
//! The station interface uses the factory MAC burned into eFuse.  It is
//! rendered as `AA:BB:CC:DD:EE:FF`, the form the authenticated client
//! strips down to the bare device id.

use core::fmt::Write;

/// Full 6-byte MAC address.
pub type MacAddress = [u8; 6];

/// `AA:BB:CC:DD:EE:FF` (17 chars).
pub type MacString = heapless::String<17>;

/// Read the factory MAC address from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    unsafe {
        esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    mac
}

/// Simulation: returns a deterministic fake MAC.
#[cfg(not(target_os = "espidf"))]
pub fn read_mac() -> MacAddress {
    [0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE]
}

/// Uppercase, colon-separated text form.
pub fn format_mac(mac: &MacAddress) -> MacString {
    let mut text = MacString::new();
    for (i, byte) in mac.iter().enumerate() {
        if i > 0 {
            let _ = text.push(':');
        }
        let _ = write!(text, "{:02X}", byte);
    }
    text
}
