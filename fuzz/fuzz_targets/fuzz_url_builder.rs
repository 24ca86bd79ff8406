//! Fuzz target: authenticated request descriptor
//!
//! Builds request descriptors from arbitrary parameter lists and hardware
//! identifiers, verifying:
//! - Odd parameter counts are always rejected
//! - Every accepted URL starts with the base URL
//! - The device id never exceeds a MAC address without separators
//!
//! cargo fuzz run fuzz_url_builder

#![no_main]

use accent::app::http_client::{DeviceIdentity, HttpRequestDescriptor};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    let mut fields = text.split('\n');
    let raw_id = fields.next().unwrap_or_default();
    let params: Vec<&str> = fields.collect();

    let identity = DeviceIdentity::from_hardware_identifier(raw_id);
    assert!(identity.as_str().len() <= 17);
    assert!(!identity.as_str().contains(':'));

    let base = "http://accent.local/next";
    match HttpRequestDescriptor::from_parameters(base, &params, &identity) {
        Ok(request) => {
            assert!(params.len() % 2 == 0);
            assert!(request.url().starts_with(base));
            assert!(request.auth_header.starts_with("Basic "));
        }
        Err(_) => assert!(params.len() % 2 == 1),
    }
});
