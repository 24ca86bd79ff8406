//! Fuzz target: setup server request decoding
//!
//! Splits arbitrary bytes at the first blank line and feeds header and
//! body to `parse_request`, verifying:
//! - No panics on arbitrary input
//! - A decoded path never contains the query separator
//! - `decode_form` yields at most one pair per `&`-separated field
//!
//! cargo fuzz run fuzz_request_parser

#![no_main]

use accent::adapters::http_server::{decode_form, find_header_end, parse_request};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let (header, body) = match find_header_end(data) {
        Some(end) => (&data[..end], &data[end + 4..]),
        None => (data, &[][..]),
    };
    let Ok(header) = core::str::from_utf8(header) else {
        return;
    };

    if let Ok(request) = parse_request(header, body) {
        assert!(
            !request.path.contains('?'),
            "path kept its query: {}",
            request.path
        );
    }

    if let Ok(text) = core::str::from_utf8(body) {
        assert!(decode_form(text).len() <= text.split('&').count());
    }
});
