//! Fuzz test for the century expression parser
//!
//! Parsing must never panic; whatever parses must have a finite sort value
//! and render as text.
//!
//! Run with: cargo +nightly fuzz run century_fuzz -- -max_total_time=60

#![no_main]

use libfuzzer_sys::fuzz_target;
use pinakes_core::CenturyDateAdapter;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        let adapter = CenturyDateAdapter::new();
        if let Some(date) = adapter.parse_str(input) {
            assert!(date.sort_value().is_finite(), "Non-finite sort value for {:?}", input);
            assert!(!date.to_string().is_empty(), "Empty rendering for {:?}", input);
        }
    }
});
