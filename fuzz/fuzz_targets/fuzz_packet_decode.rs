//! Fuzzes the fixed-offset packet decoder with arbitrary deciphered frames.
//!
//! Run with:
//!   cargo +nightly fuzz run fuzz_packet_decode
#![no_main]
use gt_telemetry_protocol::{MAGIC_BYTES, decode};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Errors are expected, panics are not.
    if let Ok(snapshot) = decode(data) {
        assert!(data.starts_with(&MAGIC_BYTES));
        assert!(snapshot.current_gear() <= 15);
        assert!(snapshot.suggested_gear() <= 15);
    }
});
