//! Fuzzes datagram deciphering for every packet format.
//!
//! Run with:
//!   cargo +nightly fuzz run fuzz_packet_decipher
#![no_main]
use gt_telemetry_protocol::{TelemetryFormat, decipher_and_decode};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    for format in TelemetryFormat::ALL {
        if decipher_and_decode(format, data).is_ok() {
            assert!(data.len() >= TelemetryFormat::Standard.packet_len());
        }
    }
});
