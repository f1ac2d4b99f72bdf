//! Fuzzes capture frame splitting on arbitrary byte streams.
//!
//! Run with:
//!   cargo +nightly fuzz run fuzz_frame_splitter
#![no_main]
use gt_telemetry::FrameSplitter;
use gt_telemetry_protocol::MAGIC_BYTES;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    for frame in FrameSplitter::new(data) {
        let Ok(frame) = frame else { return };
        assert!(frame.starts_with(&MAGIC_BYTES));
        assert!(frame.len() > MAGIC_BYTES.len());
    }
});
