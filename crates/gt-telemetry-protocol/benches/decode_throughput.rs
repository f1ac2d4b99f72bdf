//! Benchmarks for the decipher and decode hot path.

use criterion::{Criterion, criterion_group, criterion_main};
use gt_telemetry_protocol::{MAGIC, TelemetryFormat, cipher, decode, decipher_and_decode, offsets};

fn sample_frame(format: TelemetryFormat) -> Vec<u8> {
    let mut buf = vec![0u8; format.packet_len()];
    buf[..4].copy_from_slice(&MAGIC.to_le_bytes());
    buf[offsets::ENGINE_RPM..offsets::ENGINE_RPM + 4].copy_from_slice(&6500.0f32.to_le_bytes());
    buf[offsets::SEQUENCE_ID..offsets::SEQUENCE_ID + 4].copy_from_slice(&42u32.to_le_bytes());
    buf
}

fn bench_decode(c: &mut Criterion) {
    for format in TelemetryFormat::ALL {
        let frame = sample_frame(format);
        c.bench_function(&format!("decode_{format}"), |b| {
            b.iter(|| decode(std::hint::black_box(&frame)))
        });
    }
}

fn bench_decipher(c: &mut Criterion) {
    let format = TelemetryFormat::Addendum2;
    let Ok(wire) = cipher::encode(format.iv_seed(), 0x0BAD_CAFE, &sample_frame(format)) else {
        return;
    };

    c.bench_function("decipher_addendum2", |b| {
        b.iter(|| cipher::decode(format.iv_seed(), std::hint::black_box(&wire)))
    });

    c.bench_function("decipher_and_decode_addendum2", |b| {
        b.iter(|| decipher_and_decode(format, std::hint::black_box(&wire)))
    });
}

criterion_group!(benches, bench_decode, bench_decipher);
criterion_main!(benches);
