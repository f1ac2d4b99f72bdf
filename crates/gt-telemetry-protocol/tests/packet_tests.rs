//! End-to-end tests through the public decipher-and-decode path.

use gt_telemetry_protocol::{
    CipherError, DecodeError, MAGIC, PacketError, TelemetryFormat, cipher, decode,
    decipher_and_decode, offsets,
};

type TestResult = Result<(), Box<dyn std::error::Error>>;

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn frame(format: TelemetryFormat) -> Vec<u8> {
    let mut buf = vec![0u8; format.packet_len()];
    buf[..4].copy_from_slice(&MAGIC.to_le_bytes());
    buf
}

fn write_f32_le(buf: &mut [u8], offset: usize, value: f32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

// ─── Magic ───────────────────────────────────────────────────────────────────

#[test]
fn zero_magic_is_rejected_by_decoder() -> TestResult {
    let buf = vec![0u8; TelemetryFormat::Standard.packet_len()];
    let err = decode(&buf).err().ok_or("zero magic must not decode")?;
    assert_eq!(err, DecodeError::BadMagic { expected: MAGIC, found: 0 });
    Ok(())
}

#[test]
fn wrong_format_seed_is_a_cipher_error() -> TestResult {
    let plain = frame(TelemetryFormat::Addendum2);
    let wire = cipher::encode(TelemetryFormat::Addendum2.iv_seed(), 77, &plain)?;
    let result = decipher_and_decode(TelemetryFormat::Standard, &wire);
    assert!(matches!(
        result,
        Err(PacketError::Cipher(CipherError::InvalidMagic { .. }))
    ));
    Ok(())
}

// ─── Section gating ──────────────────────────────────────────────────────────

#[test]
fn standard_frame_has_no_addendum_fields() -> TestResult {
    let mut plain = frame(TelemetryFormat::Standard);
    write_f32_le(&mut plain, offsets::ENGINE_RPM, 4000.0);
    let wire = cipher::encode(TelemetryFormat::Standard.iv_seed(), 1, &plain)?;

    let snapshot = decipher_and_decode(TelemetryFormat::Standard, &wire)?;
    assert_eq!(snapshot.engine_rpm, 4000.0);
    assert_eq!(snapshot.steering_wheel_angle(), 0.0);
    assert_eq!(snapshot.steering_wheel_force_feedback(), 0.0);
    assert_eq!(snapshot.translation().sway, 0.0);
    assert_eq!(snapshot.telemetry_format(), TelemetryFormat::Standard);
    Ok(())
}

#[test]
fn addendum2_frame_populates_tilde_section() -> TestResult {
    let mut plain = frame(TelemetryFormat::Addendum2);
    write_f32_le(&mut plain, offsets::STEERING_WHEEL_ANGLE, -0.3);
    plain[offsets::THROTTLE_INPUT] = 128;
    plain[offsets::BRAKE_OUTPUT] = 64;
    write_f32_le(&mut plain, offsets::ENERGY_RECOVERY, 3.5);
    let wire = cipher::encode(TelemetryFormat::Addendum2.iv_seed(), 0xABCD, &plain)?;

    let snapshot = decipher_and_decode(TelemetryFormat::Addendum2, &wire)?;
    assert_eq!(snapshot.telemetry_format(), TelemetryFormat::Addendum2);
    assert_eq!(snapshot.steering_wheel_angle(), -0.3);
    assert_eq!(snapshot.throttle_input(), 128);
    assert_eq!(snapshot.brake_output(), 64);
    assert_eq!(snapshot.energy_recovery(), 3.5);
    Ok(())
}

#[test]
fn snapshot_serializes_to_json() -> TestResult {
    let snapshot = decode(&frame(TelemetryFormat::Addendum1))?;
    let json = serde_json::to_value(&snapshot)?;
    assert_eq!(json["magic"], MAGIC);
    assert!(json["section_b"].is_object());
    assert!(json["section_tilde"].is_null());
    Ok(())
}
