//! Fixed-offset decoder for deciphered frames.
//!
//! All multi-byte fields are little-endian. Fields are read in wire order by a
//! cursor, and every read is bounds-checked so a truncated frame yields
//! [`DecodeError::UnexpectedEof`] naming the field that ran off the end.

use crate::MAGIC;
use crate::error::DecodeError;
use crate::format::{ADDENDUM1_PACKET_LEN, STANDARD_PACKET_LEN};
use crate::snapshot::{
    CornerSet, Flags, Rotation, SectionB, SectionTilde, Snapshot, Transmission, Translation,
    Vector3,
};

/// Byte offsets of every field in a deciphered frame.
pub mod offsets {
    pub const MAGIC: usize = 0x00;
    pub const POSITION: usize = 0x04;
    pub const VELOCITY: usize = 0x10;
    pub const ROTATION: usize = 0x1C;
    pub const HEADING: usize = 0x28;
    pub const ANGULAR_VELOCITY: usize = 0x2C;
    pub const RIDE_HEIGHT: usize = 0x38;
    pub const ENGINE_RPM: usize = 0x3C;
    /// Cipher IV; meaningless after deciphering.
    pub const IV: usize = 0x40;
    pub const FUEL_LEVEL: usize = 0x44;
    pub const FUEL_CAPACITY: usize = 0x48;
    pub const GROUND_SPEED: usize = 0x4C;
    pub const MANIFOLD_PRESSURE: usize = 0x50;
    pub const OIL_PRESSURE: usize = 0x54;
    pub const WATER_TEMPERATURE: usize = 0x58;
    pub const OIL_TEMPERATURE: usize = 0x5C;
    pub const TYRE_TEMPERATURE: usize = 0x60;
    pub const SEQUENCE_ID: usize = 0x70;
    pub const CURRENT_LAP: usize = 0x74;
    pub const RACE_LAPS: usize = 0x76;
    pub const BEST_LAP_TIME: usize = 0x78;
    pub const LAST_LAP_TIME: usize = 0x7C;
    pub const TIME_OF_DAY: usize = 0x80;
    pub const STARTING_POSITION: usize = 0x84;
    pub const RACE_ENTRANTS: usize = 0x86;
    pub const REV_LIGHT_MIN: usize = 0x88;
    pub const REV_LIGHT_MAX: usize = 0x8A;
    pub const CALCULATED_MAX_SPEED: usize = 0x8C;
    pub const FLAGS: usize = 0x8E;
    pub const TRANSMISSION: usize = 0x90;
    pub const THROTTLE_OUTPUT: usize = 0x91;
    pub const BRAKE_INPUT: usize = 0x92;
    pub const RESERVED_BYTE: usize = 0x93;
    pub const ROAD_PLANE: usize = 0x94;
    pub const ROAD_PLANE_DISTANCE: usize = 0xA0;
    pub const WHEEL_ANGULAR_SPEED: usize = 0xA4;
    pub const TYRE_RADIUS: usize = 0xB4;
    pub const SUSPENSION_HEIGHT: usize = 0xC4;
    pub const RESERVED_BLOCK: usize = 0xD4;
    pub const CLUTCH_ACTUATION: usize = 0xF4;
    pub const CLUTCH_ENGAGEMENT: usize = 0xF8;
    pub const CLUTCH_OUTPUT_RPM: usize = 0xFC;
    pub const TOP_SPEED_RATIO: usize = 0x100;
    pub const GEAR_RATIOS: usize = 0x104;
    pub const VEHICLE_ID: usize = 0x124;

    pub const STEERING_WHEEL_ANGLE: usize = 0x128;
    pub const STEERING_WHEEL_FFB: usize = 0x12C;
    pub const TRANSLATION: usize = 0x130;

    pub const THROTTLE_INPUT: usize = 0x13C;
    pub const BRAKE_OUTPUT: usize = 0x13D;
    pub const UNKNOWN_BYTES: usize = 0x13E;
    pub const TORQUE_VECTOR: usize = 0x140;
    pub const ENERGY_RECOVERY: usize = 0x150;
    pub const UNKNOWN_FLOAT: usize = 0x154;
}

const RESERVED_BLOCK_LEN: usize = 32;

/// Sequential little-endian reader over a frame.
struct FieldReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> FieldReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N], DecodeError> {
        let bytes = self
            .data
            .get(self.pos..self.pos + N)
            .and_then(|b| <[u8; N]>::try_from(b).ok())
            .ok_or(DecodeError::UnexpectedEof {
                field,
                offset: self.pos,
                len: self.data.len(),
            })?;
        self.pos += N;
        Ok(bytes)
    }

    fn skip(&mut self, n: usize, field: &'static str) -> Result<(), DecodeError> {
        if self.pos + n > self.data.len() {
            return Err(DecodeError::UnexpectedEof {
                field,
                offset: self.pos,
                len: self.data.len(),
            });
        }
        self.pos += n;
        Ok(())
    }

    fn u8(&mut self, field: &'static str) -> Result<u8, DecodeError> {
        self.take::<1>(field).map(|[b]| b)
    }

    fn u16(&mut self, field: &'static str) -> Result<u16, DecodeError> {
        self.take(field).map(u16::from_le_bytes)
    }

    fn i16(&mut self, field: &'static str) -> Result<i16, DecodeError> {
        self.take(field).map(i16::from_le_bytes)
    }

    fn u32(&mut self, field: &'static str) -> Result<u32, DecodeError> {
        self.take(field).map(u32::from_le_bytes)
    }

    fn i32(&mut self, field: &'static str) -> Result<i32, DecodeError> {
        self.take(field).map(i32::from_le_bytes)
    }

    fn f32(&mut self, field: &'static str) -> Result<f32, DecodeError> {
        self.take(field).map(f32::from_le_bytes)
    }

    fn vector3(&mut self, field: &'static str) -> Result<Vector3, DecodeError> {
        Ok(Vector3::new(self.f32(field)?, self.f32(field)?, self.f32(field)?))
    }

    fn corners(&mut self, field: &'static str) -> Result<CornerSet<f32>, DecodeError> {
        Ok(CornerSet::new(
            self.f32(field)?,
            self.f32(field)?,
            self.f32(field)?,
            self.f32(field)?,
        ))
    }
}

/// Decode a deciphered frame into a [`Snapshot`].
///
/// Frames longer than 296 bytes must carry all of section B, and frames longer
/// than 316 bytes all of section ~.
///
/// # Errors
///
/// - [`DecodeError::ShortPacket`] when the frame is too short for its magic
///   word or for a standard packet.
/// - [`DecodeError::BadMagic`] when bytes 0..4 are not [`MAGIC`].
/// - [`DecodeError::UnexpectedEof`] when an optional section is truncated.
pub fn decode(frame: &[u8]) -> Result<Snapshot, DecodeError> {
    if frame.len() < 4 {
        return Err(DecodeError::ShortPacket {
            len: frame.len(),
            min: STANDARD_PACKET_LEN,
        });
    }
    let mut r = FieldReader::new(frame);

    let magic = r.u32("magic")?;
    if magic != MAGIC {
        return Err(DecodeError::BadMagic {
            expected: MAGIC,
            found: magic,
        });
    }
    if frame.len() < STANDARD_PACKET_LEN {
        return Err(DecodeError::ShortPacket {
            len: frame.len(),
            min: STANDARD_PACKET_LEN,
        });
    }

    let mut s = Snapshot {
        magic,
        ..Snapshot::default()
    };

    s.position = r.vector3("position")?;
    s.velocity = r.vector3("velocity")?;
    s.rotation = Rotation {
        pitch: r.f32("rotation")?,
        yaw: r.f32("rotation")?,
        roll: r.f32("rotation")?,
    };
    s.heading = r.f32("heading")?;
    s.angular_velocity = r.vector3("angular_velocity")?;
    s.ride_height = r.f32("ride_height")?;
    s.engine_rpm = r.f32("engine_rpm")?;
    r.skip(4, "iv")?;
    s.fuel_level = r.f32("fuel_level")?;
    s.fuel_capacity = r.f32("fuel_capacity")?;
    s.ground_speed = r.f32("ground_speed")?;
    s.manifold_pressure = r.f32("manifold_pressure")?;
    s.oil_pressure = r.f32("oil_pressure")?;
    s.water_temperature = r.f32("water_temperature")?;
    s.oil_temperature = r.f32("oil_temperature")?;
    s.tyre_temperature = r.corners("tyre_temperature")?;
    s.sequence_id = r.u32("sequence_id")?;
    s.current_lap = r.i16("current_lap")?;
    s.race_laps = r.i16("race_laps")?;
    s.best_lap_time = r.i32("best_lap_time")?;
    s.last_lap_time = r.i32("last_lap_time")?;
    s.time_of_day = r.u32("time_of_day")?;
    s.starting_position = r.i16("starting_position")?;
    s.race_entrants = r.i16("race_entrants")?;
    s.rev_light_min_rpm = r.u16("rev_light_min_rpm")?;
    s.rev_light_max_rpm = r.u16("rev_light_max_rpm")?;
    s.calculated_max_speed = r.u16("calculated_max_speed")?;
    s.flags = Flags::from_bits(r.u16("flags")?);
    s.transmission = Transmission::from_raw(r.u8("transmission")?);
    s.throttle_output = r.u8("throttle_output")?;
    s.brake_input = r.u8("brake_input")?;
    r.skip(1, "reserved")?;
    s.road_plane = r.vector3("road_plane")?;
    s.road_plane_distance = r.u32("road_plane_distance")?;
    s.wheel_angular_speed = r.corners("wheel_angular_speed")?;
    s.tyre_radius = r.corners("tyre_radius")?;
    s.suspension_height = r.corners("suspension_height")?;
    r.skip(RESERVED_BLOCK_LEN, "reserved")?;
    s.clutch_actuation = r.f32("clutch_actuation")?;
    s.clutch_engagement = r.f32("clutch_engagement")?;
    s.clutch_output_rpm = r.f32("clutch_output_rpm")?;
    s.transmission_top_speed_ratio = r.f32("transmission_top_speed_ratio")?;
    for ratio in &mut s.gear_ratios {
        *ratio = r.f32("gear_ratios")?;
    }
    s.vehicle_id = r.u32("vehicle_id")?;

    if frame.len() > STANDARD_PACKET_LEN {
        s.section_b = Some(SectionB {
            steering_wheel_angle: r.f32("steering_wheel_angle")?,
            steering_wheel_force_feedback: r.f32("steering_wheel_force_feedback")?,
            translation: Translation {
                sway: r.f32("sway")?,
                heave: r.f32("heave")?,
                surge: r.f32("surge")?,
            },
        });
    }

    if frame.len() > ADDENDUM1_PACKET_LEN {
        s.section_tilde = Some(SectionTilde {
            throttle_input: r.u8("throttle_input")?,
            brake_output: r.u8("brake_output")?,
            unknown_bytes: [r.u8("unknown_bytes")?, r.u8("unknown_bytes")?],
            torque_vector: r.corners("torque_vector")?,
            energy_recovery: r.f32("energy_recovery")?,
            unknown_float: r.f32("unknown_float")?,
        });
    }

    Ok(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{ADDENDUM2_PACKET_LEN, TelemetryFormat};

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn frame(len: usize) -> Vec<u8> {
        let mut buf = vec![0u8; len];
        buf[..4].copy_from_slice(&MAGIC.to_le_bytes());
        buf
    }

    fn put_f32(buf: &mut [u8], offset: usize, value: f32) {
        buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    fn put_u32(buf: &mut [u8], offset: usize, value: u32) {
        buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    fn put_i16(buf: &mut [u8], offset: usize, value: i16) {
        buf[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
    }

    #[test]
    fn test_offsets_end_at_section_boundaries() {
        assert_eq!(offsets::VEHICLE_ID + 4, STANDARD_PACKET_LEN);
        assert_eq!(offsets::TRANSLATION + 12, ADDENDUM1_PACKET_LEN);
        assert_eq!(offsets::UNKNOWN_FLOAT + 4, ADDENDUM2_PACKET_LEN);
        assert_eq!(offsets::CLUTCH_ACTUATION, offsets::RESERVED_BLOCK + RESERVED_BLOCK_LEN);
    }

    #[test]
    fn test_decode_standard_fields() -> TestResult {
        let mut buf = frame(STANDARD_PACKET_LEN);
        put_f32(&mut buf, offsets::POSITION, 12.5);
        put_f32(&mut buf, offsets::POSITION + 8, -3.0);
        put_f32(&mut buf, offsets::ENGINE_RPM, 7200.0);
        put_f32(&mut buf, offsets::IV, 1.0e9);
        put_f32(&mut buf, offsets::FUEL_LEVEL, 40.0);
        put_f32(&mut buf, offsets::FUEL_CAPACITY, 80.0);
        put_f32(&mut buf, offsets::GROUND_SPEED, 50.0);
        put_u32(&mut buf, offsets::SEQUENCE_ID, 1234);
        put_i16(&mut buf, offsets::CURRENT_LAP, 3);
        put_i16(&mut buf, offsets::RACE_LAPS, 5);
        buf[offsets::BEST_LAP_TIME..offsets::BEST_LAP_TIME + 4]
            .copy_from_slice(&(-1i32).to_le_bytes());
        buf[offsets::FLAGS..offsets::FLAGS + 2].copy_from_slice(&0x0009u16.to_le_bytes());
        buf[offsets::TRANSMISSION] = 0x34;
        buf[offsets::THROTTLE_OUTPUT] = 255;
        put_f32(&mut buf, offsets::WHEEL_ANGULAR_SPEED, -42.0);
        put_f32(&mut buf, offsets::TYRE_RADIUS + 12, 0.33);
        put_f32(&mut buf, offsets::GEAR_RATIOS, 3.5);
        put_u32(&mut buf, offsets::VEHICLE_ID, 3361);

        let s = decode(&buf)?;
        assert_eq!(s.magic, MAGIC);
        assert_eq!(s.position, Vector3::new(12.5, 0.0, -3.0));
        assert_eq!(s.engine_rpm, 7200.0);
        assert_eq!(s.fuel_level, 40.0);
        assert_eq!(s.fuel_capacity, 80.0);
        assert_eq!(s.ground_speed, 50.0);
        assert_eq!(s.sequence_id, 1234);
        assert_eq!(s.current_lap, 3);
        assert_eq!(s.race_laps, 5);
        assert_eq!(s.best_lap_time, -1);
        assert!(s.flags.live());
        assert!(s.flags.in_gear());
        assert_eq!(s.current_gear(), 4);
        assert_eq!(s.suggested_gear(), 3);
        assert_eq!(s.throttle_output, 255);
        assert_eq!(s.wheel_angular_speed.front_left, -42.0);
        assert_eq!(s.tyre_radius.rear_right, 0.33);
        assert_eq!(s.gear_ratios[0], 3.5);
        assert_eq!(s.vehicle_id, 3361);
        assert!(s.section_b.is_none());
        assert!(s.section_tilde.is_none());
        Ok(())
    }

    #[test]
    fn test_decode_addendum_sections() -> TestResult {
        let mut buf = frame(ADDENDUM2_PACKET_LEN);
        put_f32(&mut buf, offsets::STEERING_WHEEL_ANGLE, 0.5);
        put_f32(&mut buf, offsets::TRANSLATION + 8, -0.25);
        buf[offsets::THROTTLE_INPUT] = 200;
        buf[offsets::BRAKE_OUTPUT] = 10;
        put_f32(&mut buf, offsets::TORQUE_VECTOR + 4, 1.5);
        put_f32(&mut buf, offsets::ENERGY_RECOVERY, 12.0);

        let s = decode(&buf)?;
        assert_eq!(s.telemetry_format(), TelemetryFormat::Addendum2);
        assert_eq!(s.steering_wheel_angle(), 0.5);
        assert_eq!(s.translation().surge, -0.25);
        assert_eq!(s.throttle_input(), 200);
        assert_eq!(s.brake_output(), 10);
        assert_eq!(s.energy_recovery(), 12.0);
        let tilde = s.section_tilde.ok_or("section ~ missing")?;
        assert_eq!(tilde.torque_vector.front_right, 1.5);
        Ok(())
    }

    #[test]
    fn test_decode_addendum1_only() -> TestResult {
        let mut buf = frame(ADDENDUM1_PACKET_LEN);
        put_f32(&mut buf, offsets::STEERING_WHEEL_FFB, 0.75);
        let s = decode(&buf)?;
        assert_eq!(s.telemetry_format(), TelemetryFormat::Addendum1);
        assert_eq!(s.steering_wheel_force_feedback(), 0.75);
        assert!(s.section_tilde.is_none());
        Ok(())
    }

    #[test]
    fn test_bad_magic_checked_first() {
        let buf = vec![0u8; 10];
        assert_eq!(
            decode(&buf),
            Err(DecodeError::BadMagic { expected: MAGIC, found: 0 })
        );
    }

    #[test]
    fn test_short_packet() {
        assert_eq!(
            decode(&frame(100)),
            Err(DecodeError::ShortPacket { len: 100, min: 296 })
        );
        assert_eq!(
            decode(&[0x30, 0x53]),
            Err(DecodeError::ShortPacket { len: 2, min: 296 })
        );
    }

    #[test]
    fn test_magic_word_boundary() {
        assert_eq!(
            decode(&[0x30, 0x53, 0x37]),
            Err(DecodeError::ShortPacket { len: 3, min: 296 })
        );
        assert_eq!(
            decode(&[0xEF, 0xBE, 0xAD, 0xDE]),
            Err(DecodeError::BadMagic { expected: MAGIC, found: 0xDEAD_BEEF })
        );
        assert_eq!(
            decode(&MAGIC.to_le_bytes()),
            Err(DecodeError::ShortPacket { len: 4, min: 296 })
        );
    }

    #[test]
    fn test_truncated_section_b() {
        let result = decode(&frame(300));
        assert_eq!(
            result,
            Err(DecodeError::UnexpectedEof {
                field: "steering_wheel_force_feedback",
                offset: offsets::STEERING_WHEEL_FFB,
                len: 300,
            })
        );
    }

    #[test]
    fn test_truncated_section_tilde() {
        let result = decode(&frame(330));
        assert!(matches!(
            result,
            Err(DecodeError::UnexpectedEof {
                field: "torque_vector",
                len: 330,
                ..
            })
        ));
    }

    #[test]
    fn test_iv_bytes_ignored() -> TestResult {
        let mut a = frame(STANDARD_PACKET_LEN);
        let b = a.clone();
        put_u32(&mut a, offsets::IV, 0xFFFF_FFFF);
        assert_eq!(decode(&a)?, decode(&b)?);
        Ok(())
    }

    #[test]
    fn test_non_finite_floats_pass_through() -> TestResult {
        let mut buf = frame(STANDARD_PACKET_LEN);
        put_f32(&mut buf, offsets::ENGINE_RPM, f32::INFINITY);
        let s = decode(&buf)?;
        assert!(s.engine_rpm.is_infinite());
        Ok(())
    }
}
