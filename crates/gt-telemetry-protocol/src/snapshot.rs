//! Typed per-frame telemetry state.

use serde::{Deserialize, Serialize};

use crate::format::TelemetryFormat;

/// Three-component float vector.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean length.
    pub fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Per-wheel values ordered front-left, front-right, rear-left, rear-right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CornerSet<T> {
    pub front_left: T,
    pub front_right: T,
    pub rear_left: T,
    pub rear_right: T,
}

impl<T: Copy> CornerSet<T> {
    pub const fn new(front_left: T, front_right: T, rear_left: T, rear_right: T) -> Self {
        Self {
            front_left,
            front_right,
            rear_left,
            rear_right,
        }
    }

    /// Same value on all four corners.
    pub const fn splat(value: T) -> Self {
        Self::new(value, value, value, value)
    }

    pub const fn from_array(values: [T; 4]) -> Self {
        let [front_left, front_right, rear_left, rear_right] = values;
        Self::new(front_left, front_right, rear_left, rear_right)
    }

    pub const fn to_array(&self) -> [T; 4] {
        [
            self.front_left,
            self.front_right,
            self.rear_left,
            self.rear_right,
        ]
    }

    /// Apply `f` to every corner.
    pub fn map<U: Copy>(&self, mut f: impl FnMut(T) -> U) -> CornerSet<U> {
        CornerSet::new(
            f(self.front_left),
            f(self.front_right),
            f(self.rear_left),
            f(self.rear_right),
        )
    }

    /// Combine two corner sets corner by corner.
    pub fn zip_with<U: Copy, V: Copy>(
        &self,
        other: &CornerSet<U>,
        mut f: impl FnMut(T, U) -> V,
    ) -> CornerSet<V> {
        CornerSet::new(
            f(self.front_left, other.front_left),
            f(self.front_right, other.front_right),
            f(self.rear_left, other.rear_left),
            f(self.rear_right, other.rear_right),
        )
    }
}

/// Rotational envelope, each axis normalised to [-1, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rotation {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

/// Translational envelope (Addendum 1 and later).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Translation {
    pub sway: f32,
    pub heave: f32,
    pub surge: f32,
}

/// Status flag word, least-significant bit first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Flags(u16);

impl Flags {
    pub const LIVE: u16 = 1 << 0;
    pub const PAUSED: u16 = 1 << 1;
    pub const LOADING: u16 = 1 << 2;
    pub const IN_GEAR: u16 = 1 << 3;
    pub const HAS_TURBO: u16 = 1 << 4;
    pub const REV_LIMITER: u16 = 1 << 5;
    pub const HANDBRAKE: u16 = 1 << 6;
    pub const HEADLIGHTS: u16 = 1 << 7;
    pub const HIGH_BEAM: u16 = 1 << 8;
    pub const LOW_BEAM: u16 = 1 << 9;
    pub const ASM: u16 = 1 << 10;
    pub const TCS: u16 = 1 << 11;
    pub const FLAG13: u16 = 1 << 12;
    pub const FLAG14: u16 = 1 << 13;
    pub const FLAG15: u16 = 1 << 14;
    pub const FLAG16: u16 = 1 << 15;

    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn contains(self, mask: u16) -> bool {
        self.0 & mask == mask
    }

    /// Car is on track and the simulation is running (not a replay).
    pub const fn live(self) -> bool {
        self.contains(Self::LIVE)
    }

    pub const fn paused(self) -> bool {
        self.contains(Self::PAUSED)
    }

    pub const fn loading(self) -> bool {
        self.contains(Self::LOADING)
    }

    pub const fn in_gear(self) -> bool {
        self.contains(Self::IN_GEAR)
    }

    pub const fn has_turbo(self) -> bool {
        self.contains(Self::HAS_TURBO)
    }

    pub const fn rev_limiter(self) -> bool {
        self.contains(Self::REV_LIMITER)
    }

    pub const fn handbrake(self) -> bool {
        self.contains(Self::HANDBRAKE)
    }

    pub const fn headlights(self) -> bool {
        self.contains(Self::HEADLIGHTS)
    }

    pub const fn high_beam(self) -> bool {
        self.contains(Self::HIGH_BEAM)
    }

    pub const fn low_beam(self) -> bool {
        self.contains(Self::LOW_BEAM)
    }

    pub const fn asm(self) -> bool {
        self.contains(Self::ASM)
    }

    pub const fn tcs(self) -> bool {
        self.contains(Self::TCS)
    }

    pub const fn flag13(self) -> bool {
        self.contains(Self::FLAG13)
    }

    pub const fn flag14(self) -> bool {
        self.contains(Self::FLAG14)
    }

    pub const fn flag15(self) -> bool {
        self.contains(Self::FLAG15)
    }

    pub const fn flag16(self) -> bool {
        self.contains(Self::FLAG16)
    }
}

/// Transmission byte: low nibble current gear, high nibble suggested gear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transmission(u8);

impl Transmission {
    /// Gear value meaning reverse.
    pub const REVERSE: u8 = 0;
    /// Gear value meaning neutral (or no suggestion, for the suggested gear).
    pub const NEUTRAL: u8 = 15;

    pub const fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u8 {
        self.0
    }

    /// 0 = reverse, 1–14 = forward, 15 = neutral.
    pub const fn current_gear(self) -> u8 {
        self.0 & 0x0F
    }

    /// Gear the game suggests; 15 when there is no suggestion.
    pub const fn suggested_gear(self) -> u8 {
        self.0 >> 4
    }
}

/// Fields carried by Addendum 1 packets (length > 296).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SectionB {
    /// Steering wheel angle in radians.
    pub steering_wheel_angle: f32,
    pub steering_wheel_force_feedback: f32,
    pub translation: Translation,
}

/// Fields carried by Addendum 2 packets (length > 316).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SectionTilde {
    pub throttle_input: u8,
    pub brake_output: u8,
    pub unknown_bytes: [u8; 2],
    /// Unlabelled per-corner values that track torque vectoring.
    pub torque_vector: CornerSet<f32>,
    pub energy_recovery: f32,
    pub unknown_float: f32,
}

/// One decoded telemetry frame.
///
/// Raw values are kept as sent: wheel angular speeds keep their sign and lap
/// times keep the `-1` sentinel. Derived quantities live in the client crate.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub magic: u32,
    /// Metres.
    pub position: Vector3,
    /// Metres per second.
    pub velocity: Vector3,
    pub rotation: Rotation,
    /// Heading in [0, 1].
    pub heading: f32,
    /// Radians per second.
    pub angular_velocity: Vector3,
    /// Metres.
    pub ride_height: f32,
    pub engine_rpm: f32,
    pub fuel_level: f32,
    pub fuel_capacity: f32,
    /// Metres per second.
    pub ground_speed: f32,
    /// Bar, absolute.
    pub manifold_pressure: f32,
    pub oil_pressure: f32,
    pub water_temperature: f32,
    pub oil_temperature: f32,
    pub tyre_temperature: CornerSet<f32>,
    pub sequence_id: u32,
    pub current_lap: i16,
    pub race_laps: i16,
    /// Milliseconds; -1 when unset.
    pub best_lap_time: i32,
    /// Milliseconds; -1 when unset.
    pub last_lap_time: i32,
    /// Milliseconds since midnight.
    pub time_of_day: u32,
    pub starting_position: i16,
    pub race_entrants: i16,
    pub rev_light_min_rpm: u16,
    pub rev_light_max_rpm: u16,
    /// km/h.
    pub calculated_max_speed: u16,
    pub flags: Flags,
    pub transmission: Transmission,
    pub throttle_output: u8,
    pub brake_input: u8,
    pub road_plane: Vector3,
    pub road_plane_distance: u32,
    /// Radians per second, signed.
    pub wheel_angular_speed: CornerSet<f32>,
    /// Metres.
    pub tyre_radius: CornerSet<f32>,
    /// Metres.
    pub suspension_height: CornerSet<f32>,
    pub clutch_actuation: f32,
    pub clutch_engagement: f32,
    pub clutch_output_rpm: f32,
    pub transmission_top_speed_ratio: f32,
    /// Trailing zero entries are unused slots.
    pub gear_ratios: [f32; 8],
    pub vehicle_id: u32,
    pub section_b: Option<SectionB>,
    pub section_tilde: Option<SectionTilde>,
}

impl Snapshot {
    /// Format implied by the sections present in the frame.
    pub const fn telemetry_format(&self) -> TelemetryFormat {
        if self.section_tilde.is_some() {
            TelemetryFormat::Addendum2
        } else if self.section_b.is_some() {
            TelemetryFormat::Addendum1
        } else {
            TelemetryFormat::Standard
        }
    }

    pub const fn section_b(&self) -> Option<&SectionB> {
        self.section_b.as_ref()
    }

    pub const fn section_tilde(&self) -> Option<&SectionTilde> {
        self.section_tilde.as_ref()
    }

    pub const fn current_gear(&self) -> u8 {
        self.transmission.current_gear()
    }

    pub const fn suggested_gear(&self) -> u8 {
        self.transmission.suggested_gear()
    }

    /// Steering wheel angle in radians; 0 without section B.
    pub fn steering_wheel_angle(&self) -> f32 {
        self.section_b.map_or(0.0, |b| b.steering_wheel_angle)
    }

    /// Steering wheel force feedback; 0 without section B.
    pub fn steering_wheel_force_feedback(&self) -> f32 {
        self.section_b.map_or(0.0, |b| b.steering_wheel_force_feedback)
    }

    /// Translational envelope; zero without section B.
    pub fn translation(&self) -> Translation {
        self.section_b.map(|b| b.translation).unwrap_or_default()
    }

    /// Throttle pedal input; 0 without section ~.
    pub fn throttle_input(&self) -> u8 {
        self.section_tilde.map_or(0, |t| t.throttle_input)
    }

    /// Brake output after assists; 0 without section ~.
    pub fn brake_output(&self) -> u8 {
        self.section_tilde.map_or(0, |t| t.brake_output)
    }

    /// Energy recovery; 0 without section ~.
    pub fn energy_recovery(&self) -> f32 {
        self.section_tilde.map_or(0.0, |t| t.energy_recovery)
    }

    /// Index and value of the last non-zero gear ratio.
    pub fn top_gear_ratio(&self) -> Option<(usize, f32)> {
        self.gear_ratios
            .iter()
            .copied()
            .enumerate()
            .rev()
            .find(|(_, ratio)| *ratio != 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_lsb_first() {
        let flags = Flags::from_bits(0b0000_1100_0000_0001);
        assert!(flags.live());
        assert!(!flags.paused());
        assert!(flags.asm());
        assert!(flags.tcs());
        assert!(!flags.flag16());
        assert!(Flags::from_bits(0x8000).flag16());
    }

    #[test]
    fn test_transmission_nibbles() {
        let t = Transmission::from_raw((4 << 4) | 3);
        assert_eq!(t.current_gear(), 3);
        assert_eq!(t.suggested_gear(), 4);
        let t = Transmission::from_raw(0xFF);
        assert_eq!(t.current_gear(), Transmission::NEUTRAL);
        assert_eq!(t.suggested_gear(), Transmission::NEUTRAL);
    }

    #[test]
    fn test_missing_sections_read_as_zero() {
        let snapshot = Snapshot::default();
        assert_eq!(snapshot.steering_wheel_angle(), 0.0);
        assert_eq!(snapshot.translation(), Translation::default());
        assert_eq!(snapshot.throttle_input(), 0);
        assert_eq!(snapshot.energy_recovery(), 0.0);
        assert_eq!(snapshot.telemetry_format(), TelemetryFormat::Standard);
    }

    #[test]
    fn test_top_gear_ratio_skips_trailing_zeros() {
        let snapshot = Snapshot {
            gear_ratios: [3.2, 2.1, 1.5, 1.2, 1.0, 0.85, 0.0, 0.0],
            ..Snapshot::default()
        };
        assert_eq!(snapshot.top_gear_ratio(), Some((5, 0.85)));
        assert_eq!(Snapshot::default().top_gear_ratio(), None);
    }

    #[test]
    fn test_corner_set_helpers() {
        let radius = CornerSet::from_array([0.3, 0.3, 0.32, 0.32]);
        let diameter = radius.map(|r| r * 2.0);
        assert_eq!(diameter.to_array(), [0.6, 0.6, 0.64, 0.64]);
        let sum = radius.zip_with(&CornerSet::splat(1.0), |a, b| a + b);
        assert_eq!(sum.rear_left, 1.32);
    }
}
