//! Scalar unit conversions.

/// km/h per m/s.
pub const KMH_PER_MPS: f32 = 3.6;
/// mph per m/s.
pub const MPH_PER_MPS: f32 = 2.236_936;
/// km per mile.
pub const KM_PER_MILE: f32 = 1.609_344;
/// psi per bar.
pub const PSI_PER_BAR: f32 = 14.503_774;
/// inHg per bar.
pub const INHG_PER_BAR: f32 = 29.529_983;
/// kPa per bar.
pub const KPA_PER_BAR: f32 = 100.0;
/// US gallons per litre.
pub const GALLONS_PER_LITRE: f32 = 0.264_172;
/// Feet per metre.
pub const FEET_PER_METRE: f32 = 3.280_84;
/// Millimetres per inch.
pub const MM_PER_INCH: f32 = 25.4;

pub fn mps_to_kmh(v: f32) -> f32 {
    v * KMH_PER_MPS
}

pub fn mps_to_mph(v: f32) -> f32 {
    v * MPH_PER_MPS
}

pub fn kmh_to_mph(v: f32) -> f32 {
    v / KM_PER_MILE
}

pub fn mph_to_kmh(v: f32) -> f32 {
    v * KM_PER_MILE
}

pub fn bar_to_psi(v: f32) -> f32 {
    v * PSI_PER_BAR
}

pub fn bar_to_inhg(v: f32) -> f32 {
    v * INHG_PER_BAR
}

pub fn bar_to_kpa(v: f32) -> f32 {
    v * KPA_PER_BAR
}

pub fn celsius_to_fahrenheit(c: f32) -> f32 {
    c * 9.0 / 5.0 + 32.0
}

pub fn fahrenheit_to_celsius(f: f32) -> f32 {
    (f - 32.0) * 5.0 / 9.0
}

pub fn litres_to_gallons(v: f32) -> f32 {
    v * GALLONS_PER_LITRE
}

pub fn gallons_to_litres(v: f32) -> f32 {
    v / GALLONS_PER_LITRE
}

pub fn metres_to_feet(v: f32) -> f32 {
    v * FEET_PER_METRE
}

pub fn millimetres_to_inches(v: f32) -> f32 {
    v / MM_PER_INCH
}

/// Radians per second to revolutions per minute.
pub fn rad_per_sec_to_rpm(v: f32) -> f32 {
    v * 60.0 / core::f32::consts::TAU
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_values() {
        assert!((mps_to_kmh(10.0) - 36.0).abs() < 1e-4);
        assert!((kmh_to_mph(160.934_4) - 100.0).abs() < 1e-3);
        assert!((bar_to_psi(1.0) - 14.503_774).abs() < 1e-6);
        assert!((bar_to_kpa(1.5) - 150.0).abs() < 1e-4);
        assert!((celsius_to_fahrenheit(100.0) - 212.0).abs() < 1e-4);
        assert!((celsius_to_fahrenheit(-40.0) + 40.0).abs() < 1e-4);
        assert!((millimetres_to_inches(25.4) - 1.0).abs() < 1e-6);
        assert!((rad_per_sec_to_rpm(core::f32::consts::TAU) - 60.0).abs() < 1e-4);
    }

    #[test]
    fn test_mps_to_mph_matches_kmh_path() {
        let direct = mps_to_mph(27.0);
        let via_kmh = kmh_to_mph(mps_to_kmh(27.0));
        assert!((direct - via_kmh).abs() < 1e-3);
    }
}
