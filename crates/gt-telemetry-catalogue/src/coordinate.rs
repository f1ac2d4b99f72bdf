//! World coordinates and their quantised lookup keys.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CatalogueError;

/// Raw world-space position in metres.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Coordinate {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Per-axis quantisation step. Every step is at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Resolution {
    x: i16,
    y: i16,
    z: i16,
}

impl Resolution {
    /// Steps below 1 are raised to 1.
    pub const fn new(x: i16, y: i16, z: i16) -> Self {
        const fn at_least_one(v: i16) -> i16 {
            if v < 1 { 1 } else { v }
        }
        Self {
            x: at_least_one(x),
            y: at_least_one(y),
            z: at_least_one(z),
        }
    }

    pub const fn x(self) -> i16 {
        self.x
    }

    pub const fn y(self) -> i16 {
        self.y
    }

    pub const fn z(self) -> i16 {
        self.z
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::new(16, 2, 16)
    }
}

/// Integer grid coordinate used as a catalogue key.
///
/// Renders as `x:X,y:Y,z:Z`, which is also the key format in circuit JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct QuantisedCoordinate {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

/// Truncate `value` toward zero onto a multiple of `step`.
///
/// The step count is clamped so that the result fits in an `i16` and is
/// itself a multiple of `step`; quantising an already-quantised value is then
/// a no-op even at the edges of the range.
fn quantise_axis(value: f32, step: i16) -> i16 {
    let step = i32::from(step.max(1));
    let lo = i32::from(i16::MIN) / step;
    let hi = i32::from(i16::MAX) / step;
    // Float to int casts saturate and map NaN to 0.
    let steps = ((value / step as f32) as i32).clamp(lo, hi);
    i16::try_from(steps * step).unwrap_or_default()
}

impl QuantisedCoordinate {
    pub const fn new(x: i16, y: i16, z: i16) -> Self {
        Self { x, y, z }
    }

    /// Quantise a raw coordinate at `resolution`.
    pub fn quantise(coord: Coordinate, resolution: Resolution) -> Self {
        Self {
            x: quantise_axis(coord.x, resolution.x),
            y: quantise_axis(coord.y, resolution.y),
            z: quantise_axis(coord.z, resolution.z),
        }
    }

    /// Re-quantise an existing key at another resolution.
    pub fn requantise(self, resolution: Resolution) -> Self {
        Self::quantise(Coordinate::from(self), resolution)
    }
}

impl From<QuantisedCoordinate> for Coordinate {
    fn from(q: QuantisedCoordinate) -> Self {
        Self::new(f32::from(q.x), f32::from(q.y), f32::from(q.z))
    }
}

impl fmt::Display for QuantisedCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x:{},y:{},z:{}", self.x, self.y, self.z)
    }
}

impl FromStr for QuantisedCoordinate {
    type Err = CatalogueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| CatalogueError::InvalidKey {
            key: s.to_owned(),
            reason: reason.to_owned(),
        };

        let mut axes = [None; 3];
        for part in s.split(',') {
            let (name, value) = part
                .trim()
                .split_once(':')
                .ok_or_else(|| invalid("expected axis:value"))?;
            let slot = match name {
                "x" => 0,
                "y" => 1,
                "z" => 2,
                _ => return Err(invalid("unknown axis")),
            };
            let value: i16 = value
                .trim()
                .parse()
                .map_err(|e: core::num::ParseIntError| invalid(&e.to_string()))?;
            if let Some(axis) = axes.get_mut(slot) {
                if axis.replace(value).is_some() {
                    return Err(invalid("repeated axis"));
                }
            }
        }

        match axes {
            [Some(x), Some(y), Some(z)] => Ok(Self { x, y, z }),
            _ => Err(invalid("missing axis")),
        }
    }
}
