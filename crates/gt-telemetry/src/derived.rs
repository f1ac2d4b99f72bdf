//! Quantities derived from a snapshot and the current vehicle.
//!
//! The free functions are pure and operate on raw field values; [`Telemetry`]
//! bundles the latest snapshot with its vehicle record and exposes the same
//! derivations as methods.

use std::sync::Arc;
use std::time::Duration;

use gt_telemetry_catalogue::{Drivetrain, Vehicle};
use gt_telemetry_protocol::{CornerSet, Snapshot, TelemetryFormat, Transmission};
use serde::Serialize;

use crate::units;

/// Ground speeds below this (km/h) count as stationary for slip.
pub const SLIP_STATIONARY_KMH: f32 = 1e-4;

/// Display form of a gear value: `R`, `N` or the gear number.
pub fn gear_string(gear: u8) -> String {
    match gear {
        Transmission::REVERSE => "R".to_owned(),
        Transmission::NEUTRAL => "N".to_owned(),
        n => n.to_string(),
    }
}

/// Display form of the suggested gear; `None` when there is no suggestion.
pub fn suggested_gear_string(gear: u8) -> Option<String> {
    (gear != Transmission::NEUTRAL).then(|| gear_string(gear))
}

/// Pedal byte (0–255) as a percentage.
pub fn pedal_percent(raw: u8) -> f32 {
    f32::from(raw) / 2.55
}

/// Clutch actuation (0–1) as a percentage.
pub fn clutch_percent(actuation: f32) -> f32 {
    actuation * 100.0
}

/// Boost in bar: manifold pressure minus one atmosphere.
pub fn boost_bar(manifold_pressure: f32) -> f32 {
    manifold_pressure - 1.0
}

/// Fuel remaining as a percentage of capacity; 0 when capacity is not positive.
pub fn fuel_percent(level: f32, capacity: f32) -> f32 {
    if capacity > 0.0 {
        level / capacity * 100.0
    } else {
        0.0
    }
}

pub fn tyre_diameter(radius: f32) -> f32 {
    radius * 2.0
}

/// Linear speed of a wheel in m/s. The sign of the angular speed is dropped.
pub fn wheel_speed_mps(angular_speed: f32, radius: f32) -> f32 {
    angular_speed.abs() * radius
}

pub fn wheel_speed_kmh(angular_speed: f32, radius: f32) -> f32 {
    units::mps_to_kmh(wheel_speed_mps(angular_speed, radius))
}

/// Wheel speed over ground speed per corner.
///
/// Every corner reads exactly 1.0 while the car is stationary.
pub fn slip_ratios(
    ground_speed_mps: f32,
    angular_speed: &CornerSet<f32>,
    radius: &CornerSet<f32>,
) -> CornerSet<f32> {
    let ground_kmh = units::mps_to_kmh(ground_speed_mps);
    if ground_kmh < SLIP_STATIONARY_KMH {
        return CornerSet::splat(1.0);
    }
    angular_speed.zip_with(radius, |w, r| wheel_speed_kmh(w, r) / ground_kmh)
}

/// Wheel revolutions per minute at `speed_kmh` for a tyre of `diameter` metres.
fn wheel_rpm_at(speed_kmh: f32, diameter: f32) -> f32 {
    speed_kmh * 1000.0 / 60.0 / (core::f32::consts::PI * diameter)
}

/// Engine RPM at the calculated top speed.
///
/// Returns 0 when the rear-left tyre diameter is not positive.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn vmax_rpm(calculated_max_speed_kmh: u16, rear_left_diameter: f32, top_speed_ratio: f32) -> u16 {
    if rear_left_diameter.is_nan() || rear_left_diameter <= 0.0 {
        return 0;
    }
    let rpm = wheel_rpm_at(f32::from(calculated_max_speed_kmh), rear_left_diameter) * top_speed_ratio;
    // Saturating cast; negative and NaN become 0.
    rpm as u16
}

/// Final drive ratio inferred from the top-speed figures.
///
/// Uses the last non-zero gear ratio and the driven wheel's diameter (front
/// left for front-wheel-drive cars, rear left otherwise).
pub fn diff_ratio(snapshot: &Snapshot, drivetrain: Drivetrain) -> Option<f32> {
    let (_, top_gear) = snapshot.top_gear_ratio()?;
    let radius = if drivetrain.is_front_driven() {
        snapshot.tyre_radius.front_left
    } else {
        snapshot.tyre_radius.rear_left
    };
    let diameter = tyre_diameter(radius);
    if diameter.is_nan() || diameter <= 0.0 {
        return None;
    }

    let vmax = vmax_rpm(
        snapshot.calculated_max_speed,
        tyre_diameter(snapshot.tyre_radius.rear_left),
        snapshot.transmission_top_speed_ratio,
    );
    let wheel_rpm = wheel_rpm_at(f32::from(snapshot.calculated_max_speed), diameter);
    if vmax == 0 || wheel_rpm.is_nan() || wheel_rpm <= 0.0 {
        return None;
    }
    Some(f32::from(vmax) / top_gear / wheel_rpm)
}

/// Where the player is, as far as the packet tells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum GameState {
    MainMenu,
    RaceMenu,
    OnCircuit(Session),
}

/// Whether on-circuit data is live driving or a replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Session {
    Live,
    Replay,
}

pub fn game_state(snapshot: &Snapshot) -> GameState {
    let laps = snapshot.race_laps;
    let entrants = snapshot.race_entrants;
    if laps < 0 && entrants < 0 {
        GameState::MainMenu
    } else if laps >= 0 && entrants < 0 {
        GameState::RaceMenu
    } else if snapshot.flags.live() {
        GameState::OnCircuit(Session::Live)
    } else {
        GameState::OnCircuit(Session::Replay)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RaceType {
    TimeTrial,
    Endurance,
    Sprint,
    Unknown,
}

/// Race type inferred from entrants and lap count. Meaningful on circuit only.
pub fn race_type(snapshot: &Snapshot) -> RaceType {
    match (snapshot.race_entrants, snapshot.race_laps) {
        (entrants, 0) if entrants <= 3 => RaceType::TimeTrial,
        (entrants, 0) if entrants > 3 => RaceType::Endurance,
        (entrants, laps) if entrants > 3 && laps > 0 => RaceType::Sprint,
        _ => RaceType::Unknown,
    }
}

pub fn race_complete(snapshot: &Snapshot) -> bool {
    snapshot.race_laps >= 1 && snapshot.current_lap > snapshot.race_laps
}

/// Lap time field as a duration; `None` for the unset sentinel.
pub fn lap_time(ms: i32) -> Option<Duration> {
    u64::try_from(ms).ok().map(Duration::from_millis)
}

/// Latest snapshot paired with the vehicle it reports.
#[derive(Debug, Clone)]
pub struct Telemetry {
    snapshot: Arc<Snapshot>,
    vehicle: Arc<Vehicle>,
}

impl Telemetry {
    pub fn new(snapshot: Arc<Snapshot>, vehicle: Arc<Vehicle>) -> Self {
        Self { snapshot, vehicle }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Catalogue record for the snapshot's vehicle ID, or a placeholder.
    pub fn vehicle(&self) -> &Vehicle {
        &self.vehicle
    }

    pub fn telemetry_format(&self) -> TelemetryFormat {
        self.snapshot.telemetry_format()
    }

    pub fn current_gear(&self) -> String {
        gear_string(self.snapshot.current_gear())
    }

    pub fn suggested_gear(&self) -> Option<String> {
        suggested_gear_string(self.snapshot.suggested_gear())
    }

    pub fn speed_kmh(&self) -> f32 {
        units::mps_to_kmh(self.snapshot.ground_speed)
    }

    pub fn speed_mph(&self) -> f32 {
        units::mps_to_mph(self.snapshot.ground_speed)
    }

    pub fn throttle_percent(&self) -> f32 {
        pedal_percent(self.snapshot.throttle_output)
    }

    pub fn brake_percent(&self) -> f32 {
        pedal_percent(self.snapshot.brake_input)
    }

    /// Throttle pedal input percentage (Addendum 2 only, else 0).
    pub fn throttle_input_percent(&self) -> f32 {
        pedal_percent(self.snapshot.throttle_input())
    }

    /// Brake output percentage after assists (Addendum 2 only, else 0).
    pub fn brake_output_percent(&self) -> f32 {
        pedal_percent(self.snapshot.brake_output())
    }

    pub fn clutch_percent(&self) -> f32 {
        clutch_percent(self.snapshot.clutch_actuation)
    }

    pub fn boost_bar(&self) -> f32 {
        boost_bar(self.snapshot.manifold_pressure)
    }

    pub fn boost_psi(&self) -> f32 {
        units::bar_to_psi(self.boost_bar())
    }

    pub fn boost_inhg(&self) -> f32 {
        units::bar_to_inhg(self.boost_bar())
    }

    pub fn boost_kpa(&self) -> f32 {
        units::bar_to_kpa(self.boost_bar())
    }

    pub fn fuel_percent(&self) -> f32 {
        fuel_percent(self.snapshot.fuel_level, self.snapshot.fuel_capacity)
    }

    pub fn tyre_diameter(&self) -> CornerSet<f32> {
        self.snapshot.tyre_radius.map(tyre_diameter)
    }

    pub fn wheel_speed_kmh(&self) -> CornerSet<f32> {
        self.snapshot
            .wheel_angular_speed
            .zip_with(&self.snapshot.tyre_radius, wheel_speed_kmh)
    }

    pub fn tyre_slip_ratio(&self) -> CornerSet<f32> {
        slip_ratios(
            self.snapshot.ground_speed,
            &self.snapshot.wheel_angular_speed,
            &self.snapshot.tyre_radius,
        )
    }

    pub fn vmax_rpm(&self) -> u16 {
        vmax_rpm(
            self.snapshot.calculated_max_speed,
            tyre_diameter(self.snapshot.tyre_radius.rear_left),
            self.snapshot.transmission_top_speed_ratio,
        )
    }

    pub fn diff_ratio(&self) -> Option<f32> {
        diff_ratio(&self.snapshot, self.vehicle.drivetrain_kind())
    }

    pub fn game_state(&self) -> GameState {
        game_state(&self.snapshot)
    }

    pub fn race_type(&self) -> RaceType {
        race_type(&self.snapshot)
    }

    pub fn race_complete(&self) -> bool {
        race_complete(&self.snapshot)
    }

    pub fn best_lap_time(&self) -> Option<Duration> {
        lap_time(self.snapshot.best_lap_time)
    }

    pub fn last_lap_time(&self) -> Option<Duration> {
        lap_time(self.snapshot.last_lap_time)
    }

    /// Time of day on track.
    pub fn time_of_day(&self) -> Duration {
        Duration::from_millis(u64::from(self.snapshot.time_of_day))
    }
}
