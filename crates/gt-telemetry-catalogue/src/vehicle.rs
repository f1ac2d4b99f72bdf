//! Vehicle catalogue keyed by the packet's vehicle ID.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CatalogueError, Result};

const EMBEDDED_VEHICLES: &str = include_str!("../data/vehicles.json");

/// Static description of one car.
///
/// Field names follow the catalogue JSON. Dimensions are millimetres and
/// engine angles degrees.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Vehicle {
    #[serde(rename = "CarID")]
    pub car_id: u32,
    pub manufacturer: String,
    pub model: String,
    pub year: u16,
    pub open_cockpit: bool,
    pub car_type: String,
    pub category: String,
    pub drivetrain: String,
    pub aspiration: String,
    pub engine_layout: String,
    pub engine_bank_angle: f32,
    pub engine_crank_plane_angle: f32,
    pub length: u32,
    pub width: u32,
    pub height: u32,
    pub wheelbase: u32,
    pub track_front: u32,
    pub track_rear: u32,
}

impl Vehicle {
    /// Stand-in for an ID the catalogue does not know; only the ID is set.
    pub fn placeholder(car_id: u32) -> Self {
        Self {
            car_id,
            ..Self::default()
        }
    }

    /// Whether this record came from [`Vehicle::placeholder`].
    pub fn is_placeholder(&self) -> bool {
        self.manufacturer.is_empty() && self.model.is_empty()
    }

    pub fn drivetrain_kind(&self) -> Drivetrain {
        Drivetrain::parse(&self.drivetrain)
    }

    /// Long form of the drivetrain code, e.g. "Front-engine, rear-wheel drive".
    pub fn drivetrain_description(&self) -> String {
        match self.drivetrain_kind() {
            Drivetrain::Unknown => self.drivetrain.clone(),
            kind => kind.description().to_owned(),
        }
    }

    /// Long form of the aspiration code.
    pub fn expanded_aspiration(&self) -> String {
        expand_aspiration(&self.aspiration)
    }

    /// Human-readable car type, e.g. "Race car" for `racing`.
    pub fn car_type_label(&self) -> String {
        match self.car_type.to_ascii_lowercase().as_str() {
            "production" => "Production car".to_owned(),
            "racing" | "race" => "Race car".to_owned(),
            "concept" => "Concept car".to_owned(),
            "tuned" | "tuner" => "Tuned car".to_owned(),
            _ => self.car_type.clone(),
        }
    }

    /// "Manufacturer Model 'YY" style display name.
    pub fn display_name(&self) -> String {
        if self.is_placeholder() {
            return format!("Unknown vehicle #{}", self.car_id);
        }
        if self.year == 0 {
            format!("{} {}", self.manufacturer, self.model)
        } else {
            format!("{} {} '{:02}", self.manufacturer, self.model, self.year % 100)
        }
    }
}

/// Drivetrain layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Drivetrain {
    /// Front engine, front-wheel drive
    FrontFront,
    /// Front engine, rear-wheel drive
    FrontRear,
    /// Mid engine, rear-wheel drive
    MidRear,
    /// Rear engine, rear-wheel drive
    RearRear,
    /// Four-wheel drive
    FourWheel,
    Unknown,
}

impl Drivetrain {
    /// Parse a catalogue code such as `FF`, `FR`, `MR`, `RR` or `4WD`.
    pub fn parse(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "FF" => Self::FrontFront,
            "FR" => Self::FrontRear,
            "MR" => Self::MidRear,
            "RR" => Self::RearRear,
            "4WD" | "AWD" => Self::FourWheel,
            _ => Self::Unknown,
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::FrontFront => "Front-engine, front-wheel drive",
            Self::FrontRear => "Front-engine, rear-wheel drive",
            Self::MidRear => "Mid-engine, rear-wheel drive",
            Self::RearRear => "Rear-engine, rear-wheel drive",
            Self::FourWheel => "Four-wheel drive",
            Self::Unknown => "Unknown",
        }
    }

    /// Whether only the front axle is driven.
    pub const fn is_front_driven(self) -> bool {
        matches!(self, Self::FrontFront)
    }
}

/// Expand an aspiration code. Unknown codes pass through unchanged.
pub fn expand_aspiration(code: &str) -> String {
    match code {
        "NA" => "Naturally Aspirated",
        "TC" => "Turbocharged",
        "SC" => "Supercharged",
        "EV" => "Electric Vehicle",
        "TC+SC" => "Compound Charged",
        other => other,
    }
    .to_owned()
}

/// Vehicle lookup table.
///
/// The JSON form is an object keyed by decimal CarID strings. Lookups do not
/// depend on the order records appear in.
#[derive(Debug, Clone, Default)]
pub struct VehicleCatalogue {
    vehicles: HashMap<u32, Vehicle>,
}

impl VehicleCatalogue {
    /// Build from records. Duplicate IDs are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogueError::DuplicateVehicle`] when two records share an ID.
    pub fn from_vehicles(vehicles: impl IntoIterator<Item = Vehicle>) -> Result<Self> {
        let mut map = HashMap::new();
        for vehicle in vehicles {
            let id = vehicle.car_id;
            if map.insert(id, vehicle).is_some() {
                return Err(CatalogueError::DuplicateVehicle(id));
            }
        }
        Ok(Self { vehicles: map })
    }

    /// Parse the JSON form.
    ///
    /// The map key is authoritative for the ID; a record's own `CarID` is
    /// overwritten with it.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogueError::Parse`] for malformed JSON and
    /// [`CatalogueError::InvalidKey`] for keys that are not decimal IDs.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: BTreeMap<String, Vehicle> = serde_json::from_str(json)?;
        let mut vehicles = HashMap::with_capacity(raw.len());
        for (key, mut vehicle) in raw {
            let id = key.trim().parse::<u32>().map_err(|e| CatalogueError::InvalidKey {
                key: key.clone(),
                reason: e.to_string(),
            })?;
            vehicle.car_id = id;
            if vehicles.insert(id, vehicle).is_some() {
                return Err(CatalogueError::DuplicateVehicle(id));
            }
        }
        debug!(vehicles = vehicles.len(), "loaded vehicle catalogue");
        Ok(Self { vehicles })
    }

    /// Load the JSON form from a file.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogueError::Io`] when the file cannot be read, otherwise
    /// as [`VehicleCatalogue::from_json`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| CatalogueError::io(path, e))?;
        Self::from_json(&json)
    }

    /// Seed catalogue compiled into the crate.
    ///
    /// # Errors
    ///
    /// Only fails if the embedded document is corrupt.
    pub fn embedded() -> Result<Self> {
        Self::from_json(EMBEDDED_VEHICLES)
    }

    /// # Errors
    ///
    /// Returns [`CatalogueError::VehicleNotFound`] for unknown IDs.
    pub fn get(&self, car_id: u32) -> Result<&Vehicle> {
        self.vehicles
            .get(&car_id)
            .ok_or(CatalogueError::VehicleNotFound(car_id))
    }

    /// The vehicle for `car_id`, or a placeholder carrying only the ID.
    pub fn get_or_placeholder(&self, car_id: u32) -> Vehicle {
        self.vehicles
            .get(&car_id)
            .cloned()
            .unwrap_or_else(|| Vehicle::placeholder(car_id))
    }

    pub fn contains(&self, car_id: u32) -> bool {
        self.vehicles.contains_key(&car_id)
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    /// All IDs in ascending order.
    pub fn ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.vehicles.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}
