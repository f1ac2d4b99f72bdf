//! Circuit identification from quantised positions.
//!
//! The catalogue JSON has two tables:
//!
//! ```json
//! {
//!   "coordinates": { "x:64,y:8,z:64": "foo" },
//!   "circuits": {
//!     "foo": {
//!       "id": "foo", "name": "Foo Raceway", "variation": "Full Course",
//!       "country": "JP", "default": true, "length": 4563,
//!       "startline": { "x": 64, "y": 8, "z": 64 },
//!       "unique_coords": 1
//!     }
//!   }
//! }
//! ```
//!
//! `coordinates` only lists grid cells that belong to a single circuit, so a
//! hit identifies the circuit outright. Start lines are matched separately and
//! only count when no other circuit shares the cell.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::coordinate::{Coordinate, QuantisedCoordinate, Resolution};
use crate::error::{CatalogueError, Result};

const EMBEDDED_CIRCUITS: &str = include_str!("../data/circuits.json");

/// Static description of one circuit layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub variation: String,
    #[serde(default)]
    pub country: String,
    /// Whether this is the default layout of its venue.
    #[serde(default)]
    pub default: bool,
    /// Metres.
    #[serde(default)]
    pub length: u32,
    #[serde(rename = "startline")]
    pub start_line: QuantisedCoordinate,
    /// Number of grid cells that identify this circuit. Recomputed from the
    /// coordinate table when the record omits it.
    #[serde(rename = "unique_coords", default)]
    pub unique_coordinates: Option<u32>,
}

impl Circuit {
    /// "Name - Variation", or just the name when there is no variation.
    pub fn full_name(&self) -> String {
        if self.variation.is_empty() {
            self.name.clone()
        } else {
            format!("{} - {}", self.name, self.variation)
        }
    }
}

/// Which table a [`CircuitCatalogue::locate`] call consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocateKind {
    StartLine,
    Track,
}

/// Quantisation steps for start-line and track lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Resolutions {
    pub start_line: Resolution,
    pub track: Resolution,
}

impl Resolutions {
    pub const START_LINE: Resolution = Resolution::new(16, 2, 16);
    pub const TRACK: Resolution = Resolution::new(16, 2, 16);

    pub const fn for_kind(&self, kind: LocateKind) -> Resolution {
        match kind {
            LocateKind::StartLine => self.start_line,
            LocateKind::Track => self.track,
        }
    }
}

impl Default for Resolutions {
    fn default() -> Self {
        Self {
            start_line: Self::START_LINE,
            track: Self::TRACK,
        }
    }
}

#[derive(Deserialize)]
struct CircuitDocument {
    #[serde(default)]
    coordinates: BTreeMap<String, String>,
    circuits: BTreeMap<String, Circuit>,
}

/// Position-to-circuit lookup plus circuit metadata.
#[derive(Debug, Clone, Default)]
pub struct CircuitCatalogue {
    coordinates: HashMap<QuantisedCoordinate, String>,
    circuits: BTreeMap<String, Circuit>,
    start_lines: HashMap<QuantisedCoordinate, Vec<String>>,
    resolutions: Resolutions,
}

impl CircuitCatalogue {
    /// Build from circuit records and the unique-coordinate table.
    ///
    /// Coordinate entries naming an unknown circuit are dropped with a warning.
    pub fn new(
        circuits: impl IntoIterator<Item = Circuit>,
        coordinates: impl IntoIterator<Item = (QuantisedCoordinate, String)>,
        resolutions: Resolutions,
    ) -> Self {
        let mut circuits: BTreeMap<String, Circuit> =
            circuits.into_iter().map(|c| (c.id.clone(), c)).collect();

        let mut table = HashMap::new();
        let mut counts: HashMap<String, u32> = HashMap::new();
        for (coord, id) in coordinates {
            if !circuits.contains_key(&id) {
                warn!(circuit = %id, coordinate = %coord, "coordinate references unknown circuit");
                continue;
            }
            *counts.entry(id.clone()).or_default() += 1;
            table.insert(coord, id);
        }

        let mut start_lines: HashMap<QuantisedCoordinate, Vec<String>> = HashMap::new();
        for circuit in circuits.values_mut() {
            if circuit.unique_coordinates.is_none() {
                circuit.unique_coordinates = Some(counts.get(&circuit.id).copied().unwrap_or(0));
            }
            let key = circuit.start_line.requantise(resolutions.start_line);
            start_lines.entry(key).or_default().push(circuit.id.clone());
        }

        debug!(
            circuits = circuits.len(),
            coordinates = table.len(),
            "built circuit catalogue"
        );

        Self {
            coordinates: table,
            circuits,
            start_lines,
            resolutions,
        }
    }

    /// Parse the JSON form with the default resolutions.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogueError::Parse`] for malformed JSON and
    /// [`CatalogueError::InvalidKey`] for malformed coordinate keys.
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_json_with_resolutions(json, Resolutions::default())
    }

    /// Parse the JSON form, quantising lookups at `resolutions`.
    ///
    /// # Errors
    ///
    /// As [`CircuitCatalogue::from_json`].
    pub fn from_json_with_resolutions(json: &str, resolutions: Resolutions) -> Result<Self> {
        let doc: CircuitDocument = serde_json::from_str(json)?;
        let coordinates = doc
            .coordinates
            .into_iter()
            .map(|(key, id)| -> Result<_> { Ok((key.parse::<QuantisedCoordinate>()?, id)) })
            .collect::<Result<Vec<_>>>()?;
        let circuits = doc.circuits.into_iter().map(|(key, mut circuit)| {
            if circuit.id.is_empty() {
                circuit.id = key;
            }
            circuit
        });
        Ok(Self::new(circuits, coordinates, resolutions))
    }

    /// Load the JSON form from a file.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogueError::Io`] when the file cannot be read, otherwise
    /// as [`CircuitCatalogue::from_json`].
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
        Self::from_json(EMBEDDED_CIRCUITS)
    }

    pub const fn resolutions(&self) -> Resolutions {
        self.resolutions
    }

    /// Identify the circuit at `coord`.
    ///
    /// [`LocateKind::Track`] consults the unique-coordinate table.
    /// [`LocateKind::StartLine`] matches start lines and only answers when a
    /// single circuit starts in that cell.
    pub fn locate(&self, coord: Coordinate, kind: LocateKind) -> Option<&str> {
        let key = QuantisedCoordinate::quantise(coord, self.resolutions.for_kind(kind));
        match kind {
            LocateKind::Track => self.coordinates.get(&key).map(String::as_str),
            LocateKind::StartLine => match self.start_lines.get(&key)?.as_slice() {
                [id] => Some(id.as_str()),
                _ => None,
            },
        }
    }

    /// Like [`CircuitCatalogue::locate`], returning the circuit record.
    pub fn locate_circuit(&self, coord: Coordinate, kind: LocateKind) -> Option<&Circuit> {
        self.locate(coord, kind).and_then(|id| self.circuits.get(id))
    }

    /// # Errors
    ///
    /// Returns [`CatalogueError::CircuitNotFound`] for unknown IDs.
    pub fn by_id(&self, id: &str) -> Result<&Circuit> {
        self.circuits
            .get(id)
            .ok_or_else(|| CatalogueError::CircuitNotFound(id.to_owned()))
    }

    /// All circuit IDs in ascending order.
    pub fn all_ids(&self) -> Vec<&str> {
        self.circuits.keys().map(String::as_str).collect()
    }

    /// Circuits whose start line falls in the same cell as `coord`.
    pub fn start_line_candidates(&self, coord: Coordinate) -> &[String] {
        let key = QuantisedCoordinate::quantise(coord, self.resolutions.start_line);
        self.start_lines
            .get(&key)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.circuits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.circuits.is_empty()
    }
}
