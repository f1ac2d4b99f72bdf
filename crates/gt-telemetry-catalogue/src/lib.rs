//! Static reference catalogues for Gran Turismo telemetry.
//!
//! - [`VehicleCatalogue`] maps the packet's vehicle ID to make, model and
//!   chassis dimensions.
//! - [`CircuitCatalogue`] identifies the circuit a car is on from its position,
//!   by quantising the coordinate and looking the result up in a table of
//!   coordinates that belong to exactly one circuit.
//!
//! Both catalogues load from JSON, either from a file or from the small seed
//! set embedded in the crate, and are immutable once built.

pub mod circuit;
pub mod coordinate;
pub mod error;
pub mod vehicle;

pub use circuit::{Circuit, CircuitCatalogue, LocateKind, Resolutions};
pub use coordinate::{Coordinate, QuantisedCoordinate, Resolution};
pub use error::{CatalogueError, Result};
pub use vehicle::{Drivetrain, Vehicle, VehicleCatalogue, expand_aspiration};
