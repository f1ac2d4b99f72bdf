//! Catalogue error types.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias for catalogue operations.
pub type Result<T> = std::result::Result<T, CatalogueError>;

/// Errors raised while loading or querying a catalogue.
#[derive(Debug, Error)]
pub enum CatalogueError {
    /// No vehicle carries the requested ID.
    #[error("vehicle not found: {0}")]
    VehicleNotFound(u32),

    /// No circuit carries the requested ID.
    #[error("circuit not found: {0}")]
    CircuitNotFound(String),

    /// Two records claim the same vehicle ID.
    #[error("duplicate vehicle ID: {0}")]
    DuplicateVehicle(u32),

    /// A map key is not a valid vehicle ID or coordinate key.
    #[error("invalid key {key:?}: {reason}")]
    InvalidKey {
        /// The offending key
        key: String,
        /// Why it was rejected
        reason: String,
    },

    /// The document is not valid catalogue JSON.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The catalogue file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File being read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl CatalogueError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error is a lookup miss rather than a load failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::VehicleNotFound(_) | Self::CircuitNotFound(_))
    }
}
