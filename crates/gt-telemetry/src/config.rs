//! Client construction options.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use gt_telemetry_protocol::TelemetryFormat;
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};
use crate::logging::LogLevel;
use crate::source::udp::DEFAULT_SEND_PORT;

/// Default source: broadcast heartbeats on the console port.
pub const DEFAULT_SOURCE: &str = "udp://255.255.255.255:33739";

/// Where telemetry comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceUrl {
    /// `udp://HOST[:PORT]`; the port defaults to the console's heartbeat port.
    Udp { host: String, port: u16 },
    /// `file://PATH` to a `gtr` or `gtz` capture.
    File(PathBuf),
}

impl FromStr for SourceUrl {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        let (scheme, rest) = s
            .split_once("://")
            .ok_or_else(|| ClientError::Config(format!("source URL {s:?} has no scheme")))?;

        match scheme.to_ascii_lowercase().as_str() {
            "udp" => {
                let (host, port) = match rest.rsplit_once(':') {
                    Some((host, port)) => {
                        let port = port.parse::<u16>().map_err(|e| {
                            ClientError::Config(format!("invalid port in {s:?}: {e}"))
                        })?;
                        (host, port)
                    }
                    None => (rest, DEFAULT_SEND_PORT),
                };
                let host = host.trim_start_matches('[').trim_end_matches(']');
                if host.is_empty() {
                    return Err(ClientError::Config(format!("source URL {s:?} has no host")));
                }
                Ok(Self::Udp {
                    host: host.to_owned(),
                    port,
                })
            }
            "file" => {
                if rest.is_empty() {
                    return Err(ClientError::Config(format!("source URL {s:?} has no path")));
                }
                Ok(Self::File(PathBuf::from(rest)))
            }
            other => Err(ClientError::Config(format!(
                "unsupported source scheme {other:?}"
            ))),
        }
    }
}

impl fmt::Display for SourceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Udp { host, port } => write!(f, "udp://{host}:{port}"),
            Self::File(path) => write!(f, "file://{}", path.display()),
        }
    }
}

/// Options for building a [`Client`](crate::Client).
///
/// Every field has a default, so a partial JSON or YAML document is enough.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// `udp://HOST:PORT` or `file://PATH`.
    pub source: String,
    pub format: TelemetryFormat,
    pub log_level: LogLevel,
    /// Measure decode timing and packet rate.
    pub stats_enabled: bool,
    /// Circuit catalogue JSON; the embedded seed set when unset.
    pub circuit_db: Option<PathBuf>,
    /// Vehicle catalogue JSON; the embedded seed set when unset.
    pub vehicle_db: Option<PathBuf>,
    /// Listen port override for UDP sources. Defaults to the send port + 1.
    pub listen_port: Option<u16>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            source: DEFAULT_SOURCE.to_owned(),
            format: TelemetryFormat::default(),
            log_level: LogLevel::default(),
            stats_enabled: false,
            circuit_db: None,
            vehicle_db: None,
            listen_port: None,
        }
    }
}

impl Options {
    /// Load options from a `.json`, `.yaml` or `.yml` file.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Io`] when the file cannot be read and
    /// [`ClientError::Config`] for unknown extensions or invalid documents.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "json" => Self::from_json(&text),
            "yaml" | "yml" => Self::from_yaml(&text),
            other => Err(ClientError::Config(format!(
                "unsupported options file extension {other:?}"
            ))),
        }
    }

    /// # Errors
    ///
    /// Returns [`ClientError::Config`] for invalid JSON.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| ClientError::Config(format!("invalid JSON options: {e}")))
    }

    /// # Errors
    ///
    /// Returns [`ClientError::Config`] for invalid YAML.
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|e| ClientError::Config(format!("invalid YAML options: {e}")))
    }

    /// Parsed form of [`Options::source`].
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] for malformed URLs.
    pub fn source_url(&self) -> Result<SourceUrl> {
        self.source.parse()
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: TelemetryFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    #[must_use]
    pub fn with_stats(mut self, enabled: bool) -> Self {
        self.stats_enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_circuit_db(mut self, path: impl Into<PathBuf>) -> Self {
        self.circuit_db = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_vehicle_db(mut self, path: impl Into<PathBuf>) -> Self {
        self.vehicle_db = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_listen_port(mut self, port: u16) -> Self {
        self.listen_port = Some(port);
        self
    }
}
