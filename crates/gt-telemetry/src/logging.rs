//! Log verbosity and `tracing` subscriber setup.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::ClientError;

/// Verbosity accepted in [`Options`](crate::Options).
///
/// `Fatal` and `Panic` exist for compatibility with older option files and
/// both map to the `ERROR` level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    #[serde(alias = "warning")]
    Warn,
    Error,
    Fatal,
    Panic,
    Off,
}

impl LogLevel {
    pub const fn level_filter(self) -> LevelFilter {
        match self {
            Self::Trace => LevelFilter::TRACE,
            Self::Debug => LevelFilter::DEBUG,
            Self::Info => LevelFilter::INFO,
            Self::Warn => LevelFilter::WARN,
            Self::Error | Self::Fatal | Self::Panic => LevelFilter::ERROR,
            Self::Off => LevelFilter::OFF,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Fatal => "fatal",
            Self::Panic => "panic",
            Self::Off => "off",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            "fatal" => Ok(Self::Fatal),
            "panic" => Ok(Self::Panic),
            "off" | "none" => Ok(Self::Off),
            _ => Err(ClientError::Config(format!("unknown log level {s:?}"))),
        }
    }
}

/// Install a global fmt subscriber at `level`.
///
/// Returns `false` when a global subscriber was already set, in which case the
/// existing one stays in place.
pub fn init(level: LogLevel) -> bool {
    tracing_subscriber::registry()
        .with(level.level_filter())
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_mapping() {
        assert_eq!(LogLevel::Fatal.level_filter(), LevelFilter::ERROR);
        assert_eq!(LogLevel::Panic.level_filter(), LevelFilter::ERROR);
        assert_eq!(LogLevel::Off.level_filter(), LevelFilter::OFF);
        assert_eq!(LogLevel::default().level_filter(), LevelFilter::WARN);
    }

    #[test]
    fn test_parse_round_trip() -> Result<(), ClientError> {
        for level in [
            LogLevel::Trace,
            LogLevel::Debug,
            LogLevel::Info,
            LogLevel::Warn,
            LogLevel::Error,
            LogLevel::Fatal,
            LogLevel::Panic,
            LogLevel::Off,
        ] {
            assert_eq!(level.to_string().parse::<LogLevel>()?, level);
        }
        assert!("verbose".parse::<LogLevel>().is_err());
        Ok(())
    }

    #[test]
    fn test_repeated_init_is_harmless() {
        let _first = init(LogLevel::Off);
        assert!(!init(LogLevel::Debug));
    }
}
