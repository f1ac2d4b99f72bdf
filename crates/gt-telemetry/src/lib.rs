//! Gran Turismo telemetry client.
//!
//! A [`Client`] owns one [`TelemetrySource`]: either a live [`UdpSource`]
//! that keeps the console streaming with heartbeats, or a [`FileSource`] that
//! replays a `gtr`/`gtz` capture at 60 Hz. Each frame is decoded into a
//! [`Snapshot`](gt_telemetry_protocol::Snapshot), paired with its
//! [`Vehicle`](gt_telemetry_catalogue::Vehicle) and published as
//! [`Telemetry`] through a `tokio::sync::watch` channel.
//!
//! ```no_run
//! use gt_telemetry::{Client, Options, logging};
//!
//! # async fn demo() -> gt_telemetry::Result<()> {
//! let options = Options::default().with_source("file://laps/session.gtz");
//! logging::init(options.log_level);
//!
//! let client = Client::new(options).await?;
//! let outcome = client.run().await;
//! if let Some(error) = outcome.error {
//!     eprintln!("stopped: {error}");
//! }
//! println!("{:?}", client.statistics());
//! # Ok(())
//! # }
//! ```

#![deny(static_mut_refs)]

pub mod capture;
pub mod client;
pub mod config;
pub mod derived;
pub mod error;
pub mod logging;
pub mod recorder;
pub mod source;
pub mod stats;
pub mod units;

pub use capture::CaptureFormat;
pub use client::{Client, RunOutcome};
pub use config::{Options, SourceUrl};
pub use derived::{GameState, RaceType, Session, Telemetry};
pub use error::{ClientError, RecorderError, Result, SourceError};
pub use logging::LogLevel;
pub use recorder::{Recorder, RecorderStatus};
pub use source::{FileSource, FrameSplitter, TelemetrySource, UdpSource};
pub use stats::Statistics;

pub use gt_telemetry_catalogue as catalogue;
pub use gt_telemetry_protocol as protocol;
