//! Telemetry sources: live UDP and file replay.

use async_trait::async_trait;

use crate::error::SourceError;

pub mod file;
pub mod splitter;
pub mod udp;

pub use file::FileSource;
pub use splitter::FrameSplitter;
pub use udp::UdpSource;

/// A stream of deciphered frames.
///
/// `read` yields one frame per call, magic word included. `close` is
/// idempotent; reads after close fail with [`SourceError::Closed`].
#[async_trait]
pub trait TelemetrySource: Send + Sync {
    /// Next deciphered frame.
    ///
    /// # Errors
    ///
    /// See [`SourceError`]; [`SourceError::is_recoverable`] tells the caller
    /// whether to keep reading.
    async fn read(&self) -> Result<Vec<u8>, SourceError>;

    /// Release the source and stop any background work.
    async fn close(&self);

    /// Short description for logs.
    fn describe(&self) -> String;
}
