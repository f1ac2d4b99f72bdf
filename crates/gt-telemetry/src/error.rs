//! Client error types.

use std::path::PathBuf;

use gt_telemetry_catalogue::CatalogueError;
use gt_telemetry_protocol::{CipherError, DecodeError};
use thiserror::Error;

/// Result alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Failure reading from a telemetry source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Socket receive failed.
    #[error("receive failed: {0}")]
    Receive(#[source] std::io::Error),

    /// No datagram arrived before the receive deadline.
    #[error("receive timed out")]
    Timeout,

    /// An empty datagram was received.
    #[error("no data received")]
    NoData,

    /// The datagram could not be deciphered.
    #[error("decipher failed: {0}")]
    Decipher(#[from] CipherError),

    /// The replay file does not exist.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The replay file name is too short to carry an extension.
    #[error("file name too short: {0:?}")]
    FilenameTooShort(String),

    /// The capture file extension is neither `gtr` nor `gtz`.
    #[error("unsupported file extension: {0:?}")]
    UnsupportedExtension(String),

    /// The replay file has no more frames.
    #[error("end of stream")]
    EndOfStream,

    /// Other I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The source has been closed.
    #[error("source closed")]
    Closed,
}

impl SourceError {
    /// Whether the read loop should keep going after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Receive(_) | Self::Timeout | Self::NoData | Self::Decipher(_)
        )
    }
}

/// Failure in the capture recorder.
#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("already recording to {}", .0.display())]
    AlreadyRecording(PathBuf),

    #[error("not recording")]
    NotRecording,

    /// The capture file extension is neither `gtr` nor `gtz`.
    #[error("unsupported capture extension: {0:?}")]
    UnsupportedExtension(String),

    #[error("recorder I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Top-level client error.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Recorder(#[from] RecorderError),

    #[error(transparent)]
    Catalogue(#[from] CatalogueError),

    /// Invalid options.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Whether a supervisor may restart the read loop after this error.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Source(e) => e.is_recoverable(),
            Self::Decode(_) => true,
            Self::Recorder(_) | Self::Catalogue(_) | Self::Config(_) | Self::Io(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_recoverability() {
        assert!(SourceError::Timeout.is_recoverable());
        assert!(SourceError::NoData.is_recoverable());
        assert!(SourceError::Decipher(CipherError::InvalidMagic { found: 1 }).is_recoverable());
        assert!(!SourceError::EndOfStream.is_recoverable());
        assert!(!SourceError::UnsupportedExtension("txt".into()).is_recoverable());
        assert!(!SourceError::Closed.is_recoverable());
    }

    #[test]
    fn test_client_error_recoverability() {
        assert!(ClientError::from(SourceError::Timeout).is_recoverable());
        assert!(!ClientError::Config("bad".into()).is_recoverable());
        assert!(!ClientError::from(RecorderError::NotRecording).is_recoverable());
    }

    #[test]
    fn test_messages() {
        insta::assert_snapshot!(
            SourceError::FileNotFound(PathBuf::from("/tmp/none.gtr")).to_string(),
            @"file not found: /tmp/none.gtr"
        );
        insta::assert_snapshot!(
            ClientError::from(SourceError::UnsupportedExtension("csv".into())).to_string(),
            @r#"unsupported file extension: "csv""#
        );
    }
}
