//! Capture recorder: mirrors deciphered frames to a `gtr`/`gtz` file.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use tracing::info;

use crate::capture::{CaptureFormat, extension_of};
use crate::error::RecorderError;

enum CaptureWriter {
    Raw(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

impl CaptureWriter {
    fn write_all(&mut self, data: &[u8]) -> std::io::Result<()> {
        match self {
            Self::Raw(w) => w.write_all(data),
            Self::Gzip(w) => w.write_all(data),
        }
    }

    fn finish(self) -> std::io::Result<()> {
        match self {
            Self::Raw(mut w) => w.flush(),
            Self::Gzip(w) => w.finish()?.flush(),
        }
    }
}

struct ActiveRecording {
    path: PathBuf,
    format: CaptureFormat,
    writer: CaptureWriter,
    frames: u64,
    bytes: u64,
    started: Instant,
}

impl ActiveRecording {
    fn status(&self) -> RecorderStatus {
        RecorderStatus {
            path: self.path.clone(),
            format: self.format.extension(),
            frames: self.frames,
            bytes: self.bytes,
            duration: self.started.elapsed(),
        }
    }
}

/// Progress of a recording.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecorderStatus {
    pub path: PathBuf,
    /// `gtr` or `gtz`.
    pub format: &'static str,
    pub frames: u64,
    /// Uncompressed bytes written.
    pub bytes: u64,
    pub duration: Duration,
}

/// Idle/recording state machine over one capture file at a time.
#[derive(Default)]
pub struct Recorder {
    active: Option<ActiveRecording>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_recording(&self) -> bool {
        self.active.is_some()
    }

    /// Status of the current recording, if any.
    pub fn status(&self) -> Option<RecorderStatus> {
        self.active.as_ref().map(ActiveRecording::status)
    }

    /// Start recording to `path`. Missing parent directories are created.
    ///
    /// # Errors
    ///
    /// - [`RecorderError::AlreadyRecording`] when a recording is in progress.
    /// - [`RecorderError::UnsupportedExtension`] unless the path ends in
    ///   `.gtr` or `.gtz`.
    /// - [`RecorderError::Io`] when the file cannot be created.
    pub fn start(&mut self, path: impl AsRef<Path>) -> Result<(), RecorderError> {
        let path = path.as_ref();
        if let Some(active) = &self.active {
            return Err(RecorderError::AlreadyRecording(active.path.clone()));
        }
        let format = CaptureFormat::from_path(path)
            .ok_or_else(|| RecorderError::UnsupportedExtension(extension_of(path)))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = BufWriter::new(File::create(path)?);
        let writer = match format {
            CaptureFormat::Raw => CaptureWriter::Raw(file),
            CaptureFormat::Gzip => CaptureWriter::Gzip(GzEncoder::new(file, Compression::default())),
        };

        info!(path = %path.display(), ?format, "recording started");
        self.active = Some(ActiveRecording {
            path: path.to_path_buf(),
            format,
            writer,
            frames: 0,
            bytes: 0,
            started: Instant::now(),
        });
        Ok(())
    }

    /// Append one frame.
    ///
    /// # Errors
    ///
    /// [`RecorderError::NotRecording`] when idle, [`RecorderError::Io`] when
    /// the write fails.
    pub fn record(&mut self, frame: &[u8]) -> Result<(), RecorderError> {
        let active = self.active.as_mut().ok_or(RecorderError::NotRecording)?;
        active.writer.write_all(frame)?;
        active.frames += 1;
        active.bytes += frame.len() as u64;
        Ok(())
    }

    /// Finish the file and return to idle.
    ///
    /// # Errors
    ///
    /// [`RecorderError::NotRecording`] when idle, [`RecorderError::Io`] when
    /// flushing fails. The recorder is idle afterwards either way.
    pub fn stop(&mut self) -> Result<RecorderStatus, RecorderError> {
        let active = self.active.take().ok_or(RecorderError::NotRecording)?;
        let status = active.status();
        active.writer.finish()?;
        info!(
            path = %status.path.display(),
            frames = status.frames,
            bytes = status.bytes,
            "recording stopped"
        );
        Ok(status)
    }
}

impl std::fmt::Debug for Recorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recorder")
            .field("status", &self.status())
            .finish()
    }
}
