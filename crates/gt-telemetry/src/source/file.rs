//! Replay of `gtr`/`gtz` capture files at the console's 60 Hz cadence.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use flate2::read::MultiGzDecoder;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

use super::TelemetrySource;
use super::splitter::FrameSplitter;
use crate::capture::{CaptureFormat, extension_of};
use crate::error::SourceError;

/// Spacing between replayed frames (60 Hz).
pub const FRAME_INTERVAL: Duration = Duration::from_micros(16_667);

/// Shortest accepted file name.
const MIN_FILENAME_LEN: usize = 4;

type BoxedReader = Box<dyn Read + Send>;

struct ReplayState {
    splitter: FrameSplitter<BoxedReader>,
    last_frame: Option<Instant>,
    finished: bool,
}

/// Telemetry source that replays a capture file.
pub struct FileSource {
    label: Arc<str>,
    state: Arc<Mutex<ReplayState>>,
    closed: AtomicBool,
}

impl FileSource {
    /// Open a capture, picking raw or gzip decoding from the extension.
    ///
    /// # Errors
    ///
    /// - [`SourceError::FilenameTooShort`] for names under four characters.
    /// - [`SourceError::UnsupportedExtension`] for anything but `gtr`/`gtz`.
    /// - [`SourceError::FileNotFound`] when the file does not exist.
    /// - [`SourceError::Io`] for other open failures.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if name.chars().count() < MIN_FILENAME_LEN {
            return Err(SourceError::FilenameTooShort(name));
        }

        let format = CaptureFormat::from_path(path)
            .ok_or_else(|| SourceError::UnsupportedExtension(extension_of(path)))?;

        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => SourceError::FileNotFound(PathBuf::from(path)),
            _ => SourceError::Io(e),
        })?;
        let reader: BoxedReader = match format {
            CaptureFormat::Raw => Box::new(BufReader::new(file)),
            CaptureFormat::Gzip => Box::new(MultiGzDecoder::new(BufReader::new(file))),
        };

        info!(path = %path.display(), ?format, "opened capture for replay");
        Ok(Self::from_reader(reader, path.display().to_string()))
    }

    /// Replay frames from any reader holding raw capture bytes.
    pub fn from_reader(reader: impl Read + Send + 'static, label: impl Into<String>) -> Self {
        Self {
            label: Arc::from(label.into()),
            state: Arc::new(Mutex::new(ReplayState {
                splitter: FrameSplitter::new(Box::new(reader)),
                last_frame: None,
                finished: false,
            })),
            closed: AtomicBool::new(false),
        }
    }

    /// Whether the capture has been read to the end.
    pub fn is_finished(&self) -> bool {
        self.state.lock().finished
    }
}

/// Pull the next frame off the capture and schedule its release.
fn next_paced_frame(state: &Mutex<ReplayState>, label: &str) -> Result<(Vec<u8>, Instant), SourceError> {
    let mut state = state.lock();
    if state.finished {
        return Err(SourceError::EndOfStream);
    }
    let Some(frame) = state.splitter.next_frame()? else {
        state.finished = true;
        debug!(source = %label, frames = state.splitter.frames(), "capture exhausted");
        return Err(SourceError::EndOfStream);
    };

    let now = Instant::now();
    let wake_at = match state.last_frame {
        Some(last) => (last + FRAME_INTERVAL).max(now),
        None => now,
    };
    state.last_frame = Some(wake_at);
    Ok((frame, wake_at))
}

#[async_trait]
impl TelemetrySource for FileSource {
    async fn read(&self) -> Result<Vec<u8>, SourceError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(SourceError::Closed);
        }

        let state = Arc::clone(&self.state);
        let label = Arc::clone(&self.label);
        let (frame, wake_at) = tokio::task::spawn_blocking(move || next_paced_frame(&state, &label))
            .await
            .map_err(|e| SourceError::Io(io::Error::other(e)))??;

        tokio::time::sleep_until(wake_at).await;
        Ok(frame)
    }

    async fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!(source = %self.label, "replay closed");
        }
    }

    fn describe(&self) -> String {
        format!("file://{}", self.label)
    }
}
