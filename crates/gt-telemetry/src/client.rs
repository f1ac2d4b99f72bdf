//! The telemetry client: one source, one read loop, one published snapshot.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use gt_telemetry_catalogue::{
    Circuit, CircuitCatalogue, Coordinate, LocateKind, Vehicle, VehicleCatalogue,
};
use gt_telemetry_protocol::{MAGIC_BYTES, decode};
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::{Options, SourceUrl};
use crate::derived::Telemetry;
use crate::error::{ClientError, Result, SourceError};
use crate::recorder::{Recorder, RecorderStatus};
use crate::source::udp::UdpSourceConfig;
use crate::source::{FileSource, TelemetrySource, UdpSource};
use crate::stats::{Statistics, StatsCollector};

/// Pause between read-loop iterations.
pub const LOOP_INTERVAL: Duration = Duration::from_millis(4);

/// How [`Client::run`] ended.
#[derive(Debug)]
pub struct RunOutcome {
    /// Whether calling `run` again may succeed.
    pub recoverable: bool,
    /// `None` when the source finished or was closed.
    pub error: Option<ClientError>,
}

impl RunOutcome {
    fn finished() -> Self {
        Self {
            recoverable: false,
            error: None,
        }
    }

    fn failed(error: ClientError) -> Self {
        Self {
            recoverable: error.is_recoverable(),
            error: Some(error),
        }
    }

    /// True for a clean end of stream or close.
    pub fn is_clean(&self) -> bool {
        self.error.is_none()
    }
}

/// Reads frames from a [`TelemetrySource`], decodes them and publishes the
/// latest [`Telemetry`].
///
/// ```no_run
/// use gt_telemetry::{Client, Options};
///
/// # async fn demo() -> gt_telemetry::Result<()> {
/// let client = std::sync::Arc::new(Client::new(Options::default()).await?);
/// let runner = std::sync::Arc::clone(&client);
/// tokio::spawn(async move { runner.run().await });
///
/// let mut updates = client.subscribe();
/// while updates.changed().await.is_ok() {
///     if let Some(t) = updates.borrow().as_ref() {
///         println!("{} {:.0} km/h", t.current_gear(), t.speed_kmh());
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct Client {
    options: Options,
    source: Box<dyn TelemetrySource>,
    vehicles: VehicleCatalogue,
    circuits: CircuitCatalogue,
    stats: Mutex<StatsCollector>,
    recorder: Mutex<Recorder>,
    vehicle_cache: Mutex<Option<Arc<Vehicle>>>,
    telemetry_tx: watch::Sender<Option<Telemetry>>,
    finished: AtomicBool,
}

impl Client {
    /// Build the source named by `options.source` and load the catalogues.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Config`] for a malformed source URL.
    /// - [`ClientError::Source`] when the file cannot be opened or the socket
    ///   cannot be bound.
    /// - [`ClientError::Catalogue`] when a catalogue file cannot be loaded.
    pub async fn new(options: Options) -> Result<Self> {
        let source: Box<dyn TelemetrySource> = match options.source_url()? {
            SourceUrl::Udp { host, port } => {
                let mut config = UdpSourceConfig::new(host, port, options.format);
                if let Some(listen_port) = options.listen_port {
                    config = config.with_listen_port(listen_port);
                }
                Box::new(UdpSource::connect(config).await?)
            }
            SourceUrl::File(path) => Box::new(FileSource::open(path)?),
        };
        Self::with_source(options, source)
    }

    /// Use an already-built source. `options.source` is ignored.
    ///
    /// # Errors
    ///
    /// [`ClientError::Catalogue`] when a catalogue file cannot be loaded.
    pub fn with_source(options: Options, source: Box<dyn TelemetrySource>) -> Result<Self> {
        let vehicles = match &options.vehicle_db {
            Some(path) => VehicleCatalogue::from_path(path)?,
            None => VehicleCatalogue::embedded()?,
        };
        let circuits = match &options.circuit_db {
            Some(path) => CircuitCatalogue::from_path(path)?,
            None => CircuitCatalogue::embedded()?,
        };
        info!(
            source = %source.describe(),
            vehicles = vehicles.len(),
            circuits = circuits.len(),
            stats = options.stats_enabled,
            "telemetry client ready"
        );

        Ok(Self {
            stats: Mutex::new(StatsCollector::new(options.stats_enabled)),
            options,
            source,
            vehicles,
            circuits,
            recorder: Mutex::new(Recorder::new()),
            vehicle_cache: Mutex::new(None),
            telemetry_tx: watch::Sender::new(None),
            finished: AtomicBool::new(false),
        })
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Read until the source finishes, is closed, or fails unrecoverably.
    ///
    /// Per-frame problems (bad magic, short packets, timeouts, empty
    /// datagrams) are counted or logged and never end the loop.
    pub async fn run(&self) -> RunOutcome {
        debug!(source = %self.source.describe(), "read loop started");
        loop {
            tokio::time::sleep(LOOP_INTERVAL).await;

            let frame = match self.source.read().await {
                Ok(frame) => frame,
                Err(SourceError::EndOfStream) => {
                    self.finished.store(true, Ordering::Release);
                    info!(source = %self.source.describe(), "telemetry stream finished");
                    return RunOutcome::finished();
                }
                Err(SourceError::Closed) => {
                    debug!("source closed, leaving read loop");
                    return RunOutcome::finished();
                }
                Err(e) if e.is_recoverable() => {
                    if matches!(e, SourceError::Decipher(_)) {
                        self.stats.lock().record_invalid();
                    }
                    debug!(error = %e, "skipping frame");
                    continue;
                }
                Err(e) => {
                    warn!(error = %e, "read loop stopped");
                    return RunOutcome::failed(e.into());
                }
            };

            if frame.as_slice() == MAGIC_BYTES {
                continue;
            }
            self.mirror(&frame);
            self.process(&frame);
        }
    }

    fn mirror(&self, frame: &[u8]) {
        let mut recorder = self.recorder.lock();
        if !recorder.is_recording() {
            return;
        }
        if let Err(e) = recorder.record(frame) {
            warn!(error = %e, "capture write failed, stopping recording");
            if let Err(e) = recorder.stop() {
                warn!(error = %e, "capture could not be finished");
            }
        }
    }

    fn process(&self, frame: &[u8]) {
        let started = self
            .stats
            .lock()
            .is_enabled()
            .then(std::time::Instant::now);
        let snapshot = match decode(frame) {
            Ok(snapshot) => Arc::new(snapshot),
            Err(e) => {
                self.stats.lock().record_invalid();
                debug!(error = %e, len = frame.len(), "dropping invalid frame");
                return;
            }
        };
        let decode_time = started.map(|t| t.elapsed()).unwrap_or_default();
        self.stats
            .lock()
            .record_frame(snapshot.sequence_id, decode_time);

        let vehicle = self.vehicle_for(snapshot.vehicle_id);
        self.telemetry_tx
            .send_modify(|slot| *slot = Some(Telemetry::new(snapshot, vehicle)));
    }

    fn vehicle_for(&self, car_id: u32) -> Arc<Vehicle> {
        let mut cache = self.vehicle_cache.lock();
        if let Some(vehicle) = cache.as_ref().filter(|v| v.car_id == car_id) {
            return Arc::clone(vehicle);
        }
        let vehicle = Arc::new(self.vehicles.get_or_placeholder(car_id));
        if vehicle.is_placeholder() {
            debug!(car_id, "vehicle not in catalogue");
        } else {
            info!(car_id, vehicle = %vehicle.display_name(), "vehicle changed");
        }
        *cache = Some(Arc::clone(&vehicle));
        vehicle
    }

    /// Latest decoded telemetry, if any frame has arrived.
    pub fn telemetry(&self) -> Option<Telemetry> {
        self.telemetry_tx.borrow().clone()
    }

    /// Receiver notified on every published frame.
    pub fn subscribe(&self) -> watch::Receiver<Option<Telemetry>> {
        self.telemetry_tx.subscribe()
    }

    pub fn statistics(&self) -> Statistics {
        self.stats.lock().snapshot()
    }

    pub fn reset_statistics(&self) {
        self.stats.lock().reset();
    }

    /// Whether a replay source has been read to the end.
    pub fn finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// Start mirroring frames to a `gtr` or `gtz` capture.
    ///
    /// # Errors
    ///
    /// See [`Recorder::start`].
    pub fn start_recording(&self, path: impl AsRef<Path>) -> Result<()> {
        self.recorder.lock().start(path)?;
        Ok(())
    }

    /// # Errors
    ///
    /// See [`Recorder::stop`].
    pub fn stop_recording(&self) -> Result<RecorderStatus> {
        Ok(self.recorder.lock().stop()?)
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.lock().is_recording()
    }

    pub fn recorder_status(&self) -> Option<RecorderStatus> {
        self.recorder.lock().status()
    }

    pub fn vehicles(&self) -> &VehicleCatalogue {
        &self.vehicles
    }

    pub fn circuits(&self) -> &CircuitCatalogue {
        &self.circuits
    }

    /// Vehicle of the latest frame; a placeholder for unknown IDs.
    pub fn vehicle(&self) -> Option<Arc<Vehicle>> {
        self.vehicle_cache.lock().clone()
    }

    /// Circuit whose table entry covers the car's current position.
    pub fn circuit_at(&self, kind: LocateKind) -> Option<&Circuit> {
        let position = self.telemetry()?.snapshot().position;
        self.circuits
            .locate_circuit(Coordinate::new(position.x, position.y, position.z), kind)
    }

    /// Close the source and finish any recording in progress.
    pub async fn close(&self) {
        self.source.close().await;
        let stopped = {
            let mut recorder = self.recorder.lock();
            if recorder.is_recording() {
                Some(recorder.stop())
            } else {
                None
            }
        };
        match stopped {
            Some(Ok(status)) => debug!(frames = status.frames, "recording finished on close"),
            Some(Err(e)) => warn!(error = %e, "recording could not be finished on close"),
            None => {}
        }
        info!(source = %self.source.describe(), "telemetry client closed");
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("source", &self.source.describe())
            .field("vehicles", &self.vehicles.len())
            .field("circuits", &self.circuits.len())
            .field("finished", &self.finished())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    use crate::error::RecorderError;

    use async_trait::async_trait;
    use gt_telemetry_protocol::{MAGIC, offsets};

    type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

    struct ScriptedSource {
        reads: parking_lot::Mutex<VecDeque<std::result::Result<Vec<u8>, SourceError>>>,
    }

    impl ScriptedSource {
        fn new(reads: Vec<std::result::Result<Vec<u8>, SourceError>>) -> Box<Self> {
            Box::new(Self {
                reads: parking_lot::Mutex::new(reads.into()),
            })
        }
    }

    #[async_trait]
    impl TelemetrySource for ScriptedSource {
        async fn read(&self) -> std::result::Result<Vec<u8>, SourceError> {
            self.reads
                .lock()
                .pop_front()
                .unwrap_or(Err(SourceError::EndOfStream))
        }

        async fn close(&self) {}

        fn describe(&self) -> String {
            "scripted".into()
        }
    }

    fn frame(sequence_id: u32, car_id: u32) -> Vec<u8> {
        let mut f = vec![0u8; 296];
        f[..4].copy_from_slice(&MAGIC.to_le_bytes());
        f[offsets::SEQUENCE_ID..offsets::SEQUENCE_ID + 4].copy_from_slice(&sequence_id.to_le_bytes());
        f[offsets::VEHICLE_ID..offsets::VEHICLE_ID + 4].copy_from_slice(&car_id.to_le_bytes());
        f
    }

    #[tokio::test]
    async fn test_run_counts_and_publishes() -> TestResult {
        let mut bad = frame(3, 1000);
        bad[0] ^= 0xFF;
        let source = ScriptedSource::new(vec![
            Ok(frame(1, 1000)),
            Ok(MAGIC_BYTES.to_vec()),
            Err(SourceError::Timeout),
            Ok(bad),
            Ok(frame(4, 1002)),
        ]);
        let client = Client::with_source(Options::default().with_stats(true), source)?;

        let outcome = client.run().await;
        assert!(outcome.is_clean());
        assert!(!outcome.recoverable);
        assert!(client.finished());

        let stats = client.statistics();
        assert_eq!(stats.packets_total, 2);
        assert_eq!(stats.packets_invalid, 1);
        assert_eq!(stats.packets_dropped, 2);
        assert_eq!(stats.last_sequence_id, Some(4));

        let telemetry = client.telemetry().ok_or("nothing published")?;
        assert_eq!(telemetry.snapshot().sequence_id, 4);
        assert_eq!(telemetry.vehicle().car_id, 1002);
        Ok(())
    }

    #[tokio::test]
    async fn test_unrecoverable_error_ends_run() -> TestResult {
        let source = ScriptedSource::new(vec![Err(SourceError::Io(std::io::Error::other("gone")))]);
        let client = Client::with_source(Options::default(), source)?;

        let outcome = client.run().await;
        assert!(!outcome.recoverable);
        assert!(matches!(outcome.error, Some(ClientError::Source(SourceError::Io(_)))));
        assert!(!client.finished());
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_vehicle_gets_placeholder() -> TestResult {
        let source = ScriptedSource::new(vec![Ok(frame(1, 424_242))]);
        let client = Client::with_source(Options::default(), source)?;
        assert!(client.vehicle().is_none());

        client.run().await;
        let vehicle = client.vehicle().ok_or("no vehicle")?;
        assert!(vehicle.is_placeholder());
        assert_eq!(vehicle.car_id, 424_242);
        Ok(())
    }

    #[tokio::test]
    async fn test_recording_mirrors_frames() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("session.gtr");
        let source = ScriptedSource::new(vec![Ok(frame(1, 1000)), Ok(frame(2, 1000))]);
        let client = Client::with_source(Options::default(), source)?;

        client.start_recording(&path)?;
        assert!(matches!(
            client.start_recording(&path),
            Err(ClientError::Recorder(RecorderError::AlreadyRecording(_)))
        ));
        client.run().await;

        let status = client.stop_recording()?;
        assert_eq!(status.frames, 2);
        assert_eq!(std::fs::read(&path)?.len(), 2 * 296);
        assert!(matches!(
            client.stop_recording(),
            Err(ClientError::Recorder(RecorderError::NotRecording))
        ));
        Ok(())
    }

    struct StalledSource {
        reads: std::sync::atomic::AtomicUsize,
    }

    #[async_trait]
    impl TelemetrySource for StalledSource {
        async fn read(&self) -> std::result::Result<Vec<u8>, SourceError> {
            self.reads.fetch_add(1, Ordering::Relaxed);
            Err(SourceError::Timeout)
        }

        async fn close(&self) {}

        fn describe(&self) -> String {
            "stalled".into()
        }
    }

    #[tokio::test]
    async fn test_recoverable_errors_are_paced() -> TestResult {
        let source = Arc::new(StalledSource {
            reads: std::sync::atomic::AtomicUsize::new(0),
        });
        let client = Client::with_source(Options::default(), Box::new(SharedSource(source.clone())))?;

        let window = Duration::from_millis(100);
        let ran = tokio::time::timeout(window, client.run()).await;
        assert!(ran.is_err(), "timeouts must not end the read loop");

        let reads = source.reads.load(Ordering::Relaxed);
        let ceiling = usize::try_from(window.as_millis() / LOOP_INTERVAL.as_millis())? + 1;
        assert!(reads >= 1);
        assert!(reads <= ceiling, "{reads} reads in {window:?}");
        Ok(())
    }

    struct SharedSource(Arc<StalledSource>);

    #[async_trait]
    impl TelemetrySource for SharedSource {
        async fn read(&self) -> std::result::Result<Vec<u8>, SourceError> {
            self.0.read().await
        }

        async fn close(&self) {}

        fn describe(&self) -> String {
            self.0.describe()
        }
    }

    #[tokio::test]
    async fn test_close_finishes_recording() -> TestResult {
        let dir = tempfile::tempdir()?;
        let source = ScriptedSource::new(vec![]);
        let client = Client::with_source(Options::default(), source)?;
        client.start_recording(dir.path().join("lap.gtz"))?;
        client.close().await;
        assert!(!client.is_recording());
        Ok(())
    }
}
