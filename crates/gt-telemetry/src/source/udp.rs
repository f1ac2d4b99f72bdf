//! Live telemetry over UDP.
//!
//! The console only streams to hosts that keep sending it a heartbeat. The
//! source binds the listen port (send port + 1 by default), sends one
//! heartbeat immediately and another every [`HEARTBEAT_INTERVAL`], and
//! deciphers each datagram it receives.

use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use gt_telemetry_protocol::{TelemetryFormat, cipher};
use parking_lot::Mutex;
use tokio::net::UdpSocket;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use super::TelemetrySource;
use crate::error::SourceError;

/// Port the console listens on for heartbeats.
pub const DEFAULT_SEND_PORT: u16 = 33739;

/// Default heartbeat period; also how long a read waits after the latest
/// heartbeat attempt.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(10);

/// Largest datagram accepted.
pub const RECEIVE_BUFFER_LEN: usize = 4096;

/// Where to send heartbeats and where to listen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UdpSourceConfig {
    pub host: String,
    pub send_port: u16,
    /// Defaults to `send_port + 1`. Port 0 binds an ephemeral port.
    pub listen_port: Option<u16>,
    pub format: TelemetryFormat,
    pub heartbeat_interval: Duration,
}

impl UdpSourceConfig {
    pub fn new(host: impl Into<String>, send_port: u16, format: TelemetryFormat) -> Self {
        Self {
            host: host.into(),
            send_port,
            listen_port: None,
            format,
            heartbeat_interval: HEARTBEAT_INTERVAL,
        }
    }

    #[must_use]
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    #[must_use]
    pub fn with_listen_port(mut self, port: u16) -> Self {
        self.listen_port = Some(port);
        self
    }

    /// # Errors
    ///
    /// Fails when no listen port is set and `send_port + 1` overflows.
    pub fn effective_listen_port(&self) -> Result<u16, SourceError> {
        match self.listen_port {
            Some(port) => Ok(port),
            None => self.send_port.checked_add(1).ok_or_else(|| {
                SourceError::Io(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("no listen port after send port {}", self.send_port),
                ))
            }),
        }
    }
}

/// Telemetry source reading enciphered datagrams from the console.
pub struct UdpSource {
    socket: Arc<UdpSocket>,
    target: SocketAddr,
    format: TelemetryFormat,
    deadline: Arc<Mutex<Instant>>,
    heartbeats_sent: Arc<AtomicU64>,
    shutdown_tx: broadcast::Sender<()>,
    heartbeat: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl UdpSource {
    /// Bind the listen socket and start the heartbeat task.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Io`] when the host cannot be resolved, the
    /// socket cannot be bound, or the heartbeat interval is zero.
    pub async fn connect(config: UdpSourceConfig) -> Result<Self, SourceError> {
        let listen_port = config.effective_listen_port()?;
        if config.heartbeat_interval.is_zero() {
            return Err(SourceError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                "heartbeat interval must be non-zero",
            )));
        }
        let target = tokio::net::lookup_host((config.host.as_str(), config.send_port))
            .await?
            .next()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("cannot resolve {}", config.host),
                )
            })?;

        let socket = UdpSocket::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, listen_port))).await?;
        socket.set_broadcast(true)?;
        let socket = Arc::new(socket);
        info!(
            local_addr = %socket.local_addr()?,
            %target,
            format = %config.format,
            "udp telemetry source started"
        );

        let deadline = Arc::new(Mutex::new(Instant::now() + config.heartbeat_interval));
        let heartbeats_sent = Arc::new(AtomicU64::new(0));
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let handle = tokio::spawn(heartbeat_loop(
            Arc::clone(&socket),
            target,
            config.format,
            config.heartbeat_interval,
            Arc::clone(&deadline),
            Arc::clone(&heartbeats_sent),
            shutdown_rx,
        ));

        Ok(Self {
            socket,
            target,
            format: config.format,
            deadline,
            heartbeats_sent,
            shutdown_tx,
            heartbeat: Mutex::new(Some(handle)),
            closed: AtomicBool::new(false),
        })
    }

    /// Address the listen socket is bound to.
    ///
    /// # Errors
    ///
    /// Propagates the socket error.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Console address heartbeats go to.
    pub fn target(&self) -> SocketAddr {
        self.target
    }

    pub fn format(&self) -> TelemetryFormat {
        self.format
    }

    pub fn heartbeats_sent(&self) -> u64 {
        self.heartbeats_sent.load(Ordering::Relaxed)
    }

    fn signal_shutdown(&self) {
        if self.shutdown_tx.send(()).is_err() {
            trace!("heartbeat task already gone");
        }
    }
}

async fn heartbeat_loop(
    socket: Arc<UdpSocket>,
    target: SocketAddr,
    format: TelemetryFormat,
    interval: Duration,
    deadline: Arc<Mutex<Instant>>,
    sent: Arc<AtomicU64>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => {
                debug!("heartbeat task stopping");
                break;
            }
            _ = ticker.tick() => {
                let outcome = socket.send_to(format.heartbeat(), target).await;
                *deadline.lock() = Instant::now() + interval;
                match outcome {
                    Ok(_) => {
                        let n = sent.fetch_add(1, Ordering::Relaxed) + 1;
                        trace!(%target, heartbeats = n, "heartbeat sent");
                    }
                    Err(e) => warn!(%target, error = %e, "heartbeat send failed"),
                }
            }
        }
    }
}

#[async_trait]
impl TelemetrySource for UdpSource {
    async fn read(&self) -> Result<Vec<u8>, SourceError> {
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        if self.closed.load(Ordering::Acquire) {
            return Err(SourceError::Closed);
        }

        let deadline = *self.deadline.lock();
        let mut buf = vec![0u8; RECEIVE_BUFFER_LEN];
        let received = tokio::select! {
            _ = shutdown_rx.recv() => return Err(SourceError::Closed),
            r = tokio::time::timeout_at(deadline, self.socket.recv_from(&mut buf)) => r,
        };

        let (len, from) = match received {
            Err(_elapsed) => return Err(SourceError::Timeout),
            Ok(Err(e)) => return Err(SourceError::Receive(e)),
            Ok(Ok(r)) => r,
        };
        if len == 0 {
            return Err(SourceError::NoData);
        }
        buf.truncate(len);
        trace!(%from, len, "datagram received");

        Ok(cipher::decode(self.format.iv_seed(), &buf)?)
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.signal_shutdown();

        let handle = self.heartbeat.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "heartbeat task ended abnormally");
            }
        }
        info!(target = %self.target, "udp telemetry source closed");
    }

    fn describe(&self) -> String {
        format!("udp://{}", self.target)
    }
}

impl Drop for UdpSource {
    fn drop(&mut self) {
        if !self.closed.load(Ordering::Acquire) {
            self.signal_shutdown();
        }
    }
}
