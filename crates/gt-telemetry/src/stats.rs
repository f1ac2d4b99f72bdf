//! Per-client packet statistics.
//!
//! Packet counts (total, invalid, dropped, out-of-order) are always kept.
//! Decode timing and packet rate are only measured when statistics are
//! enabled, since they need a clock read per frame.

use std::time::{Duration, Instant};

use serde::Serialize;

/// Sequence-ID span over which the packet rate is sampled.
pub const RATE_SAMPLE_SPAN: u32 = 10;

/// Point-in-time copy of the client's statistics.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Statistics {
    /// Whether timing and rate are being measured.
    pub enabled: bool,
    /// Frames decoded successfully.
    pub packets_total: u64,
    /// Frames rejected by the cipher or decoder.
    pub packets_invalid: u64,
    /// Frames missing from gaps in the sequence ID.
    pub packets_dropped: u64,
    /// Frames whose sequence ID did not advance.
    pub packets_out_of_order: u64,
    pub last_sequence_id: Option<u32>,
    pub decode_time_avg: Duration,
    pub decode_time_max: Duration,
    /// Packets per second, averaged over all samples.
    pub packet_rate_avg: f64,
    pub packet_rate_max: f64,
    pub packet_rate_last: f64,
}

impl Statistics {
    /// Share of frames lost to sequence gaps, in percent.
    ///
    /// Returns 0.0 if nothing has been received.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn drop_percent(&self) -> f64 {
        let total = self.packets_total.saturating_add(self.packets_dropped);
        if total == 0 {
            return 0.0;
        }
        self.packets_dropped as f64 / total as f64 * 100.0
    }
}

/// Accumulates [`Statistics`] from the read loop.
#[derive(Debug, Default)]
pub struct StatsCollector {
    stats: Statistics,
    decode_samples: u32,
    decode_total: Duration,
    rate_anchor: Option<(u32, Instant)>,
    rate_samples: u32,
}

impl StatsCollector {
    pub fn new(enabled: bool) -> Self {
        Self {
            stats: Statistics {
                enabled,
                ..Statistics::default()
            },
            ..Self::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.stats.enabled
    }

    /// Count a frame the cipher or decoder rejected.
    pub fn record_invalid(&mut self) {
        self.stats.packets_invalid += 1;
    }

    /// Record a decoded frame.
    pub fn record_frame(&mut self, sequence_id: u32, decode_time: Duration) {
        self.record_frame_at(sequence_id, decode_time, Instant::now());
    }

    /// As [`StatsCollector::record_frame`] with an explicit clock reading.
    pub fn record_frame_at(&mut self, sequence_id: u32, decode_time: Duration, now: Instant) {
        self.stats.packets_total += 1;
        self.track_sequence(sequence_id);

        if !self.stats.enabled {
            return;
        }
        self.track_decode_time(decode_time);
        self.track_rate(sequence_id, now);
    }

    fn track_sequence(&mut self, sequence_id: u32) {
        match self.stats.last_sequence_id {
            Some(last) if sequence_id > last => {
                self.stats.packets_dropped += u64::from(sequence_id - last - 1);
                self.stats.last_sequence_id = Some(sequence_id);
            }
            Some(_) => self.stats.packets_out_of_order += 1,
            None => self.stats.last_sequence_id = Some(sequence_id),
        }
    }

    fn track_decode_time(&mut self, decode_time: Duration) {
        self.decode_samples = self.decode_samples.saturating_add(1);
        self.decode_total = self.decode_total.saturating_add(decode_time);
        self.stats.decode_time_avg = self.decode_total / self.decode_samples;
        self.stats.decode_time_max = self.stats.decode_time_max.max(decode_time);
    }

    fn track_rate(&mut self, sequence_id: u32, now: Instant) {
        let Some((anchor_seq, anchor_at)) = self.rate_anchor else {
            self.rate_anchor = Some((sequence_id, now));
            return;
        };
        let span = sequence_id.saturating_sub(anchor_seq);
        if span < RATE_SAMPLE_SPAN {
            return;
        }

        let elapsed = now.saturating_duration_since(anchor_at).as_secs_f64();
        self.rate_anchor = Some((sequence_id, now));
        if elapsed <= 0.0 {
            return;
        }

        let rate = f64::from(span) / elapsed;
        self.rate_samples = self.rate_samples.saturating_add(1);
        let n = f64::from(self.rate_samples);
        self.stats.packet_rate_avg += (rate - self.stats.packet_rate_avg) / n;
        self.stats.packet_rate_max = self.stats.packet_rate_max.max(rate);
        self.stats.packet_rate_last = rate;
    }

    pub fn snapshot(&self) -> Statistics {
        self.stats
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.stats.enabled);
    }
}
