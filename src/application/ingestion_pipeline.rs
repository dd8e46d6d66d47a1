// Ingestion pipeline - Turns decoded events into rolling windows and tick snapshots
use crate::application::latency_estimator::LatencyEstimator;
use crate::application::streaming_stats::{jitter, percentile, StreamingStats};
use crate::domain::bounded_series::BoundedSeries;
use crate::domain::reading::{Event, FieldMapping};
use crate::domain::snapshot::{LogEntry, TickSnapshot};
use crate::infrastructure::config::WindowSettings;
use chrono::Local;
use std::time::{Duration, Instant};

/// Owns every window, counter and the tick boundary marker.
///
/// Events go in through [`IngestionPipeline::on_event`]; a [`TickSnapshot`] comes out
/// whenever an event lands at or past the tick boundary.
pub struct IngestionPipeline {
    settings: WindowSettings,
    fields: FieldMapping,
    estimator: LatencyEstimator,
    stats: StreamingStats,
    latency_window: BoundedSeries<f64>,
    throughput_series: BoundedSeries<u64>,
    latency_series: BoundedSeries<f64>,
    log: BoundedSeries<LogEntry>,
    events_in_tick: u64,
    tick_started: Instant,
    last_snapshot: Option<TickSnapshot>,
    dropped_frames: u64,
}

impl IngestionPipeline {
    pub fn new(settings: WindowSettings, fields: FieldMapping, now: Instant) -> Self {
        Self {
            latency_window: BoundedSeries::new(settings.latency_capacity),
            throughput_series: BoundedSeries::new(settings.series_capacity),
            latency_series: BoundedSeries::new(settings.series_capacity),
            log: BoundedSeries::new(settings.log_capacity),
            settings,
            fields,
            estimator: LatencyEstimator::new(),
            stats: StreamingStats::new(),
            events_in_tick: 0,
            tick_started: now,
            last_snapshot: None,
            dropped_frames: 0,
        }
    }

    /// Decode a raw text frame and feed it through the pipeline.
    /// `local_recv_unix_nano` is when the frame came off the socket.
    /// Undecodable frames are counted and skipped.
    pub fn ingest_frame(
        &mut self,
        payload: &str,
        local_recv_unix_nano: i64,
        now: Instant,
    ) -> Option<TickSnapshot> {
        match Event::decode(payload, &self.fields, local_recv_unix_nano) {
            Ok(event) => self.on_event(event, now),
            Err(e) => {
                self.dropped_frames += 1;
                tracing::warn!("Dropping frame: {}", e);
                None
            }
        }
    }

    pub fn on_event(&mut self, event: Event, now: Instant) -> Option<TickSnapshot> {
        let latency_ms = self.estimator.estimate(&event);

        self.log.push(LogEntry::new(&event, latency_ms, Local::now()));
        self.latency_window.push(latency_ms);
        self.events_in_tick += 1;

        if now.saturating_duration_since(self.tick_started) >= self.tick_interval() {
            Some(self.close_tick(now))
        } else {
            None
        }
    }

    fn close_tick(&mut self, now: Instant) -> TickSnapshot {
        let throughput = self.stats.observe_tick(self.events_in_tick);
        self.events_in_tick = 0;
        self.tick_started = now;
        self.throughput_series.push(throughput.tps);

        let window: Vec<f64> = self
            .latency_window
            .recent(self.settings.percentile_samples)
            .copied()
            .collect();
        let p50 = percentile(&window, 0.50);
        let p95 = percentile(&window, 0.95);

        let recent: Vec<f64> = self
            .latency_window
            .recent(self.settings.jitter_samples)
            .copied()
            .collect();
        let jitter = jitter(&recent);

        self.latency_series.push(p95);

        let snapshot = TickSnapshot {
            tps: throughput.tps,
            tps_max: throughput.tps_max,
            tps_avg_cumulative: throughput.tps_avg,
            p50,
            p95,
            jitter,
        };
        tracing::debug!(
            tps = snapshot.tps,
            p50 = snapshot.p50,
            p95 = snapshot.p95,
            jitter = snapshot.jitter,
            "Tick closed"
        );
        self.last_snapshot = Some(snapshot);
        snapshot
    }

    /// Clear windows, series, log and running stats. The tick restarts at `now`.
    pub fn reset(&mut self, now: Instant) {
        self.latency_window.clear();
        self.throughput_series.clear();
        self.latency_series.clear();
        self.log.clear();
        self.stats.reset();
        self.events_in_tick = 0;
        self.tick_started = now;
        self.last_snapshot = None;
        self.dropped_frames = 0;
    }

    fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.settings.tick_interval_ms)
    }

    pub fn latency_window(&self) -> &BoundedSeries<f64> {
        &self.latency_window
    }

    pub fn throughput_series(&self) -> &BoundedSeries<u64> {
        &self.throughput_series
    }

    pub fn latency_series(&self) -> &BoundedSeries<f64> {
        &self.latency_series
    }

    /// Log entries, newest first.
    pub fn log_newest_first(&self) -> Vec<LogEntry> {
        self.log.values().rev().cloned().collect()
    }

    #[cfg(test)]
    pub fn log_len(&self) -> usize {
        self.log.len()
    }

    pub fn last_snapshot(&self) -> Option<&TickSnapshot> {
        self.last_snapshot.as_ref()
    }

    #[cfg(test)]
    pub fn tps_max(&self) -> u64 {
        self.stats.tps_max()
    }

    #[cfg(test)]
    pub fn events_in_tick(&self) -> u64 {
        self.events_in_tick
    }

    pub fn dropped_frames(&self) -> u64 {
        self.dropped_frames
    }
}
