// Per-tick summaries and log lines produced by the ingestion pipeline
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt;

use super::reading::Event;

/// Summary emitted once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickSnapshot {
    pub tps: u64,
    pub tps_max: u64,
    pub tps_avg_cumulative: f64,
    pub p50: f64,
    pub p95: f64,
    pub jitter: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub sensor_id: String,
    pub seq: u64,
    pub value: f64,
    pub latency_ms: f64,
}

impl LogEntry {
    pub fn new(event: &Event, latency_ms: f64, timestamp: DateTime<Local>) -> Self {
        Self {
            timestamp,
            sensor_id: event.reading.sensor_id.clone(),
            seq: event.reading.seq,
            value: event.reading.value,
            latency_ms,
        }
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} #{} v={:.2} ms={:.2}",
            self.timestamp.format("%H:%M:%S"),
            self.sensor_id,
            self.seq,
            self.value,
            self.latency_ms
        )
    }
}

/// Text shown in the KPI tiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiDisplay {
    pub tps: String,
    pub tps_max: String,
    pub tps_avg: String,
    pub p50: String,
    pub p95: String,
    pub jitter: String,
}

impl KpiDisplay {
    pub fn placeholder() -> Self {
        Self {
            tps: "0".to_string(),
            tps_max: "0".to_string(),
            tps_avg: "0".to_string(),
            p50: "-".to_string(),
            p95: "-".to_string(),
            jitter: "-".to_string(),
        }
    }

    pub fn from_snapshot(snapshot: Option<&TickSnapshot>) -> Self {
        match snapshot {
            Some(s) => Self {
                tps: s.tps.to_string(),
                tps_max: s.tps_max.to_string(),
                tps_avg: format!("{:.1}", s.tps_avg_cumulative),
                p50: format!("{:.2}", s.p50),
                p95: format!("{:.2}", s.p95),
                jitter: format!("{:.2}", s.jitter),
            },
            None => Self::placeholder(),
        }
    }
}
