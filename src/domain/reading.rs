// Sensor reading domain model and lenient frame decoding
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reading {
    pub sensor_id: String,
    pub seq: u64,
    pub value: f64,
}

/// Timestamps stamped by the upstream server, both optional on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServerMeta {
    pub sent_unix_nano: Option<i64>,
    pub received_unix_nano: Option<i64>,
}

impl ServerMeta {
    /// Server-side send time: `sent`, else `received`, else 0.
    pub fn send_unix_nano(&self) -> i64 {
        self.sent_unix_nano.or(self.received_unix_nano).unwrap_or(0)
    }
}

/// One decoded inbound message.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub reading: Reading,
    pub meta: ServerMeta,
    pub client_recv_unix_nano: i64,
}

#[derive(Debug, Error, PartialEq)]
pub enum FrameError {
    #[error("frame is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("upstream reported an error: {0}")]
    Upstream(String),
}

/// Key names accepted for each payload field, tried in order.
///
/// The upstream services disagree on casing (`sensorId` vs `sensor_id`), so every
/// field takes a list.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct FieldMapping {
    #[serde(default = "default_reading_keys")]
    pub reading: Vec<String>,
    #[serde(default = "default_meta_keys")]
    pub meta: Vec<String>,
    #[serde(default = "default_sensor_id_keys")]
    pub sensor_id: Vec<String>,
    #[serde(default = "default_seq_keys")]
    pub seq: Vec<String>,
    #[serde(default = "default_value_keys")]
    pub value: Vec<String>,
    #[serde(default = "default_sent_keys")]
    pub sent_unix_nano: Vec<String>,
    #[serde(default = "default_received_keys")]
    pub received_unix_nano: Vec<String>,
    #[serde(default = "default_client_recv_keys")]
    pub client_recv_unix_nano: Vec<String>,
}

fn keys(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

fn default_reading_keys() -> Vec<String> {
    keys(&["reading"])
}

fn default_meta_keys() -> Vec<String> {
    keys(&["meta"])
}

fn default_sensor_id_keys() -> Vec<String> {
    keys(&["sensorId", "sensor_id"])
}

fn default_seq_keys() -> Vec<String> {
    keys(&["seq"])
}

fn default_value_keys() -> Vec<String> {
    keys(&["value"])
}

fn default_sent_keys() -> Vec<String> {
    keys(&["sentUnixNano", "sent_unix_nano"])
}

fn default_received_keys() -> Vec<String> {
    keys(&["receivedUnixNano", "received_unix_nano"])
}

fn default_client_recv_keys() -> Vec<String> {
    keys(&["client_recv_unix_nano", "clientRecvUnixNano"])
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self {
            reading: default_reading_keys(),
            meta: default_meta_keys(),
            sensor_id: default_sensor_id_keys(),
            seq: default_seq_keys(),
            value: default_value_keys(),
            sent_unix_nano: default_sent_keys(),
            received_unix_nano: default_received_keys(),
            client_recv_unix_nano: default_client_recv_keys(),
        }
    }
}

impl Event {
    /// Decode a text frame. Missing fields fall back to 0 / empty; only frames that
    /// are not JSON at all, or that carry an upstream `error` and no reading, fail.
    ///
    /// A gateway `{"error": ...}` notice is the one payload without a reading that is
    /// not filled with defaults. Treating it as a zero-timestamp event would put an
    /// epoch-sized latency into the window, so it is rejected and counted as dropped.
    pub fn decode(
        payload: &str,
        fields: &FieldMapping,
        local_recv_unix_nano: i64,
    ) -> Result<Self, FrameError> {
        let root: Value =
            serde_json::from_str(payload).map_err(|e| FrameError::InvalidJson(e.to_string()))?;

        let reading = lookup(&root, &fields.reading);
        if reading.is_none() {
            if let Some(message) = root.get("error").and_then(Value::as_str) {
                return Err(FrameError::Upstream(message.to_string()));
            }
        }

        let reading = reading
            .map(|r| Reading {
                sensor_id: lookup(r, &fields.sensor_id)
                    .and_then(as_text)
                    .unwrap_or_default(),
                seq: lookup(r, &fields.seq).and_then(as_u64).unwrap_or(0),
                value: lookup(r, &fields.value).and_then(as_f64).unwrap_or(0.0),
            })
            .unwrap_or_default();

        let meta = lookup(&root, &fields.meta)
            .map(|m| ServerMeta {
                sent_unix_nano: lookup(m, &fields.sent_unix_nano).and_then(as_i64),
                received_unix_nano: lookup(m, &fields.received_unix_nano).and_then(as_i64),
            })
            .unwrap_or_default();

        let client_recv_unix_nano = lookup(&root, &fields.client_recv_unix_nano)
            .and_then(as_i64)
            .unwrap_or(local_recv_unix_nano);

        Ok(Self {
            reading,
            meta,
            client_recv_unix_nano,
        })
    }
}

/// First non-null value stored under any of `names`.
fn lookup<'a>(value: &'a Value, names: &[String]) -> Option<&'a Value> {
    names
        .iter()
        .filter_map(|name| value.get(name))
        .find(|v| !v.is_null())
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// protobuf JSON encodes 64-bit integers as strings
fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
