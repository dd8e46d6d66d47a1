// Connection state and subscription target
use serde::{Deserialize, Serialize};

pub const UNFILTERED: &str = "*";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

/// Where to subscribe and which sensors to ask for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionTarget {
    pub base_url: String,
    pub sensor_id: String,
}

impl SubscriptionTarget {
    pub fn new(base_url: &str, sensor_id: &str) -> Self {
        let sensor_id = sensor_id.trim();
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            sensor_id: if sensor_id.is_empty() {
                UNFILTERED.to_string()
            } else {
                sensor_id.to_string()
            },
        }
    }

    pub fn subscribe_url(&self) -> String {
        format!(
            "{}/ws/subscribe?sensor_id={}",
            self.base_url,
            urlencoding::encode(&self.sensor_id)
        )
    }
}

/// Status reported to the UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatus {
    pub state: ConnectionState,
    pub paused: bool,
    pub target: Option<SubscriptionTarget>,
    pub channel_id: Option<u64>,
    pub last_error: Option<String>,
    pub discarded_while_paused: u64,
    pub stale_frames: u64,
}
