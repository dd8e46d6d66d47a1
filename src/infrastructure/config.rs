use serde::Deserialize;

use crate::domain::chart::Theme;
use crate::domain::connection::SubscriptionTarget;
use crate::domain::reading::FieldMapping;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ViewerConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub stream: StreamSettings,
    #[serde(default)]
    pub window: WindowSettings,
    #[serde(default)]
    pub fields: FieldMapping,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StreamSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_sensor_id")]
    pub sensor_id: String,
    #[serde(default = "default_presets")]
    pub presets: Vec<String>,
    #[serde(default = "default_true")]
    pub auto_connect: bool,
    #[serde(default)]
    pub theme: Theme,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            sensor_id: default_sensor_id(),
            presets: default_presets(),
            auto_connect: true,
            theme: Theme::default(),
        }
    }
}

impl StreamSettings {
    pub fn default_target(&self) -> SubscriptionTarget {
        SubscriptionTarget::new(&self.base_url, &self.sensor_id)
    }
}

/// Capacities of the rolling windows and the tick length.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct WindowSettings {
    #[serde(default = "default_latency_capacity")]
    pub latency_capacity: usize,
    #[serde(default = "default_latency_capacity")]
    pub percentile_samples: usize,
    #[serde(default = "default_jitter_samples")]
    pub jitter_samples: usize,
    #[serde(default = "default_series_capacity")]
    pub series_capacity: usize,
    #[serde(default = "default_log_capacity")]
    pub log_capacity: usize,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            latency_capacity: default_latency_capacity(),
            percentile_samples: default_latency_capacity(),
            jitter_samples: default_jitter_samples(),
            series_capacity: default_series_capacity(),
            log_capacity: default_log_capacity(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8090".to_string()
}

fn default_base_url() -> String {
    "ws://localhost:8080".to_string()
}

fn default_sensor_id() -> String {
    "*".to_string()
}

fn default_presets() -> Vec<String> {
    vec![
        "ws://localhost:8080".to_string(),
        "ws://localhost:8081".to_string(),
    ]
}

fn default_true() -> bool {
    true
}

fn default_latency_capacity() -> usize {
    2000
}

fn default_jitter_samples() -> usize {
    30
}

fn default_series_capacity() -> usize {
    80
}

fn default_log_capacity() -> usize {
    150
}

fn default_tick_interval_ms() -> u64 {
    1000
}

/// Load `config/viewer.*` if present, overridden by `VIEWER__SECTION__KEY` variables.
pub fn load_viewer_config() -> anyhow::Result<ViewerConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/viewer").required(false))
        .add_source(config::Environment::with_prefix("VIEWER").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_any_source() {
        let settings = config::Config::builder().build().unwrap();
        let config: ViewerConfig = settings.try_deserialize().unwrap();

        assert_eq!(config.server.bind, "0.0.0.0:8090");
        assert_eq!(config.window, WindowSettings::default());
        assert_eq!(config.window.latency_capacity, 2000);
        assert_eq!(config.window.jitter_samples, 30);
        assert_eq!(config.stream.presets.len(), 2);
        assert!(config.stream.auto_connect);
        assert_eq!(config.fields, FieldMapping::default());
    }

    #[test]
    fn test_toml_overrides() {
        let toml = r#"
            [stream]
            base_url = "ws://gateway:8081/"
            sensor_id = "sensor-1"
            theme = "light"

            [window]
            series_capacity = 60
            log_capacity = 100

            [fields]
            sensor_id = ["sensor_id"]
        "#;
        let settings = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap();
        let config: ViewerConfig = settings.try_deserialize().unwrap();

        assert_eq!(config.window.series_capacity, 60);
        assert_eq!(config.window.log_capacity, 100);
        assert_eq!(config.window.latency_capacity, 2000);
        assert_eq!(config.stream.theme, Theme::Light);
        assert_eq!(config.fields.sensor_id, vec!["sensor_id".to_string()]);
        assert_eq!(config.fields.seq, vec!["seq".to_string()]);
        assert_eq!(
            config.stream.default_target().subscribe_url(),
            "ws://gateway:8081/ws/subscribe?sensor_id=sensor-1"
        );
    }
}
