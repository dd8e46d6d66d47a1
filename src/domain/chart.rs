// Chart domain models
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub color: String,
    pub width: f64,
}

impl Stroke {
    pub fn new(color: &str, width: f64) -> Self {
        Self {
            color: color.to_string(),
            width,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Throughput,
    Latency,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn background(self) -> &'static str {
        match self {
            Theme::Dark => "#0f1117",
            Theme::Light => "#ffffff",
        }
    }

    pub fn stroke(self, kind: ChartKind) -> Stroke {
        let color = match kind {
            ChartKind::Throughput => "#5b7bff",
            ChartKind::Latency => "#34d399",
        };
        Stroke::new(color, 2.0)
    }
}
