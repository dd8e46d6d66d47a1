// Chart renderer - Maps a numeric series onto a drawing surface
use crate::domain::chart::{Point, Stroke};

const PADDING: f64 = 8.0;
const MIN_RANGE: f64 = 1e-9;

/// Anything a trace can be stroked onto.
pub trait DrawingSurface {
    /// Width and height in surface units.
    fn size(&self) -> (f64, f64);

    fn clear(&mut self);

    fn stroke_polyline(&mut self, points: &[Point], stroke: &Stroke);
}

/// Scales a series to its own min/max and draws it as one connected line.
#[derive(Debug, Clone, Copy)]
pub struct ChartRenderer {
    padding: f64,
}

impl Default for ChartRenderer {
    fn default() -> Self {
        Self { padding: PADDING }
    }
}

impl ChartRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Surface coordinates for every value; y grows downward.
    pub fn project(&self, values: &[f64], width: f64, height: f64) -> Vec<Point> {
        if values.is_empty() {
            return Vec::new();
        }

        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(*v), hi.max(*v))
            });
        let range = (max - min).max(MIN_RANGE);

        let inner_width = width - 2.0 * self.padding;
        let inner_height = height - 2.0 * self.padding;
        let last = values.len() - 1;

        values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let t = if last == 0 { 0.5 } else { i as f64 / last as f64 };
                let x = self.padding + inner_width * t;
                let y = height - self.padding - inner_height * ((v - min) / range);
                Point::new(x, y)
            })
            .collect()
    }

    pub fn render<S: DrawingSurface>(&self, values: &[f64], surface: &mut S, stroke: &Stroke) {
        surface.clear();
        if values.is_empty() {
            return;
        }

        let (width, height) = surface.size();
        let points = self.project(values, width, height);
        surface.stroke_polyline(&points, stroke);
    }
}
