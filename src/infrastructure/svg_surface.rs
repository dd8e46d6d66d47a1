// SVG drawing surface for chart traces
use crate::application::chart_renderer::DrawingSurface;
use crate::domain::chart::{Point, Stroke};
use std::fmt::Write;

pub struct SvgSurface {
    width: f64,
    height: f64,
    background: String,
    body: String,
}

impl SvgSurface {
    pub fn new(width: f64, height: f64, background: &str) -> Self {
        Self {
            width,
            height,
            background: background.to_string(),
            body: String::new(),
        }
    }

    pub fn into_svg(self) -> String {
        format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}"><rect width="100%" height="100%" fill="{bg}"/>{body}</svg>"#,
            w = self.width,
            h = self.height,
            bg = self.background,
            body = self.body
        )
    }
}

impl DrawingSurface for SvgSurface {
    fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn clear(&mut self) {
        self.body.clear();
    }

    fn stroke_polyline(&mut self, points: &[Point], stroke: &Stroke) {
        match points {
            [] => {}
            [p] => {
                let _ = write!(
                    self.body,
                    r#"<circle cx="{:.2}" cy="{:.2}" r="{:.2}" fill="{}"/>"#,
                    p.x, p.y, stroke.width, stroke.color
                );
            }
            _ => {
                let coords: Vec<String> = points
                    .iter()
                    .map(|p| format!("{:.2},{:.2}", p.x, p.y))
                    .collect();
                let _ = write!(
                    self.body,
                    r#"<polyline points="{}" fill="none" stroke="{}" stroke-width="{}" stroke-linejoin="round"/>"#,
                    coords.join(" "),
                    stroke.color,
                    stroke.width
                );
            }
        }
    }
}
