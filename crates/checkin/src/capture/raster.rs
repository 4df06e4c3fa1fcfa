//! Stroke rasterization.
//!
//! Strokes are drawn into a coverage mask: each pixel keeps the highest pen
//! coverage any segment gave it, so overlapping segments at stroke joints do
//! not darken. The mask becomes RGBA with a single pen color.

use super::Point;

/// Coverage mask the size of the signature pad.
#[derive(Debug, Clone)]
pub struct Canvas {
    width: u32,
    height: u32,
    coverage: Vec<f32>,
}

impl Canvas {
    /// Create a fully transparent canvas.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            coverage: vec![0.0; width as usize * height as usize],
        }
    }

    /// Draw a round-capped segment of the given pen width.
    ///
    /// A zero-length segment draws a dot.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn stroke_segment(&mut self, a: Point, b: Point, pen_width: f32) {
        let radius = pen_width / 2.0;
        let reach = radius + 1.0;

        let min_x = (a.x.min(b.x) - reach).floor().max(0.0);
        let min_y = (a.y.min(b.y) - reach).floor().max(0.0);
        let max_x = (a.x.max(b.x) + reach).ceil().min(self.width as f32);
        let max_y = (a.y.max(b.y) + reach).ceil().min(self.height as f32);
        if min_x >= max_x || min_y >= max_y {
            return;
        }

        for y in min_y as u32..max_y as u32 {
            for x in min_x as u32..max_x as u32 {
                let center = Point {
                    x: x as f32 + 0.5,
                    y: y as f32 + 0.5,
                };
                let cover = (radius + 0.5 - distance_to_segment(center, a, b)).clamp(0.0, 1.0);
                if cover > 0.0 {
                    let idx = y as usize * self.width as usize + x as usize;
                    self.coverage[idx] = self.coverage[idx].max(cover);
                }
            }
        }
    }

    /// Draw a polyline through `points`.
    pub fn stroke_path(&mut self, points: &[Point], pen_width: f32) {
        match points {
            [] => {}
            [only] => self.stroke_segment(*only, *only, pen_width),
            _ => {
                for pair in points.windows(2) {
                    self.stroke_segment(pair[0], pair[1], pen_width);
                }
            }
        }
    }

    /// Canvas width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Canvas height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Coverage of the pixel at (`x`, `y`), between 0 and 1.
    #[must_use]
    pub fn coverage_at(&self, x: u32, y: u32) -> f32 {
        self.coverage[y as usize * self.width as usize + x as usize]
    }

    /// Convert to straight-alpha RGBA in the given color.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn to_rgba(&self, color: [u8; 3]) -> Vec<u8> {
        self.coverage
            .iter()
            .flat_map(|&c| {
                if c > 0.0 {
                    [color[0], color[1], color[2], (c * 255.0).round() as u8]
                } else {
                    [0, 0, 0, 0]
                }
            })
            .collect()
    }
}

fn distance_to_segment(p: Point, a: Point, b: Point) -> f32 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq > 0.0 {
        (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let (cx, cy) = (a.x + t * dx, a.y + t * dy);
    ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt()
}
