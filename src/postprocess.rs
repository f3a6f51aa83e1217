use image::Rgb;
use imageproc::drawing::{draw_filled_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect as DrawRect;
use serde::{Deserialize, Serialize};

use crate::color::ColorBucket;
use crate::font;
use crate::geometry::{Point, Rect};
use crate::image_impl::Frame;
use crate::shape::{ShapeKind, ShapeMatch};
use crate::types::DrawConfig;

/// One labelled shape of a frame
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShapeRecord {
    /// "<color> <shape>", e.g. "Azul Circulo"
    pub label: String,
    pub bbox: Rect,
}

impl ShapeRecord {
    pub fn new(color: ColorBucket, shape: ShapeKind, bbox: Rect) -> Self {
        Self {
            label: format!("{} {}", color.label(), shape.label()),
            bbox,
        }
    }
}

/// A classified contour: the record plus the outline it was derived from
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedShape {
    pub shape: ShapeMatch,
    pub color: ColorBucket,
}

impl ClassifiedShape {
    pub fn to_record(&self) -> ShapeRecord {
        ShapeRecord::new(self.color, self.shape.kind, self.shape.bbox)
    }
}

/// Draws outlines and labels onto a copy of the frame
pub struct Annotator {
    pub cfg: DrawConfig,
}

impl Annotator {
    pub fn new(cfg: DrawConfig) -> Self {
        Self { cfg }
    }

    pub fn draw(&self, frame: &Frame, shapes: &[ClassifiedShape]) -> Frame {
        let mut out = frame.clone();
        for shape in shapes {
            self.draw_outline(&mut out, &shape.shape.polygon);
            let record = shape.to_record();
            self.draw_label(&mut out, &record.label, record.bbox);
        }
        out
    }

    fn draw_outline(&self, frame: &mut Frame, polygon: &[Point]) {
        if polygon.len() < 2 {
            return;
        }
        let color = Rgb(self.cfg.outline_color);
        let t = self.cfg.thickness.max(1) as i32;
        let (lo, hi) = (-(t - 1) / 2, t / 2);
        let canvas = frame.as_rgb_mut();

        let n = polygon.len();
        for i in 0..n {
            let a = polygon[i];
            let b = polygon[(i + 1) % n];
            // Thick lines as a bundle of offset one-pixel segments
            for oy in lo..=hi {
                for ox in lo..=hi {
                    draw_line_segment_mut(
                        canvas,
                        ((a.x + ox) as f32, (a.y + oy) as f32),
                        ((b.x + ox) as f32, (b.y + oy) as f32),
                        color,
                    );
                }
            }
        }
    }

    fn draw_label(&self, frame: &mut Frame, text: &str, bbox: Rect) {
        let scale = self.cfg.text_scale.max(1);
        let text_h = (font::GLYPH_HEIGHT * scale) as i32;
        let text_w = (font::text_width(text) * scale) as i32;
        let (fw, fh) = (frame.width() as i32, frame.height() as i32);

        // 10px above the box, kept inside the frame
        let x = bbox.x.min(fw - text_w).max(0);
        let y = (bbox.y - 10 - text_h).min(fh - text_h).max(0);

        let color = Rgb(self.cfg.text_color);
        let canvas = frame.as_rgb_mut();
        for (px, py) in font::lit_pixels(text) {
            let rect = DrawRect::at(x + (px * scale) as i32, y + (py * scale) as i32).of_size(scale, scale);
            draw_filled_rect_mut(canvas, rect, color);
        }
    }
}
