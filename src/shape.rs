use std::fmt;

use serde::{Deserialize, Serialize};

use crate::contours::Contour;
use crate::geometry::{approx_poly_closed, min_enclosing_circle, Point, Rect};
use crate::types::DetectorConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    Triangle,
    Square,
    Rectangle,
    Circle,
}

impl ShapeKind {
    pub fn label(&self) -> &'static str {
        match self {
            ShapeKind::Triangle => "Triangulo",
            ShapeKind::Square => "Cuadrado",
            ShapeKind::Rectangle => "Rectangulo",
            ShapeKind::Circle => "Circulo",
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShapeMatch {
    pub kind: ShapeKind,
    pub bbox: Rect,
    /// Simplified outline, used for drawing
    pub polygon: Vec<Point>,
}

pub struct ShapeClassifier {
    pub tolerance_ratio: f64,
    pub square_band: (f64, f64),
    pub circularity_tolerance: f64,
}

impl ShapeClassifier {
    pub fn new(cfg: &DetectorConfig) -> Self {
        Self {
            tolerance_ratio: cfg.polygon_tolerance_ratio,
            square_band: cfg.square_aspect_band,
            circularity_tolerance: cfg.circularity_tolerance,
        }
    }

    /// Classify one contour; `None` when nothing matches or the geometry is degenerate
    pub fn classify(&self, contour: &Contour) -> Option<ShapeMatch> {
        if contour.len() < 3 {
            log::trace!("skipping contour with {} points", contour.len());
            return None;
        }

        let epsilon = self.tolerance_ratio * contour.perimeter();
        let polygon = approx_poly_closed(&contour.points, epsilon);
        let bbox = contour.bounding_rect()?;

        let kind = match polygon.len() {
            3 => ShapeKind::Triangle,
            4 => {
                let Some(ratio) = bbox.aspect_ratio() else {
                    log::trace!("skipping quadrilateral with zero-height box {:?}", bbox);
                    return None;
                };
                let (lo, hi) = self.square_band;
                if lo < ratio && ratio < hi {
                    ShapeKind::Square
                } else {
                    ShapeKind::Rectangle
                }
            }
            _ => {
                let circle = min_enclosing_circle(&contour.points)?;
                let circle_area = circle.area();
                if circle_area <= 0.0 {
                    log::trace!("skipping contour with zero-radius enclosing circle");
                    return None;
                }
                let deviation = (1.0 - contour.area() / circle_area).abs();
                if deviation < self.circularity_tolerance {
                    ShapeKind::Circle
                } else {
                    log::trace!(
                        "dropping {}-gon at {:?}: circularity deviation {:.3}",
                        polygon.len(),
                        bbox,
                        deviation
                    );
                    return None;
                }
            }
        };

        Some(ShapeMatch { kind, bbox, polygon })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contours::find_external_contours;
    use image::{GrayImage, Luma};
    use imageproc::drawing::draw_filled_circle_mut;

    fn classifier() -> ShapeClassifier {
        ShapeClassifier::new(&DetectorConfig::default())
    }

    /// Every integer point on the closed outline through `corners`
    fn outline(corners: &[(i32, i32)]) -> Contour {
        let mut out = Vec::new();
        for i in 0..corners.len() {
            let (x0, y0) = corners[i];
            let (x1, y1) = corners[(i + 1) % corners.len()];
            let steps = (x1 - x0).abs().max((y1 - y0).abs());
            for s in 0..steps {
                let t = s as f64 / steps as f64;
                out.push(Point::new(
                    (x0 as f64 + t * (x1 - x0) as f64).round() as i32,
                    (y0 as f64 + t * (y1 - y0) as f64).round() as i32,
                ));
            }
        }
        Contour::new(out)
    }

    /// Outer contour of a rasterized disc, as the extractor sees it
    fn disc(cx: i32, cy: i32, r: i32) -> Contour {
        let mut map = GrayImage::new(200, 200);
        draw_filled_circle_mut(&mut map, (cx, cy), r, Luma([255u8]));
        find_external_contours(&map).remove(0)
    }

    #[test]
    fn test_unit_aspect_quad_is_square() {
        let m = classifier().classify(&outline(&[(0, 0), (0, 49), (49, 49), (49, 0)])).unwrap();
        assert_eq!(m.kind, ShapeKind::Square);
        assert_eq!(m.bbox, Rect::new(0, 0, 50, 50));
        assert_eq!(m.polygon.len(), 4);
    }

    #[test]
    fn test_wide_quad_is_rectangle() {
        // 110 x 100 box -> ratio 1.10
        let m = classifier().classify(&outline(&[(0, 0), (0, 99), (109, 99), (109, 0)])).unwrap();
        assert_eq!(m.bbox.aspect_ratio(), Some(1.1));
        assert_eq!(m.kind, ShapeKind::Rectangle);
    }

    #[test]
    fn test_square_band_is_exclusive() {
        // 105 x 100 -> ratio exactly 1.05 -> not a square
        let m = classifier().classify(&outline(&[(0, 0), (0, 99), (104, 99), (104, 0)])).unwrap();
        assert_eq!(m.kind, ShapeKind::Rectangle);
        // 104 x 100 -> 1.04 -> square
        let m = classifier().classify(&outline(&[(0, 0), (0, 99), (103, 99), (103, 0)])).unwrap();
        assert_eq!(m.kind, ShapeKind::Square);
    }

    #[test]
    fn test_regular_triangle_of_area_600() {
        // Side ~37.2 gives area ~600
        let contour = outline(&[(0, 32), (37, 32), (19, 0)]);
        assert!((contour.area() - 600.0).abs() < 15.0, "area {}", contour.area());
        let m = classifier().classify(&contour).unwrap();
        assert_eq!(m.kind, ShapeKind::Triangle);
        assert_eq!(m.polygon.len(), 3);
    }

    #[test]
    fn test_circle_detected() {
        let m = classifier().classify(&disc(100, 100, 50)).unwrap();
        assert_eq!(m.kind, ShapeKind::Circle);
        assert_eq!(m.bbox, Rect::new(50, 50, 101, 101));
    }

    #[test]
    fn test_non_circular_polygon_dropped() {
        // A long thin hexagon fails the circularity test
        let contour = outline(&[(0, 10), (20, 0), (180, 0), (200, 10), (180, 20), (20, 20)]);
        assert!(classifier().classify(&contour).is_none());
    }

    #[test]
    fn test_degenerate_contours_skipped() {
        assert!(classifier().classify(&Contour::new(vec![Point::new(1, 1)])).is_none());
        assert!(classifier()
            .classify(&Contour::new(vec![Point::new(0, 0), Point::new(9, 0)]))
            .is_none());
        // Collinear points: enclosing circle exists but the contour has no area
        let line = Contour::new(vec![Point::new(0, 0), Point::new(5, 0), Point::new(10, 0), Point::new(5, 0)]);
        assert!(classifier().classify(&line).map(|m| m.kind) != Some(ShapeKind::Circle));
    }

    #[test]
    fn test_labels() {
        assert_eq!(ShapeKind::Triangle.to_string(), "Triangulo");
        assert_eq!(ShapeKind::Square.label(), "Cuadrado");
        assert_eq!(ShapeKind::Rectangle.label(), "Rectangulo");
        assert_eq!(ShapeKind::Circle.label(), "Circulo");
    }
}
