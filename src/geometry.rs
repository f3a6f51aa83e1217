use nalgebra::{Matrix2, Vector2};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    fn to_vector(self) -> Vector2<f64> {
        Vector2::new(self.x as f64, self.y as f64)
    }
}

/// Axis-aligned box in pixel units, inclusive of its first row/column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Smallest box covering every point; `None` for an empty slice
    pub fn bounding(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut max_x, mut min_y, mut max_y) = (first.x, first.x, first.y, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            max_x = max_x.max(p.x);
            min_y = min_y.min(p.y);
            max_y = max_y.max(p.y);
        }
        Some(Self::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
    }

    /// width / height, `None` when the height is zero
    pub fn aspect_ratio(&self) -> Option<f64> {
        if self.height == 0 {
            return None;
        }
        Some(self.width as f64 / self.height as f64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub center: Vector2<f64>,
    pub radius: f64,
}

impl Circle {
    fn from_point(p: Vector2<f64>) -> Self {
        Self { center: p, radius: 0.0 }
    }

    fn from_diameter(a: Vector2<f64>, b: Vector2<f64>) -> Self {
        let center = (a + b) * 0.5;
        Self {
            center,
            radius: (a - center).norm(),
        }
    }

    /// Circumcircle of three points, widest-pair circle when they are collinear
    fn from_triangle(a: Vector2<f64>, b: Vector2<f64>, c: Vector2<f64>) -> Self {
        let m = Matrix2::new(
            2.0 * (b.x - a.x), 2.0 * (b.y - a.y),
            2.0 * (c.x - a.x), 2.0 * (c.y - a.y),
        );
        let rhs = Vector2::new(
            b.norm_squared() - a.norm_squared(),
            c.norm_squared() - a.norm_squared(),
        );

        if m.determinant().abs() > 1e-9 {
            if let Some(center) = m.lu().solve(&rhs) {
                return Self {
                    center,
                    radius: (a - center).norm(),
                };
            }
        }

        [(a, b), (a, c), (b, c)]
            .into_iter()
            .map(|(p, q)| Self::from_diameter(p, q))
            .fold(Self::from_point(a), |best, c| if c.radius > best.radius { c } else { best })
    }

    fn contains(&self, p: &Vector2<f64>) -> bool {
        (p - self.center).norm() <= self.radius * (1.0 + 1e-9) + 1e-7
    }

    pub fn area(&self) -> f64 {
        std::f64::consts::PI * self.radius * self.radius
    }
}

/// Minimum enclosing circle, incremental Welzl construction
pub fn min_enclosing_circle(points: &[Point]) -> Option<Circle> {
    let pts: Vec<Vector2<f64>> = points.iter().map(|p| p.to_vector()).collect();
    let first = *pts.first()?;

    let mut circle = Circle::from_point(first);
    for i in 1..pts.len() {
        if circle.contains(&pts[i]) {
            continue;
        }
        circle = Circle::from_point(pts[i]);
        for j in 0..i {
            if circle.contains(&pts[j]) {
                continue;
            }
            circle = Circle::from_diameter(pts[i], pts[j]);
            for k in 0..j {
                if !circle.contains(&pts[k]) {
                    circle = Circle::from_triangle(pts[i], pts[j], pts[k]);
                }
            }
        }
    }

    Some(circle)
}

fn dist_sq(a: Point, b: Point) -> f64 {
    let dx = (a.x - b.x) as f64;
    let dy = (a.y - b.y) as f64;
    dx * dx + dy * dy
}

/// Closed polyline length
pub fn arc_length(points: &[Point]) -> f64 {
    let n = points.len();
    if n < 2 {
        return 0.0;
    }
    (0..n)
        .map(|i| dist_sq(points[i], points[(i + 1) % n]).sqrt())
        .sum()
}

/// Shoelace area of a closed polygon
pub fn polygon_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let n = points.len();
    let mut area = 0.0f64;
    for i in 0..n {
        let j = (i + 1) % n;
        area += points[i].x as f64 * points[j].y as f64 - points[j].x as f64 * points[i].y as f64;
    }
    (area * 0.5).abs()
}

/// Perpendicular distance of `p` from the line through `a` and `b`
fn line_distance(p: Point, a: Point, b: Point) -> f64 {
    let dx = (b.x - a.x) as f64;
    let dy = (b.y - a.y) as f64;
    let len = (dx * dx + dy * dy).sqrt();
    if len == 0.0 {
        return dist_sq(p, a).sqrt();
    }
    (((p.y - a.y) as f64) * dx - ((p.x - a.x) as f64) * dy).abs() / len
}

/// Douglas-Peucker on the open run `points[start..=end]` (indices wrap), appending kept
/// interior indices in order
fn simplify_run(points: &[Point], start: usize, end: usize, epsilon: f64, keep: &mut Vec<usize>) {
    let n = points.len();
    let span = (end + n - start) % n;
    if span < 2 {
        return;
    }

    let a = points[start];
    let b = points[end];
    let mut max_dist = -1.0f64;
    let mut split = start;
    for offset in 1..span {
        let idx = (start + offset) % n;
        let d = line_distance(points[idx], a, b);
        if d > max_dist {
            max_dist = d;
            split = idx;
        }
    }

    if max_dist > epsilon {
        simplify_run(points, start, split, epsilon, keep);
        keep.push(split);
        simplify_run(points, split, end, epsilon, keep);
    }
}

/// Approximate a closed curve by a polygon whose edges deviate at most `epsilon` from it
pub fn approx_poly_closed(points: &[Point], epsilon: f64) -> Vec<Point> {
    let n = points.len();
    if n <= 2 {
        return points.to_vec();
    }

    // Anchor on an approximate diameter: three rounds of farthest-point search
    let mut anchor = 0usize;
    let mut farthest = 0usize;
    let mut max_dist = 0.0;
    for _ in 0..3 {
        anchor = farthest;
        max_dist = 0.0;
        for j in 0..n {
            let d = dist_sq(points[anchor], points[j]);
            if d > max_dist {
                max_dist = d;
                farthest = j;
            }
        }
    }
    if max_dist.sqrt() <= epsilon {
        return vec![points[anchor]];
    }

    let mut keep = vec![anchor];
    simplify_run(points, anchor, farthest, epsilon, &mut keep);
    keep.push(farthest);
    simplify_run(points, farthest, anchor, epsilon, &mut keep);

    let mut poly: Vec<Point> = keep.into_iter().map(|i| points[i]).collect();

    // Drop vertices that sit almost on the chord between their neighbours
    let limit = epsilon / std::f64::consts::SQRT_2;
    let mut i = 0;
    while poly.len() > 3 && i < poly.len() {
        let m = poly.len();
        let prev = poly[(i + m - 1) % m];
        let curr = poly[i];
        let next = poly[(i + 1) % m];
        let inner = ((curr.x - prev.x) as f64) * ((next.x - curr.x) as f64)
            + ((curr.y - prev.y) as f64) * ((next.y - curr.y) as f64);
        if next.x != prev.x && next.y != prev.y && inner >= 0.0 && line_distance(curr, prev, next) <= limit {
            poly.remove(i);
        } else {
            i += 1;
        }
    }

    poly
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn pts(raw: &[(i32, i32)]) -> Vec<Point> {
        raw.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    /// Every integer point on the closed outline through `corners`
    fn dense_outline(corners: &[(i32, i32)]) -> Vec<Point> {
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
        out
    }

    #[test]
    fn test_bounding_rect_is_inclusive() {
        let r = Rect::bounding(&pts(&[(10, 10), (89, 10), (89, 89), (10, 89)])).unwrap();
        assert_eq!(r, Rect::new(10, 10, 80, 80));
        assert_eq!(r.aspect_ratio(), Some(1.0));
        assert!(Rect::bounding(&[]).is_none());
    }

    #[test]
    fn test_zero_height_has_no_aspect_ratio() {
        assert_eq!(Rect::new(0, 0, 10, 0).aspect_ratio(), None);
    }

    #[test]
    fn test_bounding_of_flat_run_is_one_row_high() {
        let r = Rect::bounding(&pts(&[(0, 5), (9, 5), (4, 5)])).unwrap();
        assert_eq!(r, Rect::new(0, 5, 10, 1));
        assert_eq!(r.aspect_ratio(), Some(10.0));
    }

    #[test]
    fn test_area_and_length_of_square() {
        let square = pts(&[(0, 0), (10, 0), (10, 10), (0, 10)]);
        assert_abs_diff_eq!(polygon_area(&square), 100.0);
        assert_abs_diff_eq!(arc_length(&square), 40.0);
        assert_abs_diff_eq!(polygon_area(&square[..2]), 0.0);
    }

    #[test]
    fn test_enclosing_circle_of_square() {
        let c = min_enclosing_circle(&pts(&[(0, 0), (10, 0), (10, 10), (0, 10), (5, 5)])).unwrap();
        assert_abs_diff_eq!(c.center.x, 5.0, epsilon = 1e-9);
        assert_abs_diff_eq!(c.center.y, 5.0, epsilon = 1e-9);
        assert_abs_diff_eq!(c.radius, 50f64.sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn test_enclosing_circle_covers_all_points() {
        let points = dense_outline(&[(3, 7), (40, 2), (55, 30), (20, 44), (0, 25)]);
        let c = min_enclosing_circle(&points).unwrap();
        for p in &points {
            assert!(c.contains(&p.to_vector()));
        }
        assert!(c.radius < 35.0);
    }

    #[test]
    fn test_enclosing_circle_degenerate_inputs() {
        assert!(min_enclosing_circle(&[]).is_none());
        let single = min_enclosing_circle(&pts(&[(4, 4)])).unwrap();
        assert_eq!(single.radius, 0.0);
        let line = min_enclosing_circle(&pts(&[(0, 0), (5, 0), (10, 0)])).unwrap();
        assert_abs_diff_eq!(line.radius, 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_approx_recovers_square_corners() {
        let outline = dense_outline(&[(0, 0), (0, 49), (49, 49), (49, 0)]);
        let eps = 0.04 * arc_length(&outline);
        let poly = approx_poly_closed(&outline, eps);
        assert_eq!(poly.len(), 4);
        for corner in pts(&[(0, 0), (0, 49), (49, 49), (49, 0)]) {
            assert!(poly.contains(&corner));
        }
    }

    #[test]
    fn test_approx_recovers_triangle() {
        let outline = dense_outline(&[(0, 40), (23, 0), (46, 40)]);
        let eps = 0.04 * arc_length(&outline);
        assert_eq!(approx_poly_closed(&outline, eps).len(), 3);
    }

    #[test]
    fn test_approx_circle_keeps_many_vertices() {
        let circle: Vec<Point> = (0..360)
            .map(|d| {
                let t = (d as f64).to_radians();
                Point::new((50.0 + 50.0 * t.cos()).round() as i32, (50.0 + 50.0 * t.sin()).round() as i32)
            })
            .collect();
        let eps = 0.04 * arc_length(&circle);
        let n = approx_poly_closed(&circle, eps).len();
        assert!(n > 4, "circle simplified to {} vertices", n);
    }
}
