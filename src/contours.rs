// Pure Rust outer-contour extraction
// Components are 8-connected, background is 4-connected. Only components that
// touch the border-connected background produce a contour.

use image::{GrayImage, Luma};
use imageproc::drawing::draw_line_segment_mut;

use crate::geometry::{arc_length, polygon_area, Point, Rect};
use crate::preprocess::{BinaryMap, FOREGROUND};

// 8-connectivity, counterclockwise on screen (y grows downwards)
const DIR: [(i32, i32); 8] = [
    (1, 0),   // 0: East
    (1, -1),  // 1: NE
    (0, -1),  // 2: North
    (-1, -1), // 3: NW
    (-1, 0),  // 4: West
    (-1, 1),  // 5: SW
    (0, 1),   // 6: South
    (1, 1),   // 7: SE
];

#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    /// Direction-change points of the outer border, in tracing order
    pub points: Vec<Point>,
}

impl Contour {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn area(&self) -> f64 {
        polygon_area(&self.points)
    }

    pub fn perimeter(&self) -> f64 {
        arc_length(&self.points)
    }

    pub fn bounding_rect(&self) -> Option<Rect> {
        Rect::bounding(&self.points)
    }

    /// Filled interior plus boundary, as a mask covering `bounding_rect()`
    pub fn fill_mask(&self) -> Option<(Rect, GrayImage)> {
        let rect = self.bounding_rect()?;
        let mut mask = GrayImage::new(rect.width as u32, rect.height as u32);
        let local: Vec<(f64, f64)> = self
            .points
            .iter()
            .map(|p| ((p.x - rect.x) as f64, (p.y - rect.y) as f64))
            .collect();
        let n = local.len();

        // Scanline fill using half-open edge spans
        let mut xs: Vec<f64> = Vec::new();
        for row in 0..rect.height {
            let y = row as f64;
            xs.clear();
            for i in 0..n {
                let (x0, y0) = local[i];
                let (x1, y1) = local[(i + 1) % n];
                if (y0 <= y && y < y1) || (y1 <= y && y < y0) {
                    xs.push(x0 + (y - y0) * (x1 - x0) / (y1 - y0));
                }
            }
            xs.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            for pair in xs.chunks_exact(2) {
                let start = pair[0].ceil().max(0.0) as u32;
                let end = (pair[1].floor() as i32).min(rect.width - 1);
                if end < 0 {
                    continue;
                }
                for x in start..=end as u32 {
                    mask.put_pixel(x, row as u32, Luma([FOREGROUND]));
                }
            }
        }

        // Boundary pixels belong to the shape too
        for i in 0..n {
            let (x0, y0) = local[i];
            let (x1, y1) = local[(i + 1) % n];
            draw_line_segment_mut(&mut mask, (x0 as f32, y0 as f32), (x1 as f32, y1 as f32), Luma([FOREGROUND]));
        }
        if n == 1 {
            mask.put_pixel(0, 0, Luma([FOREGROUND]));
        }

        Some((rect, mask))
    }
}

/// Drops contours below a fixed area floor
pub struct ContourExtractor {
    pub min_area: f64,
}

impl ContourExtractor {
    pub fn new(min_area: f64) -> Self {
        Self { min_area }
    }

    pub fn run(&self, map: &BinaryMap) -> Vec<Contour> {
        find_external_contours(map)
            .into_iter()
            .filter(|c| c.area() >= self.min_area)
            .collect()
    }
}

struct Grid<'a> {
    img: &'a BinaryMap,
    width: i32,
    height: i32,
}

impl<'a> Grid<'a> {
    fn new(img: &'a BinaryMap) -> Self {
        let (w, h) = img.dimensions();
        Self {
            img,
            width: w as i32,
            height: h as i32,
        }
    }

    fn idx(&self, x: i32, y: i32) -> usize {
        (y * self.width + x) as usize
    }

    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.height
    }

    fn is_fg(&self, x: i32, y: i32) -> bool {
        self.in_bounds(x, y) && self.img.get_pixel(x as u32, y as u32)[0] > 127
    }
}

/// Find the outer borders of every non-nested foreground component
pub fn find_external_contours(map: &BinaryMap) -> Vec<Contour> {
    let grid = Grid::new(map);
    let (width, height) = (grid.width, grid.height);
    let mut contours = Vec::new();
    if width == 0 || height == 0 {
        return contours;
    }

    let outer = mark_outer_background(&grid);
    let mut labels = vec![0u32; (width * height) as usize];
    let mut label = 0u32;

    for y in 0..height {
        for x in 0..width {
            if !grid.is_fg(x, y) || labels[grid.idx(x, y)] != 0 {
                continue;
            }
            label += 1;
            flood_fill_label(&grid, &mut labels, x, y, label);

            // First raster pixel of the component: its west neighbour lies in the
            // background region directly surrounding it
            let top_level = x == 0 || outer[grid.idx(x - 1, y)];
            if !top_level {
                continue;
            }

            let border = follow_border(&grid, Point::new(x, y));
            contours.push(Contour::new(compress_chain(&border)));
        }
    }

    contours
}

/// Background pixels 4-connected to the image frame
fn mark_outer_background(grid: &Grid) -> Vec<bool> {
    let (width, height) = (grid.width, grid.height);
    let mut outer = vec![false; (width * height) as usize];
    let mut stack = Vec::new();

    for x in 0..width {
        stack.push((x, 0));
        stack.push((x, height - 1));
    }
    for y in 0..height {
        stack.push((0, y));
        stack.push((width - 1, y));
    }

    while let Some((x, y)) = stack.pop() {
        if !grid.in_bounds(x, y) || grid.is_fg(x, y) {
            continue;
        }
        let idx = grid.idx(x, y);
        if outer[idx] {
            continue;
        }
        outer[idx] = true;

        stack.push((x + 1, y));
        stack.push((x - 1, y));
        stack.push((x, y + 1));
        stack.push((x, y - 1));
    }

    outer
}

/// Flood fill to label an 8-connected component
fn flood_fill_label(grid: &Grid, labels: &mut [u32], start_x: i32, start_y: i32, label: u32) {
    let mut stack = vec![(start_x, start_y)];

    while let Some((x, y)) = stack.pop() {
        if !grid.is_fg(x, y) {
            continue;
        }
        let idx = grid.idx(x, y);
        if labels[idx] != 0 {
            continue;
        }
        labels[idx] = label;

        for (dx, dy) in DIR.iter() {
            stack.push((x + dx, y + dy));
        }
    }
}

fn direction(from: Point, to: Point) -> usize {
    let d = (to.x - from.x, to.y - from.y);
    DIR.iter().position(|&v| v == d).unwrap_or(0)
}

fn step(p: Point, dir: usize) -> Point {
    let (dx, dy) = DIR[dir % 8];
    Point::new(p.x + dx, p.y + dy)
}

/// Suzuki-Abe border following from a pixel whose west neighbour is background
fn follow_border(grid: &Grid, start: Point) -> Vec<Point> {
    let mut border = vec![start];

    // Clockwise from the west neighbour for the last pixel of the border
    let first = (0..8)
        .map(|k| step(start, (4 + 8 - k) % 8))
        .find(|p| grid.is_fg(p.x, p.y));
    let Some(first) = first else {
        return border; // isolated pixel
    };

    let mut prev = first;
    let mut curr = start;
    let max_steps = (grid.width * grid.height) as usize * 4;

    loop {
        // Counterclockwise, starting just after the previous pixel
        let back = direction(curr, prev);
        let next = (1..=8)
            .map(|k| step(curr, back + k))
            .find(|p| grid.is_fg(p.x, p.y))
            .unwrap_or(prev);

        if next == start && curr == first {
            break;
        }
        border.push(next);
        prev = curr;
        curr = next;

        if border.len() > max_steps {
            break; // Safety: prevent infinite loops
        }
    }

    border
}

/// Keep only the points where the chain changes direction
fn compress_chain(points: &[Point]) -> Vec<Point> {
    let n = points.len();
    if n <= 2 {
        return points.to_vec();
    }

    let kept: Vec<Point> = (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let curr = points[i];
            let next = points[(i + 1) % n];
            direction(prev, curr) != direction(curr, next)
        })
        .map(|i| points[i])
        .collect();

    if kept.is_empty() {
        vec![points[0]]
    } else {
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_rect(img: &mut GrayImage, x0: u32, y0: u32, w: u32, h: u32) {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                img.put_pixel(x, y, Luma([255]));
            }
        }
    }

    #[test]
    fn test_find_contours_simple() {
        let mut img = GrayImage::new(10, 10);
        filled_rect(&mut img, 2, 2, 6, 6);

        let contours = find_external_contours(&img);
        assert_eq!(contours.len(), 1);
        let c = &contours[0];
        // Only the four corners survive compression
        assert_eq!(c.len(), 4);
        for corner in [(2, 2), (7, 2), (7, 7), (2, 7)] {
            assert!(c.points.contains(&Point::new(corner.0, corner.1)));
        }
        assert_eq!(c.area(), 25.0);
        assert_eq!(c.perimeter(), 20.0);
        assert_eq!(c.bounding_rect(), Some(Rect::new(2, 2, 6, 6)));
    }

    #[test]
    fn test_trace_two_by_two_block() {
        let mut img = GrayImage::new(4, 4);
        filled_rect(&mut img, 0, 0, 2, 2);
        let grid = Grid::new(&img);
        let border = follow_border(&grid, Point::new(0, 0));
        assert_eq!(
            border,
            vec![Point::new(0, 0), Point::new(0, 1), Point::new(1, 1), Point::new(1, 0)]
        );
    }

    #[test]
    fn test_isolated_pixel() {
        let mut img = GrayImage::new(5, 5);
        img.put_pixel(2, 2, Luma([255]));
        let contours = find_external_contours(&img);
        assert_eq!(contours, vec![Contour::new(vec![Point::new(2, 2)])]);
        assert_eq!(contours[0].area(), 0.0);
    }

    #[test]
    fn test_ring_yields_only_outer_border() {
        // A hollow square with a blob inside its hole
        let mut img = GrayImage::new(30, 30);
        filled_rect(&mut img, 2, 2, 26, 26);
        for y in 5..25 {
            for x in 5..25 {
                img.put_pixel(x, y, Luma([0]));
            }
        }
        filled_rect(&mut img, 10, 10, 5, 5);

        let contours = find_external_contours(&img);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].bounding_rect(), Some(Rect::new(2, 2, 26, 26)));
        assert_eq!(contours[0].area(), 625.0);
    }

    #[test]
    fn test_thin_open_curve_is_traced_both_ways() {
        let mut img = GrayImage::new(20, 5);
        for x in 2..18 {
            img.put_pixel(x, 2, Luma([255]));
        }
        let contours = find_external_contours(&img);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].points, vec![Point::new(2, 2), Point::new(17, 2)]);
        assert_eq!(contours[0].area(), 0.0);
    }

    #[test]
    fn test_component_touching_frame() {
        let mut img = GrayImage::new(8, 8);
        filled_rect(&mut img, 0, 0, 8, 8);
        let contours = find_external_contours(&img);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].area(), 49.0);
    }

    #[test]
    fn test_extractor_area_floor() {
        let mut img = GrayImage::new(100, 60);
        // 23x23 -> area 484, dropped
        filled_rect(&mut img, 5, 5, 23, 23);
        // 24x24 -> area 529, kept
        filled_rect(&mut img, 50, 5, 24, 24);
        let contours = ContourExtractor::new(500.0).run(&img);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].bounding_rect(), Some(Rect::new(50, 5, 24, 24)));
        assert!(contours.iter().all(|c| c.area() >= 500.0));
    }

    #[test]
    fn test_fill_mask_covers_interior_and_boundary() {
        let mut img = GrayImage::new(20, 20);
        filled_rect(&mut img, 3, 4, 10, 8);
        let contour = &find_external_contours(&img)[0];
        let (rect, mask) = contour.fill_mask().unwrap();
        assert_eq!(rect, Rect::new(3, 4, 10, 8));
        assert!(mask.pixels().all(|p| p[0] == FOREGROUND));
    }

    #[test]
    fn test_fill_mask_of_triangle_leaves_corner_empty() {
        let contour = Contour::new(vec![Point::new(0, 0), Point::new(0, 20), Point::new(20, 20)]);
        let (_, mask) = contour.fill_mask().unwrap();
        assert_eq!(mask.get_pixel(0, 10)[0], FOREGROUND);
        assert_eq!(mask.get_pixel(5, 15)[0], FOREGROUND);
        assert_eq!(mask.get_pixel(18, 2)[0], 0);
    }
}
