use std::fmt;

use serde::{Deserialize, Serialize};

use crate::contours::Contour;
use crate::image_impl::Frame;

/// 8-bit HSV: hue in half degrees (0..180), saturation and value in 0..=255
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

impl Hsv {
    pub fn new(h: u8, s: u8, v: u8) -> Self {
        Self { h, s, v }
    }

    pub fn from_rgb(rgb: [u8; 3]) -> Self {
        let [r, g, b] = rgb.map(|c| c as f64);
        let v = r.max(g).max(b);
        let min = r.min(g).min(b);
        let diff = v - min;

        let s = if v > 0.0 { 255.0 * diff / v } else { 0.0 };

        let mut h = if diff == 0.0 {
            0.0
        } else if v == r {
            60.0 * (g - b) / diff
        } else if v == g {
            120.0 + 60.0 * (b - r) / diff
        } else {
            240.0 + 60.0 * (r - g) / diff
        };
        if h < 0.0 {
            h += 360.0;
        }

        let h8 = (h / 2.0).round() as u32 % 180;
        Self {
            h: h8 as u8,
            s: s.round() as u8,
            v: v as u8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorBucket {
    White,
    Black,
    Gray,
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Violet,
    Unknown,
}

impl ColorBucket {
    pub fn label(&self) -> &'static str {
        match self {
            ColorBucket::White => "Blanco",
            ColorBucket::Black => "Negro",
            ColorBucket::Gray => "Gris",
            ColorBucket::Red => "Rojo",
            ColorBucket::Orange => "Naranja",
            ColorBucket::Yellow => "Amarillo",
            ColorBucket::Green => "Verde",
            ColorBucket::Blue => "Azul",
            ColorBucket::Violet => "Violeta",
            ColorBucket::Unknown => "Desconocido",
        }
    }
}

impl fmt::Display for ColorBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

type ColorRule = (fn(&Hsv) -> bool, ColorBucket);

// Evaluated in order, first match wins. Buckets overlap, so order matters.
const COLOR_RULES: [ColorRule; 9] = [
    (|c: &Hsv| c.s < 25 && c.v > 180, ColorBucket::White),
    (|c: &Hsv| c.v < 50, ColorBucket::Black),
    (|c: &Hsv| c.s < 100 && c.v < 100, ColorBucket::Gray),
    (|c: &Hsv| c.h < 10 || c.h > 170, ColorBucket::Red),
    (|c: &Hsv| c.h < 25, ColorBucket::Orange),
    (|c: &Hsv| c.h < 35, ColorBucket::Yellow),
    (|c: &Hsv| c.h < 85, ColorBucket::Green),
    (|c: &Hsv| c.h < 130, ColorBucket::Blue),
    (|c: &Hsv| c.h < 160, ColorBucket::Violet),
];

pub fn classify_hsv(hsv: &Hsv) -> ColorBucket {
    COLOR_RULES
        .iter()
        .find(|(matches, _)| matches(hsv))
        .map(|(_, bucket)| *bucket)
        .unwrap_or(ColorBucket::Unknown)
}

/// Rounded mean RGB over the contour's filled interior
pub fn mean_color(frame: &Frame, contour: &Contour) -> Option<[u8; 3]> {
    let (rect, mask) = contour.fill_mask()?;
    let mut sum = [0u64; 3];
    let mut count = 0u64;

    for (mx, my, m) in mask.enumerate_pixels() {
        if m[0] == 0 {
            continue;
        }
        let x = rect.x + mx as i32;
        let y = rect.y + my as i32;
        if x < 0 || y < 0 || x >= frame.width() as i32 || y >= frame.height() as i32 {
            continue;
        }
        let px = frame.get_pixel(x as u32, y as u32);
        for c in 0..3 {
            sum[c] += px[c] as u64;
        }
        count += 1;
    }

    if count == 0 {
        return None;
    }
    Some(sum.map(|s| (s as f64 / count as f64).round() as u8))
}

pub struct ColorClassifier;

impl ColorClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, frame: &Frame, contour: &Contour) -> ColorBucket {
        match mean_color(frame, contour) {
            Some(rgb) => classify_hsv(&Hsv::from_rgb(rgb)),
            None => ColorBucket::Unknown,
        }
    }
}

impl Default for ColorClassifier {
    fn default() -> Self {
        Self::new()
    }
}
