use image::{GrayImage, Luma};
use imageproc::gradients::{horizontal_sobel, vertical_sobel};

use crate::image_impl::Frame;
use crate::types::{BinarizationMode, DetectorConfig};

pub const FOREGROUND: u8 = 255;
pub const BACKGROUND: u8 = 0;

/// Same-size single-channel map, `FOREGROUND` or `BACKGROUND` per pixel
pub type BinaryMap = GrayImage;

pub struct Preprocessor {
    pub mode: BinarizationMode,
    pub kernel_size: u32,
    pub canny_low: f32,
    pub canny_high: f32,
    pub threshold_value: u8,
}

impl Preprocessor {
    pub fn new(cfg: &DetectorConfig) -> Self {
        Self {
            mode: cfg.binarization,
            kernel_size: cfg.blur_kernel_size,
            canny_low: cfg.canny_low,
            canny_high: cfg.canny_high,
            threshold_value: cfg.threshold_value,
        }
    }

    pub fn run(&self, frame: &Frame) -> BinaryMap {
        let gray = frame.to_gray();
        let blurred = gaussian_blur(&gray, self.kernel_size);
        match self.mode {
            BinarizationMode::Edge => canny(&blurred, self.canny_low, self.canny_high),
            BinarizationMode::Threshold => {
                imageproc::contrast::threshold(&blurred, self.threshold_value)
            }
        }
    }
}

/// Gaussian weights for an odd kernel size, sigma derived from the size
fn gaussian_kernel(ksize: u32) -> Vec<f32> {
    let sigma = 0.3 * ((ksize as f64 - 1.0) * 0.5 - 1.0) + 0.8;
    let half = (ksize / 2) as i32;
    let scale = -0.5 / (sigma * sigma);

    let mut weights: Vec<f64> = (-half..=half)
        .map(|i| (scale * (i * i) as f64).exp())
        .collect();
    let sum: f64 = weights.iter().sum();
    for w in weights.iter_mut() {
        *w /= sum;
    }
    weights.into_iter().map(|w| w as f32).collect()
}

/// Mirror an out-of-range index without repeating the edge pixel (gfedcb|abcdefgh|gfedcba)
fn reflect_101(i: i32, len: i32) -> usize {
    if len == 1 {
        return 0;
    }
    let mut i = i;
    while i < 0 || i >= len {
        if i < 0 {
            i = -i;
        }
        if i >= len {
            i = 2 * (len - 1) - i;
        }
    }
    i as usize
}

/// Separable Gaussian blur with an exact `ksize` x `ksize` kernel
pub fn gaussian_blur(img: &GrayImage, ksize: u32) -> GrayImage {
    let (width, height) = img.dimensions();
    let (w, h) = (width as i32, height as i32);
    let kernel = gaussian_kernel(ksize);
    let half = (ksize / 2) as i32;
    let src = img.as_raw();

    // Horizontal pass
    let mut tmp = vec![0f32; (width * height) as usize];
    for y in 0..h {
        let row = (y * w) as usize;
        for x in 0..w {
            let mut acc = 0f32;
            for (k, weight) in kernel.iter().enumerate() {
                let sx = reflect_101(x + k as i32 - half, w);
                acc += weight * src[row + sx] as f32;
            }
            tmp[row + x as usize] = acc;
        }
    }

    // Vertical pass
    let mut out = GrayImage::new(width, height);
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0f32;
            for (k, weight) in kernel.iter().enumerate() {
                let sy = reflect_101(y + k as i32 - half, h);
                acc += weight * tmp[sy * width as usize + x as usize];
            }
            out.put_pixel(x as u32, y as u32, Luma([acc.round().clamp(0.0, 255.0) as u8]));
        }
    }

    out
}

/// Canny edge detector on an already smoothed image
///
/// Uses the L1 gradient norm, four-sector non-maximum suppression and
/// hysteresis over 8-connected neighbours.
pub fn canny(img: &GrayImage, low: f32, high: f32) -> BinaryMap {
    let (width, height) = img.dimensions();
    let (w, h) = (width as i32, height as i32);
    let gx = horizontal_sobel(img);
    let gy = vertical_sobel(img);

    let mut mag = vec![0i32; (width * height) as usize];
    for y in 0..height {
        for x in 0..width {
            let dx = gx.get_pixel(x, y)[0] as i32;
            let dy = gy.get_pixel(x, y)[0] as i32;
            mag[(y * width + x) as usize] = dx.abs() + dy.abs();
        }
    }

    let mag_at = |x: i32, y: i32| -> i32 {
        if x < 0 || x >= w || y < 0 || y >= h {
            0
        } else {
            mag[(y * w + x) as usize]
        }
    };

    // tan(22.5) and tan(67.5)
    const TG22: f32 = 0.414_213_57;
    const TG67: f32 = 2.414_213_6;

    // 0 = suppressed, 1 = weak candidate, 2 = strong edge
    let mut state = vec![0u8; (width * height) as usize];
    let mut stack: Vec<(i32, i32)> = Vec::new();

    for y in 0..h {
        for x in 0..w {
            let m = mag_at(x, y);
            if (m as f32) <= low {
                continue;
            }
            let dx = gx.get_pixel(x as u32, y as u32)[0] as i32;
            let dy = gy.get_pixel(x as u32, y as u32)[0] as i32;
            let xs = dx.abs() as f32;
            let ys = dy.abs() as f32;

            let is_max = if ys < xs * TG22 {
                m > mag_at(x - 1, y) && m >= mag_at(x + 1, y)
            } else if ys > xs * TG67 {
                m > mag_at(x, y - 1) && m >= mag_at(x, y + 1)
            } else {
                let s = if (dx ^ dy) < 0 { -1 } else { 1 };
                m > mag_at(x - s, y - 1) && m > mag_at(x + s, y + 1)
            };
            if !is_max {
                continue;
            }

            let idx = (y * w + x) as usize;
            if (m as f32) > high {
                state[idx] = 2;
                stack.push((x, y));
            } else {
                state[idx] = 1;
            }
        }
    }

    // Hysteresis: promote weak pixels connected to strong ones
    while let Some((x, y)) = stack.pop() {
        for dy in -1..=1 {
            for dx in -1..=1 {
                let nx = x + dx;
                let ny = y + dy;
                if nx < 0 || nx >= w || ny < 0 || ny >= h {
                    continue;
                }
                let nidx = (ny * w + nx) as usize;
                if state[nidx] == 1 {
                    state[nidx] = 2;
                    stack.push((nx, ny));
                }
            }
        }
    }

    let mut edges = GrayImage::new(width, height);
    for (i, s) in state.iter().enumerate() {
        if *s == 2 {
            let x = i as u32 % width;
            let y = i as u32 / width;
            edges.put_pixel(x, y, Luma([FOREGROUND]));
        }
    }
    edges
}
