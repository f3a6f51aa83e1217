//! Frame abstraction over the `image` crate

use std::io::Cursor;
use std::path::Path;

use image::{GrayImage, ImageBuffer, ImageReader, Luma, Rgb, RgbImage};

use crate::error::{DetectError, Result};

/// An owned 8-bit RGB frame, row-major
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    image: RgbImage,
}

impl Frame {
    pub fn new(image: RgbImage) -> Result<Self> {
        if image.width() == 0 || image.height() == 0 {
            return Err(DetectError::InvalidFrame(format!(
                "frame has zero size ({}x{})",
                image.width(),
                image.height()
            )));
        }
        Ok(Self { image })
    }

    pub fn from_rgb8(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(DetectError::InvalidFrame(format!(
                "expected {} bytes for {}x{} RGB, got {}",
                expected,
                width,
                height,
                data.len()
            )));
        }
        let img = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, data)
            .ok_or_else(|| DetectError::InvalidFrame("failed to wrap raw RGB data".to_string()))?;
        Self::new(img)
    }

    /// Decode an encoded image (PNG, JPEG, BMP) held in memory
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let img = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| DetectError::InvalidFrame(e.to_string()))?
            .decode()
            .map_err(|e| DetectError::InvalidFrame(e.to_string()))?;
        Self::new(img.to_rgb8())
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let img = image::open(path)?;
        Self::new(img.to_rgb8())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.image.save(path)?;
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 3] {
        self.image.get_pixel(x, y).0
    }

    pub fn as_rgb(&self) -> &RgbImage {
        &self.image
    }

    pub fn as_rgb_mut(&mut self) -> &mut RgbImage {
        &mut self.image
    }

    /// Luma with the BT.601 weights (0.299, 0.587, 0.114), rounded
    pub fn to_gray(&self) -> GrayImage {
        let (width, height) = self.image.dimensions();
        let mut gray = GrayImage::new(width, height);
        for (x, y, pixel) in self.image.enumerate_pixels() {
            let [r, g, b] = pixel.0;
            let luma = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
            gray.put_pixel(x, y, Luma([luma.round().min(255.0) as u8]));
        }
        gray
    }
}
