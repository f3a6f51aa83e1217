use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DetectError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinarizationMode {
    /// Canny edges with a low/high hysteresis pair
    Edge,
    /// Fixed global intensity threshold
    Threshold,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawConfig {
    pub outline_color: [u8; 3],
    pub text_color: [u8; 3],
    pub thickness: u32,
    pub text_scale: u32,
}

impl Default for DrawConfig {
    fn default() -> Self {
        Self {
            outline_color: [0, 255, 0],
            text_color: [0, 0, 0],
            thickness: 2,
            text_scale: 2,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub binarization: BinarizationMode,
    pub blur_kernel_size: u32,
    pub canny_low: f32,
    pub canny_high: f32,
    pub threshold_value: u8,
    pub min_contour_area: f64,
    pub polygon_tolerance_ratio: f64,
    /// Exclusive (low, high) bounds on width/height for a square
    pub square_aspect_band: (f64, f64),
    pub circularity_tolerance: f64,
    pub draw: DrawConfig,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self::edge()
    }
}

impl DetectorConfig {
    /// Canny variant: 5x5 blur, hysteresis 50/150
    pub fn edge() -> Self {
        Self {
            binarization: BinarizationMode::Edge,
            blur_kernel_size: 5,
            canny_low: 50.0,
            canny_high: 150.0,
            threshold_value: 60,
            min_contour_area: 500.0,
            polygon_tolerance_ratio: 0.04,
            square_aspect_band: (0.95, 1.05),
            circularity_tolerance: 0.20,
            draw: DrawConfig::default(),
        }
    }

    /// Fixed-threshold variant: 7x7 blur, intensity > 60 is foreground
    pub fn threshold() -> Self {
        Self {
            binarization: BinarizationMode::Threshold,
            blur_kernel_size: 7,
            ..Self::edge()
        }
    }

    /// Load a (possibly partial) JSON document over the defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        let k = self.blur_kernel_size;
        if k < 3 || k % 2 == 0 {
            return Err(DetectError::InvalidConfig(format!(
                "blur_kernel_size must be odd and >= 3, got {}",
                k
            )));
        }
        if self.canny_low > self.canny_high {
            return Err(DetectError::InvalidConfig(format!(
                "canny_low ({}) exceeds canny_high ({})",
                self.canny_low, self.canny_high
            )));
        }
        if !(self.polygon_tolerance_ratio > 0.0) {
            return Err(DetectError::InvalidConfig(
                "polygon_tolerance_ratio must be positive".to_string(),
            ));
        }
        let (lo, hi) = self.square_aspect_band;
        if !(lo < hi) {
            return Err(DetectError::InvalidConfig(format!(
                "square_aspect_band ({}, {}) is empty",
                lo, hi
            )));
        }
        if !(self.circularity_tolerance > 0.0) {
            return Err(DetectError::InvalidConfig(
                "circularity_tolerance must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
