//! # Geoshape - Pure Rust Shape and Color Detection
//!
//! Geoshape finds simple geometric shapes (triangles, squares, rectangles and
//! circles) in video frames and names the dominant color of each one.
//!
//! ## Features
//!
//! - **Pure Rust**: `image` + `imageproc`, no OpenCV dependency
//! - **Two binarization variants**: Canny edges or a fixed intensity threshold
//! - **Structured or drawn output**: labelled boxes, optionally rendered onto a copy of the frame
//! - **Stateless per frame**: the same frame always yields the same records
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use geoshape::{DetectorConfig, Frame, ShapeDetector};
//!
//! let detector = ShapeDetector::new(DetectorConfig::edge())?;
//! let frame = Frame::open("frame.png")?;
//!
//! for record in detector.detect(&frame) {
//!     println!("{} at {:?}", record.label, record.bbox);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Core modules
mod color;
mod contours;
mod detector;
mod error;
mod font;
mod geometry;
mod image_impl;
mod postprocess;
mod preprocess;
mod shape;
mod source;
mod types;

// FFI module for C bindings
#[cfg(feature = "ffi")]
pub mod ffi;

// Public API exports
pub use crate::color::{ColorBucket, Hsv};
pub use crate::detector::{detect_shapes, Detection, ShapeDetector};
pub use crate::error::{DetectError, Result};
pub use crate::geometry::{Point, Rect};
pub use crate::image_impl::Frame;
pub use crate::postprocess::ShapeRecord;
pub use crate::shape::ShapeKind;
pub use crate::source::{FrameReport, FrameSink, FrameSource};
pub use crate::types::{BinarizationMode, DetectorConfig, DrawConfig};
