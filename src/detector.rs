use std::time::Instant;

use crate::color::ColorClassifier;
use crate::contours::ContourExtractor;
use crate::error::Result;
use crate::image_impl::Frame;
use crate::postprocess::{Annotator, ClassifiedShape, ShapeRecord};
use crate::preprocess::Preprocessor;
use crate::shape::ShapeClassifier;
use crate::types::DetectorConfig;

/// Output of one pipeline invocation
#[derive(Debug, Clone)]
pub struct Detection {
    /// Present only when drawing was requested
    pub annotated: Option<Frame>,
    pub records: Vec<ShapeRecord>,
    pub elapse: f64,
}

/// Per-frame shape pipeline. Holds configuration only, no frame state.
pub struct ShapeDetector {
    pub cfg: DetectorConfig,
    pub preprocess: Preprocessor,
    pub extractor: ContourExtractor,
    pub shapes: ShapeClassifier,
    pub colors: ColorClassifier,
    pub annotator: Annotator,
}

impl ShapeDetector {
    pub fn new(cfg: DetectorConfig) -> Result<Self> {
        cfg.validate()?;
        Ok(Self {
            preprocess: Preprocessor::new(&cfg),
            extractor: ContourExtractor::new(cfg.min_contour_area),
            shapes: ShapeClassifier::new(&cfg),
            colors: ColorClassifier::new(),
            annotator: Annotator::new(cfg.draw.clone()),
            cfg,
        })
    }

    /// Classification pass: binary map, contours, then shape and color per contour
    pub fn classify(&self, frame: &Frame) -> Vec<ClassifiedShape> {
        let map = self.preprocess.run(frame);
        let contours = self.extractor.run(&map);

        let total = contours.len();
        let classified: Vec<ClassifiedShape> = contours
            .iter()
            .filter_map(|contour| {
                let shape = self.shapes.classify(contour)?;
                let color = self.colors.classify(frame, contour);
                Some(ClassifiedShape { shape, color })
            })
            .collect();

        log::debug!(
            "{}x{} frame: {} contours above area floor, {} classified",
            frame.width(),
            frame.height(),
            total,
            classified.len()
        );
        classified
    }

    /// Structured mode
    pub fn detect(&self, frame: &Frame) -> Vec<ShapeRecord> {
        self.classify(frame).iter().map(ClassifiedShape::to_record).collect()
    }

    /// Drawing mode: records plus an annotated copy of the frame
    pub fn detect_and_annotate(&self, frame: &Frame) -> (Frame, Vec<ShapeRecord>) {
        let shapes = self.classify(frame);
        let annotated = self.annotator.draw(frame, &shapes);
        (annotated, shapes.iter().map(ClassifiedShape::to_record).collect())
    }

    pub fn run(&self, frame: &Frame, annotate: bool) -> Detection {
        let start = Instant::now();
        let (annotated, records) = if annotate {
            let (img, records) = self.detect_and_annotate(frame);
            (Some(img), records)
        } else {
            (None, self.detect(frame))
        };
        Detection {
            annotated,
            records,
            elapse: start.elapsed().as_secs_f64(),
        }
    }

    /// Decode an encoded image and run structured mode on it
    pub fn detect_bytes(&self, data: &[u8]) -> Result<Vec<ShapeRecord>> {
        let frame = Frame::from_bytes(data)?;
        Ok(self.detect(&frame))
    }
}

/// One-shot entry point: validate the configuration and process a single frame
pub fn detect_shapes(frame: &Frame, cfg: &DetectorConfig, annotate: bool) -> Result<Detection> {
    let detector = ShapeDetector::new(cfg.clone())?;
    Ok(detector.run(frame, annotate))
}
