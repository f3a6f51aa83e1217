//! Frame sources and sinks: a still image, or a directory of numbered frames
//! standing in for a decoded video stream

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DetectError, Result};
use crate::image_impl::Frame;
use crate::postprocess::ShapeRecord;

const FRAME_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Structured output for one frame of a sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    pub index: usize,
    pub name: String,
    pub records: Vec<ShapeRecord>,
}

fn is_frame_file(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Ordered sequence of frames. Decoding is lazy, one file per `next()`.
#[derive(Debug)]
pub struct FrameSource {
    paths: Vec<PathBuf>,
    cursor: usize,
}

impl FrameSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let paths = if path.is_dir() {
            let mut paths: Vec<PathBuf> = fs::read_dir(path)?
                .filter_map(std::result::Result::ok)
                .map(|entry| entry.path())
                .filter(|p| p.is_file() && is_frame_file(p))
                .collect();
            paths.sort();
            paths
        } else if path.is_file() {
            vec![path.to_path_buf()]
        } else {
            return Err(DetectError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no such file or directory: {}", path.display()),
            )));
        };

        log::debug!("frame source {}: {} frames", path.display(), paths.len());
        Ok(Self { paths, cursor: 0 })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl Iterator for FrameSource {
    /// (index, file name, decoded frame)
    type Item = (usize, String, Result<Frame>);

    fn next(&mut self) -> Option<Self::Item> {
        let path = self.paths.get(self.cursor)?;
        let index = self.cursor;
        self.cursor += 1;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Some((index, name, Frame::open(path)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.paths.len() - self.cursor;
        (left, Some(left))
    }
}

/// Writes annotated frames as `frame_000000.png`, `frame_000001.png`, ...
#[derive(Debug, Clone)]
pub struct FrameSink {
    dir: PathBuf,
}

impl FrameSink {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn path_for(&self, index: usize) -> PathBuf {
        self.dir.join(format!("frame_{:06}.png", index))
    }

    pub fn write(&self, index: usize, frame: &Frame) -> Result<PathBuf> {
        let path = self.path_for(index);
        frame.save(&path)?;
        Ok(path)
    }
}
