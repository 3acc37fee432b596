//! Writes annotated frames and detected boxes to disk.

use crate::frames::color_image;
use flowseg::prelude::v1::*;
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct BoxRecord {
    frame: usize,
    left: Option<usize>,
    top: Option<usize>,
    right: Option<usize>,
    bottom: Option<usize>,
}

/// Saves each published frame as a numbered PNG and logs its box to `boxes.csv`.
///
/// Frames are numbered consecutively from 0, unless the driver positions the sink on a specific
/// index with [`FileSink::seek`].
pub struct FileSink {
    dir: PathBuf,
    frame: usize,
    boxes: csv::Writer<File>,
}

impl FileSink {
    pub fn create(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;

        Ok(Self {
            dir: dir.to_path_buf(),
            frame: 0,
            boxes: csv::Writer::from_path(dir.join("boxes.csv"))?,
        })
    }

    /// Number the next published frame `frame`.
    pub fn seek(&mut self, frame: usize) {
        self.frame = frame;
    }

    pub fn frame_path(&self, prefix: &str, frame: usize) -> PathBuf {
        self.dir.join(format!("{prefix}{frame:06}.png"))
    }

    pub fn finish(mut self) -> Result<()> {
        self.boxes.flush()?;
        Ok(())
    }
}

impl FrameSink for FileSink {
    fn publish(&mut self, frame: &ColorFrame, bbox: Option<&BoundingBox>) -> Result<()> {
        color_image(frame)?.save(self.frame_path("frame_", self.frame))?;

        self.boxes.serialize(BoxRecord {
            frame: self.frame,
            left: bbox.map(|b| b.left),
            top: bbox.map(|b| b.top),
            right: bbox.map(|b| b.right),
            bottom: bbox.map(|b| b.bottom),
        })?;

        self.frame += 1;

        Ok(())
    }
}
