//! # Bounding box extraction
//!
//! The box is found with four scans over the mask, one per edge, each stopping at the first moving
//! cell it meets:
//!
//! * top - rows top to bottom, each row left to right.
//! * left - columns left to right, each column top to bottom.
//! * bottom - rows bottom to top, each row right to left.
//! * right - columns right to left, each column bottom to top.
//!
//! A scan visits whole rows (or columns) before moving to the next one, so its first hit always
//! lies on the outermost row (or column) that holds any motion. The four results are therefore
//! the minimum and maximum coordinates over every moving cell, even when the motion is split into
//! several disjoint regions. The scans are kept because they usually stop early.

use crate::prelude::v1::*;
use log::*;

/// Inclusive, axis-aligned rectangle in pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub struct BoundingBox {
    pub left: usize,
    pub top: usize,
    pub right: usize,
    pub bottom: usize,
}

impl BoundingBox {
    pub fn new(left: usize, top: usize, right: usize, bottom: usize) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Smallest box enclosing all given points.
    ///
    /// Returns `None` if there are no points.
    pub fn enclosing(points: impl IntoIterator<Item = (usize, usize)>) -> Option<Self> {
        points.into_iter().fold(None, |acc, (x, y)| {
            Some(match acc {
                None => Self::new(x, y, x, y),
                Some(b) => Self::new(
                    b.left.min(x),
                    b.top.min(y),
                    b.right.max(x),
                    b.bottom.max(y),
                ),
            })
        })
    }

    pub fn width(&self) -> usize {
        self.right - self.left + 1
    }

    pub fn height(&self) -> usize {
        self.bottom - self.top + 1
    }

    pub fn area(&self) -> usize {
        self.width() * self.height()
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        (self.left..=self.right).contains(&x) && (self.top..=self.bottom).contains(&y)
    }
}

/// Finds the box enclosing all moving cells of a mask.
#[derive(Clone, Copy, Debug, Default)]
pub struct BoxExtractor;

impl BoxExtractor {
    /// Extract the bounding box of all motion.
    ///
    /// Returns `None` when no cell is moving.
    pub fn extract(&self, mask: &MotionMask) -> Option<BoundingBox> {
        let bbox = BoundingBox {
            top: scan_top(mask)?,
            left: scan_left(mask)?,
            bottom: scan_bottom(mask)?,
            right: scan_right(mask)?,
        };

        debug!("motion at {:?}", bbox);

        Some(bbox)
    }
}

fn scan_top(mask: &MotionMask) -> Option<usize> {
    let (width, _) = mask.dim();
    mask.as_slice()
        .iter()
        .position(|&c| c == MotionMask::MOVING)
        .map(|i| i / width)
}

fn scan_bottom(mask: &MotionMask) -> Option<usize> {
    let (width, _) = mask.dim();
    mask.as_slice()
        .iter()
        .rposition(|&c| c == MotionMask::MOVING)
        .map(|i| i / width)
}

fn scan_left(mask: &MotionMask) -> Option<usize> {
    let (width, height) = mask.dim();
    (0..width).find(|&x| (0..height).any(|y| mask.is_moving(x, y)))
}

fn scan_right(mask: &MotionMask) -> Option<usize> {
    let (width, height) = mask.dim();
    (0..width)
        .rev()
        .find(|&x| (0..height).rev().any(|y| mask.is_moving(x, y)))
}
