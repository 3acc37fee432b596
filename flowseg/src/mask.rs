//! # Binary motion mask

use crate::prelude::v1::*;
use log::*;

/// Binary mask marking which pixels move.
///
/// The mask is stored as an 8-bit image where moving pixels are black ([`MotionMask::MOVING`]) and
/// static pixels are white ([`MotionMask::STATIC`]), so it can be inspected as a regular grayscale
/// frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MotionMask {
    cells: Vec<u8>,
    width: usize,
    height: usize,
}

impl MotionMask {
    pub const MOVING: u8 = 0;
    pub const STATIC: u8 = 255;

    /// Create a mask with every cell static.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            cells: vec![Self::STATIC; width * height],
            width,
            height,
        }
    }

    /// Create a mask by evaluating `moving(x, y)` for every cell.
    pub fn from_fn(
        width: usize,
        height: usize,
        mut moving: impl FnMut(usize, usize) -> bool,
    ) -> Self {
        let mut mask = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                mask.set_moving(x, y, moving(x, y));
            }
        }
        mask
    }

    /// Get width and height of the mask.
    pub fn dim(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Check whether a cell is marked as moving.
    pub fn is_moving(&self, x: usize, y: usize) -> bool {
        self.cells[y * self.width + x] == Self::MOVING
    }

    /// Mark a cell as moving or static.
    pub fn set_moving(&mut self, x: usize, y: usize, moving: bool) {
        self.cells[y * self.width + x] = if moving { Self::MOVING } else { Self::STATIC };
    }

    /// Mark an inclusive rectangle of cells as moving.
    pub fn fill_rect(&mut self, left: usize, top: usize, right: usize, bottom: usize) {
        for y in top..=bottom {
            for x in left..=right {
                self.set_moving(x, y, true);
            }
        }
    }

    /// Number of moving cells.
    pub fn count_moving(&self) -> usize {
        self.cells.iter().filter(|&&c| c == Self::MOVING).count()
    }

    /// Raw cells in row-major order.
    pub fn as_slice(&self) -> &[u8] {
        &self.cells
    }

    /// Raw cells in row-major order, mutably.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.cells
    }

    /// Iterate moving cell coordinates in row-major order.
    pub fn moving_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let width = self.width;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, &c)| c == Self::MOVING)
            .map(move |(i, _)| (i % width, i / width))
    }

    /// Export the mask as a grayscale frame.
    pub fn to_frame(&self) -> GrayFrame {
        Frame::from_fn(self.width, self.height, |x, y| self.cells[y * self.width + x])
    }
}

/// Thresholds flow vectors into a [`MotionMask`].
///
/// The motion measure is the signed sum `dx + dy` of the flow vector. It is not a norm: motion up
/// or to the left lowers it, so only motion with a right/down component can cross the threshold.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MaskBuilder {
    /// A cell is moving when its motion measure is strictly above this value.
    pub threshold: f32,
}

impl Default for MaskBuilder {
    fn default() -> Self {
        Self { threshold: 4.0 }
    }
}

impl Properties for MaskBuilder {
    fn props_mut(&mut self) -> Vec<(&str, PropertyMut)> {
        vec![(
            "Threshold",
            PropertyMut::float(&mut self.threshold, -100.0, 100.0),
        )]
    }
}

impl MaskBuilder {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    /// Motion measure of a single flow vector.
    pub fn magnitude(motion: nalgebra::Vector2<f32>) -> f32 {
        motion.x + motion.y
    }

    /// Classify every cell of the flow field.
    pub fn build(&self, flow: &FlowField) -> MotionMask {
        let (width, height) = flow.dim();
        let mut mask = MotionMask::new(width, height);

        for ((_, _, motion), cell) in flow.iter().zip(mask.cells.iter_mut()) {
            if Self::magnitude(motion) > self.threshold {
                *cell = MotionMask::MOVING;
            }
        }

        trace!(
            "{}x{} mask with {} moving cells",
            width,
            height,
            mask.count_moving()
        );

        mask
    }
}
