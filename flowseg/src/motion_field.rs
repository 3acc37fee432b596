//! # Dense flow field

use nalgebra::*;

/// Per-pixel optical flow field.
///
/// Each cell holds the displacement of a pixel from the previous frame to the current one, in
/// pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct FlowField {
    vf: Matrix2xX<f32>,
    width: usize,
    height: usize,
}

impl FlowField {
    /// Create a new zero flow field.
    ///
    /// # Arguments
    ///
    /// * `width` - width of the field.
    /// * `height` - height of the field.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            vf: Matrix2xX::repeat(width * height, 0f32),
            width,
            height,
        }
    }

    /// Create a flow field by evaluating `f(x, y)` for every cell.
    pub fn from_fn(
        width: usize,
        height: usize,
        mut f: impl FnMut(usize, usize) -> Vector2<f32>,
    ) -> Self {
        let mut field = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                field.set_motion(x, y, f(x, y));
            }
        }
        field
    }

    /// Get width and height of the flow field.
    pub fn dim(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Get size of the flow field.
    ///
    /// This is the same as `width * height`
    pub fn size(&self) -> usize {
        self.vf.ncols()
    }

    /// Get the flow field in row-major order.
    ///
    /// The elements returned are in the following order:
    ///
    /// `field[0,0].x, field[0,0].y, field[0,1].x, ... field[0,N].y, field[1,0].x, ... field[N,N].y`
    pub fn as_slice(&self) -> &[f32] {
        self.vf.as_slice()
    }

    /// Get the flow field in row-major order, mutably.
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        self.vf.as_mut_slice()
    }

    /// Set motion at given position.
    ///
    /// # Arguments
    ///
    /// * `x` - horizontal coordinate to set at.
    /// * `y` - vertical coordinate to set at.
    /// * `motion` - motion to set.
    pub fn set_motion(&mut self, x: usize, y: usize, motion: Vector2<f32>) {
        self.vf.set_column(self.width * y + x, &motion);
    }

    /// Get motion at coordinates.
    ///
    /// # Arguments
    ///
    /// * `x` - horizontal coordinate.
    /// * `y` - vertical coordinate.
    pub fn get_motion(&self, x: usize, y: usize) -> Vector2<f32> {
        self.vf.column(self.width * y + x).into()
    }

    /// Iterate every element of the flow field.
    ///
    /// The resulting iterator yields `(x, y, motion)` entries.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, Vector2<f32>)> + '_ {
        let (width, height) = self.dim();
        (0..height).flat_map(move |y| (0..width).map(move |x| (x, y, self.get_motion(x, y))))
    }

    /// Largest euclidean motion magnitude in the field.
    pub fn max_magnitude(&self) -> f32 {
        self.vf
            .column_iter()
            .map(|c| c.magnitude())
            .fold(0f32, f32::max)
    }
}
