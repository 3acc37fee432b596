//! # Image frames

use crate::prelude::v1::*;
use bytemuck::{Pod, Zeroable};

/// BGR colour structure.
///
/// The layout matches the byte order produced by most capture backends, so raw frame buffers can
/// be cast directly with [`Frame::from_bytes`].
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub struct Bgr {
    pub b: u8,
    pub g: u8,
    pub r: u8,
}

impl Bgr {
    pub const RED: Self = Self::new(0, 0, 255);

    pub const fn new(b: u8, g: u8, r: u8) -> Self {
        Self { b, g, r }
    }

    /// Convert from a slice containing `[r, g, b]` elements.
    pub fn from_rgb_slice(rgb: &[u8]) -> Self {
        Self {
            r: rgb[0],
            g: rgb[1],
            b: rgb[2],
        }
    }

    /// Convert to an `[r, g, b]` array.
    pub fn to_rgb(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Compute BT.601 luma of the colour.
    ///
    /// Uses 14-bit fixed point weights, the rounding matches common BGR to grayscale converters.
    pub fn luma(self) -> u8 {
        let y = self.r as u32 * 4899 + self.g as u32 * 9617 + self.b as u32 * 1868 + (1 << 13);
        (y >> 14) as u8
    }
}

/// Row-major 2D image.
///
/// Rows are contiguous and `stride` elements apart. Any elements between `width` and `stride` are
/// padding and never observed.
#[derive(Clone, Debug)]
pub struct Frame<T> {
    data: Vec<T>,
    width: usize,
    height: usize,
    stride: usize,
}

/// Single channel intensity frame.
pub type GrayFrame = Frame<u8>;

/// Three channel colour frame.
pub type ColorFrame = Frame<Bgr>;

impl<T: Pod> Frame<T> {
    /// Create a new zeroed frame.
    ///
    /// # Arguments
    ///
    /// * `width` - width of the frame.
    /// * `height` - height of the frame.
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, T::zeroed())
    }

    /// Create a new frame with every pixel set to `value`.
    pub fn filled(width: usize, height: usize, value: T) -> Self {
        Self {
            data: vec![value; width * height],
            width,
            height,
            stride: width,
        }
    }

    /// Create a frame by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let data = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| f(x, y))
            .collect();

        Self {
            data,
            width,
            height,
            stride: width,
        }
    }

    /// Wrap a tightly packed pixel buffer.
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Result<Self> {
        Self::from_strided(width, height, width, data)
    }

    /// Wrap a pixel buffer with rows `stride` elements apart.
    ///
    /// # Arguments
    ///
    /// * `width` - width of the frame.
    /// * `height` - height of the frame.
    /// * `stride` - distance between row starts, in pixels.
    /// * `data` - pixel buffer.
    pub fn from_strided(width: usize, height: usize, stride: usize, data: Vec<T>) -> Result<Self> {
        ensure!(
            stride >= width,
            "stride {stride} is smaller than width {width}"
        );

        let required = match height {
            0 => 0,
            h => stride * (h - 1) + width,
        };

        ensure!(
            data.len() >= required,
            "frame buffer holds {} pixels, {width}x{height} with stride {stride} needs {required}",
            data.len()
        );

        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// Copy a frame out of a raw byte buffer.
    ///
    /// # Arguments
    ///
    /// * `width` - width of the frame.
    /// * `height` - height of the frame.
    /// * `stride_bytes` - distance between row starts, in bytes.
    /// * `bytes` - raw pixel bytes.
    pub fn from_bytes(
        width: usize,
        height: usize,
        stride_bytes: usize,
        bytes: &[u8],
    ) -> Result<Self> {
        let px = std::mem::size_of::<T>();

        ensure!(
            stride_bytes % px == 0,
            "stride of {stride_bytes} bytes is not a multiple of the {px} byte pixel"
        );

        let data = bytemuck::try_cast_slice::<u8, T>(&bytes[..bytes.len() - bytes.len() % px])
            .map_err(|e| anyhow!("unable to cast frame bytes: {e:?}"))?;

        Self::from_strided(width, height, stride_bytes / px, data.to_vec())
    }

    /// Get width and height of the frame.
    pub fn dim(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Distance between row starts, in pixels.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Get a row of pixels without padding.
    pub fn row(&self, y: usize) -> &[T] {
        let start = y * self.stride;
        &self.data[start..start + self.width]
    }

    /// Get a mutable row of pixels without padding.
    pub fn row_mut(&mut self, y: usize) -> &mut [T] {
        let start = y * self.stride;
        &mut self.data[start..start + self.width]
    }

    /// Iterate over all rows, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[T]> + '_ {
        (0..self.height).map(move |y| self.row(y))
    }

    /// Get pixel at coordinates.
    pub fn get(&self, x: usize, y: usize) -> T {
        self.data[y * self.stride + x]
    }

    /// Set pixel at coordinates.
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        self.data[y * self.stride + x] = value;
    }

    /// Iterate every pixel of the frame.
    ///
    /// The resulting iterator yields `(x, y, pixel)` entries in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = (usize, usize, T)> + '_ {
        self.rows()
            .enumerate()
            .flat_map(|(y, row)| row.iter().enumerate().map(move |(x, &p)| (x, y, p)))
    }

    /// Produce a tightly packed frame by mapping every pixel.
    pub fn map<U: Pod>(&self, mut f: impl FnMut(T) -> U) -> Frame<U> {
        Frame {
            data: self.rows().flat_map(|r| r.iter()).map(|&p| f(p)).collect(),
            width: self.width,
            height: self.height,
            stride: self.width,
        }
    }

    /// Get the underlying buffer as raw bytes, including row padding.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }
}

impl<T: Pod + PartialEq> PartialEq for Frame<T> {
    fn eq(&self, other: &Self) -> bool {
        self.dim() == other.dim() && self.rows().zip(other.rows()).all(|(a, b)| a == b)
    }
}

impl<T: Pod + Eq> Eq for Frame<T> {}

impl ColorFrame {
    /// Convert the colour frame to a single channel intensity frame.
    pub fn to_gray(&self) -> GrayFrame {
        self.map(Bgr::luma)
    }
}

/// Verify that two frames cover the same pixel grid.
pub fn ensure_same_dim<A: Pod, B: Pod>(a: &Frame<A>, b: &Frame<B>) -> Result<()> {
    let (aw, ah) = a.dim();
    let (bw, bh) = b.dim();
    ensure!(
        (aw, ah) == (bw, bh),
        "frame dimension mismatch: {aw}x{ah} vs {bw}x{bh}"
    );
    Ok(())
}
