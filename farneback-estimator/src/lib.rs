//! OpenCV Farneback dense optical flow.

use flowseg::frame::ensure_same_dim;
use flowseg::prelude::v1::*;
use log::*;
use nalgebra as na;
use opencv::core::{Point2f, Scalar, CV_8UC1};
use opencv::prelude::*;
use opencv::video;

/// Farneback polynomial expansion flow estimator.
///
/// The defaults are tuned for speed: a single pyramid level with a small window and one
/// iteration.
pub struct FarnebackEstimator {
    pyr_scale: f32,
    levels: usize,
    win_size: usize,
    iterations: usize,
    poly_n: usize,
    poly_sigma: f32,
    gaussian: bool,
    prev: Mat,
    next: Mat,
    flow: Mat,
}

impl Default for FarnebackEstimator {
    fn default() -> Self {
        Self {
            pyr_scale: 0.5,
            levels: 1,
            win_size: 4,
            iterations: 1,
            poly_n: 5,
            poly_sigma: 1.1,
            gaussian: false,
            prev: Default::default(),
            next: Default::default(),
            flow: Default::default(),
        }
    }
}

impl Properties for FarnebackEstimator {
    fn props_mut(&mut self) -> Vec<(&str, PropertyMut)> {
        vec![
            (
                "Pyramid scale",
                PropertyMut::float(&mut self.pyr_scale, 0.1, 0.9),
            ),
            ("Levels", PropertyMut::usize(&mut self.levels, 1, 10)),
            ("Window size", PropertyMut::usize(&mut self.win_size, 1, 64)),
            ("Iterations", PropertyMut::usize(&mut self.iterations, 1, 20)),
            ("Poly N", PropertyMut::usize(&mut self.poly_n, 5, 7)),
            (
                "Poly sigma",
                PropertyMut::float(&mut self.poly_sigma, 0.5, 2.0),
            ),
            ("Gaussian window", PropertyMut::bool(&mut self.gaussian)),
        ]
    }
}

impl FlowEstimator for FarnebackEstimator {
    fn estimate(&mut self, previous: &GrayFrame, current: &GrayFrame) -> Result<FlowField> {
        ensure_same_dim(previous, current)?;

        upload(previous, &mut self.prev)?;
        upload(current, &mut self.next)?;

        let flags = if self.gaussian {
            video::OPTFLOW_FARNEBACK_GAUSSIAN
        } else {
            0
        };

        video::calc_optical_flow_farneback(
            &self.prev,
            &self.next,
            &mut self.flow,
            self.pyr_scale as f64,
            self.levels as _,
            self.win_size as _,
            self.iterations as _,
            self.poly_n as _,
            self.poly_sigma as f64,
            flags,
        )?;

        let (width, height) = current.dim();
        let mut field = FlowField::new(width, height);

        for y in 0..height {
            for x in 0..width {
                let dir: &Point2f = self.flow.at_2d(y as _, x as _)?;
                field.set_motion(x, y, na::Vector2::new(dir.x, dir.y));
            }
        }

        trace!("farneback flow over {}x{}", width, height);

        Ok(field)
    }
}

/// Copy a grayscale frame into an 8-bit single channel matrix.
fn upload(frame: &GrayFrame, mat: &mut Mat) -> Result<()> {
    let (width, height) = frame.dim();

    if mat.rows() != height as i32 || mat.cols() != width as i32 || mat.typ() != CV_8UC1 {
        *mat = Mat::new_rows_cols_with_default(height as _, width as _, CV_8UC1, Scalar::all(0.0))?;
    }

    for (y, row) in frame.rows().enumerate() {
        for (x, &v) in row.iter().enumerate() {
            *mat.at_2d_mut::<u8>(y as _, x as _)? = v;
        }
    }

    Ok(())
}
