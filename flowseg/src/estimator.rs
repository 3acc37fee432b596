//! # Dense optical flow estimator

use crate::prelude::v1::*;

/// Generic dense optical flow estimator.
///
/// Estimators expose their tuning through [`Properties`].
pub trait FlowEstimator: Properties {
    /// Estimate flow between two consecutive frames.
    ///
    /// The resulting field holds one displacement per pixel, going from `previous` to `current`.
    /// Implementations must reject frames of differing dimensions rather than produce a partial
    /// field.
    ///
    /// # Arguments
    ///
    /// * `previous` - earlier intensity frame.
    /// * `current` - later intensity frame.
    fn estimate(&mut self, previous: &GrayFrame, current: &GrayFrame) -> Result<FlowField>;
}

impl<T: FlowEstimator + ?Sized> FlowEstimator for Box<T> {
    fn estimate(&mut self, previous: &GrayFrame, current: &GrayFrame) -> Result<FlowField> {
        (**self).estimate(previous, current)
    }
}
