//! # Output sink

use crate::prelude::v1::*;

/// Consumer of annotated frames.
///
/// Display windows, stream publishers and file writers live outside the pipeline. They receive
/// each frame after the pipeline is done with it.
pub trait FrameSink {
    /// Publish a single processed frame.
    ///
    /// # Arguments
    ///
    /// * `frame` - annotated colour frame.
    /// * `bbox` - detected motion box, if any.
    fn publish(&mut self, frame: &ColorFrame, bbox: Option<&BoundingBox>) -> Result<()>;
}

impl<F: FnMut(&ColorFrame, Option<&BoundingBox>) -> Result<()>> FrameSink for F {
    fn publish(&mut self, frame: &ColorFrame, bbox: Option<&BoundingBox>) -> Result<()> {
        self(frame, bbox)
    }
}
