//! # Optical Flow Motion Segmentation
//!
//! This library turns a dense optical flow field into a bounding box around moving objects. Every
//! frame goes through flow estimation, magnitude thresholding, morphological cleanup and bounding
//! box extraction. The flow itself is computed by a supplied [`FlowEstimator`](estimator::FlowEstimator).
//!
//! The easiest way to use the library is to import its prelude:
//!
//! ```
//! use flowseg::prelude::v1::*;
//! ```
//!
//! You may need [`nalgebra`](https://crates.io/crates/nalgebra) to work with flow vectors.

pub mod bbox;
pub mod config;
pub mod estimator;
pub mod frame;
pub mod mask;
pub mod morphology;
pub mod motion_field;
pub mod overlay;
pub mod pipeline;
pub mod properties;
pub mod sink;

pub mod prelude {
    pub mod v1 {
        pub use crate::{
            bbox::{BoundingBox, BoxExtractor},
            config::PipelineConfig,
            estimator::FlowEstimator,
            frame::{Bgr, ColorFrame, Frame, GrayFrame},
            mask::{MaskBuilder, MotionMask},
            morphology::MaskCleaner,
            motion_field::FlowField,
            overlay::Overlay,
            pipeline::{Detection, FrameState, MotionPipeline},
            properties::{Properties, Property, PropertyMut},
            sink::FrameSink,
        };
        pub use anyhow::{anyhow, bail, ensure, Error, Result};
    }
}
