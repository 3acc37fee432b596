//! # Motion segmentation pipeline
//!
//! Every frame goes through the same sequence: grayscale conversion, flow estimation against the
//! previous frame, thresholding, mask cleanup and box extraction. The previous frame is the only
//! state carried between calls, and it lives in the pipeline instance, so separate pipelines (one
//! per camera, for instance) never interfere.

use crate::frame::ensure_same_dim;
use crate::prelude::v1::*;
use log::*;

/// Holds the frame that the next one is compared against.
#[derive(Clone, Debug, Default)]
pub struct FrameState {
    previous: Option<GrayFrame>,
}

impl FrameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the stored frame, if any.
    pub fn previous(&self) -> Option<&GrayFrame> {
        self.previous.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.previous.is_none()
    }

    /// Store a new frame, returning the old one.
    pub fn replace(&mut self, frame: GrayFrame) -> Option<GrayFrame> {
        self.previous.replace(frame)
    }

    pub fn clear(&mut self) {
        self.previous = None;
    }
}

/// Output of a single pipeline step.
#[derive(Clone, Debug)]
pub struct Detection {
    /// Copy of the input frame, with the box drawn on it if there is one.
    pub annotated: ColorFrame,
    /// Box around all detected motion.
    pub bbox: Option<BoundingBox>,
    /// Cleaned motion mask. `None` on the first frame, when there was nothing to compare against.
    pub mask: Option<MotionMask>,
}

/// Sequential motion detector.
///
/// Frames must be supplied in order, and all of them must have the same dimensions.
pub struct MotionPipeline<E> {
    estimator: E,
    state: FrameState,
    mask_builder: MaskBuilder,
    cleaner: MaskCleaner,
    extractor: BoxExtractor,
    overlay: Overlay,
}

impl<E: FlowEstimator> MotionPipeline<E> {
    /// Create a pipeline with default tuning.
    pub fn new(estimator: E) -> Self {
        Self::with_config(estimator, PipelineConfig::default())
    }

    /// Create a pipeline.
    ///
    /// # Arguments
    ///
    /// * `estimator` - flow estimator to use.
    /// * `config` - stage tunables.
    pub fn with_config(estimator: E, config: PipelineConfig) -> Self {
        Self {
            estimator,
            state: FrameState::new(),
            mask_builder: config.mask_builder(),
            cleaner: config.cleaner(),
            extractor: BoxExtractor,
            overlay: config.overlay(),
        }
    }

    pub fn state(&self) -> &FrameState {
        &self.state
    }

    pub fn estimator(&self) -> &E {
        &self.estimator
    }

    pub fn estimator_mut(&mut self) -> &mut E {
        &mut self.estimator
    }

    /// Forget the previous frame.
    ///
    /// The next frame only seeds the state again.
    pub fn reset(&mut self) {
        self.state.clear();
    }

    /// Compute the cleaned motion mask between two frames.
    ///
    /// This does not touch the frame state.
    pub fn segment(&mut self, previous: &GrayFrame, current: &GrayFrame) -> Result<MotionMask> {
        ensure_same_dim(previous, current)?;

        let flow = self.estimator.estimate(previous, current)?;

        ensure!(
            flow.dim() == current.dim(),
            "estimator produced a {:?} field for {:?} frames",
            flow.dim(),
            current.dim()
        );

        trace!("flow max magnitude {}", flow.max_magnitude());

        let mut mask = self.mask_builder.build(&flow);
        self.cleaner.clean(&mut mask);

        Ok(mask)
    }

    /// Compare against the stored frame, then store the new one.
    ///
    /// Frames that do not match the stored frame's dimensions are rejected, and the state is left
    /// untouched.
    fn step(&mut self, gray: GrayFrame) -> Result<Option<MotionMask>> {
        let mask = match self.state.previous.take() {
            Some(previous) => match self.segment(&previous, &gray) {
                Ok(mask) => Some(mask),
                Err(e) => {
                    warn!("rejecting frame: {e}");
                    self.state.replace(previous);
                    return Err(e);
                }
            },
            None => {
                debug!("no previous frame, seeding state");
                None
            }
        };

        self.state.replace(gray);

        Ok(mask)
    }

    /// Process an intensity frame.
    ///
    /// Returns the box around all motion since the previous frame. The first frame never has one.
    pub fn process_gray(&mut self, gray: GrayFrame) -> Result<Option<BoundingBox>> {
        let mask = self.step(gray)?;
        Ok(mask.and_then(|m| self.extractor.extract(&m)))
    }

    /// Process a colour frame.
    pub fn process(&mut self, frame: &ColorFrame) -> Result<Detection> {
        let mask = self.step(frame.to_gray())?;
        let bbox = mask.as_ref().and_then(|m| self.extractor.extract(m));
        let annotated = self.overlay.annotate(frame, bbox.as_ref());

        Ok(Detection {
            annotated,
            bbox,
            mask,
        })
    }

    /// Process a colour frame and hand the result to a sink.
    pub fn process_into(
        &mut self,
        frame: &ColorFrame,
        sink: &mut impl FrameSink,
    ) -> Result<Detection> {
        let detection = self.process(frame)?;
        sink.publish(&detection.annotated, detection.bbox.as_ref())?;
        Ok(detection)
    }
}

impl<E: FlowEstimator> Properties for MotionPipeline<E> {
    fn props_mut(&mut self) -> Vec<(&str, PropertyMut)> {
        let mut props = self.mask_builder.props_mut();
        props.extend(self.cleaner.props_mut());
        props.extend(self.overlay.props_mut());
        props.extend(self.estimator.props_mut());
        props
    }
}
