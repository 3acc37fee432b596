//! # Pipeline configuration

use crate::prelude::v1::*;

/// Tunables of every pipeline stage.
///
/// The defaults reproduce the reference tuning: threshold of 4 pixels, 3 closing and 50 opening
/// iterations, and a 3 pixel wide red box.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(::serde::Serialize, ::serde::Deserialize),
    serde(default)
)]
pub struct PipelineConfig {
    /// Cells with `dx + dy` strictly above this value are moving.
    pub threshold: f32,
    pub close_iterations: usize,
    pub open_iterations: usize,
    pub box_color: Bgr,
    pub box_thickness: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let mask = MaskBuilder::default();
        let cleaner = MaskCleaner::default();
        let overlay = Overlay::default();

        Self {
            threshold: mask.threshold,
            close_iterations: cleaner.close_iterations,
            open_iterations: cleaner.open_iterations,
            box_color: overlay.color,
            box_thickness: overlay.thickness,
        }
    }
}

impl PipelineConfig {
    pub fn mask_builder(&self) -> MaskBuilder {
        MaskBuilder::new(self.threshold)
    }

    pub fn cleaner(&self) -> MaskCleaner {
        MaskCleaner::new(self.close_iterations, self.open_iterations)
    }

    pub fn overlay(&self) -> Overlay {
        Overlay {
            color: self.box_color,
            thickness: self.box_thickness,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = PipelineConfig::default();

        assert_eq!(config.threshold, 4.0);
        assert_eq!(config.close_iterations, 3);
        assert_eq!(config.open_iterations, 50);
        assert_eq!(config.box_color, Bgr::new(0, 0, 255));
        assert_eq!(config.box_thickness, 3);

        assert_eq!(config.cleaner(), MaskCleaner::default());
        assert_eq!(config.overlay(), Overlay::default());
        assert_eq!(config.mask_builder(), MaskBuilder::default());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn partial_json() {
        let json = r#"{ "threshold": 2.5, "box_color": { "b": 0, "g": 255, "r": 0 } }"#;
        let config: PipelineConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.threshold, 2.5);
        assert_eq!(config.box_color, Bgr::new(0, 255, 0));
        assert_eq!(config.open_iterations, 50);

        let json = serde_json::to_string(&config).unwrap();
        let back: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
