//! # Block matching flow estimator
//!
//! The current frame is split into square blocks. Each block is searched for in the previous frame
//! within a fixed window, and the best match by sum of absolute differences gives the motion of
//! every pixel in the block.
//!
//! Matches with equal cost are resolved towards the smaller displacement. Textureless regions and
//! identical frames therefore come out with zero motion, instead of an arbitrary vector.

use flowseg::frame::ensure_same_dim;
use flowseg::prelude::v1::*;
use log::*;
use nalgebra as na;

/// Dense flow estimator based on exhaustive block matching.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockFlowEstimator {
    /// Width and height of matched blocks.
    block_size: usize,
    /// Largest displacement searched for, in pixels, along each axis.
    search_range: usize,
}

impl Default for BlockFlowEstimator {
    fn default() -> Self {
        Self {
            block_size: 8,
            search_range: 4,
        }
    }
}

impl Properties for BlockFlowEstimator {
    fn props_mut(&mut self) -> Vec<(&str, PropertyMut)> {
        vec![
            (
                "Block size",
                PropertyMut::usize(&mut self.block_size, 1, 64),
            ),
            (
                "Search range",
                PropertyMut::usize(&mut self.search_range, 0, 32),
            ),
        ]
    }
}

impl FlowEstimator for BlockFlowEstimator {
    fn estimate(&mut self, previous: &GrayFrame, current: &GrayFrame) -> Result<FlowField> {
        ensure_same_dim(previous, current)?;
        ensure!(self.block_size > 0, "block size must be positive");

        let (width, height) = current.dim();
        let mut field = FlowField::new(width, height);

        for by in (0..height).step_by(self.block_size) {
            for bx in (0..width).step_by(self.block_size) {
                let block = Block {
                    x: bx,
                    y: by,
                    w: std::cmp::min(self.block_size, width - bx),
                    h: std::cmp::min(self.block_size, height - by),
                };

                let (mx, my) = block.best_match(previous, current, self.search_range);
                let motion = na::Vector2::new(mx as f32, my as f32);

                for y in block.y..block.y + block.h {
                    for x in block.x..block.x + block.w {
                        field.set_motion(x, y, motion);
                    }
                }
            }
        }

        trace!(
            "block flow over {}x{}, max magnitude {}",
            width,
            height,
            field.max_magnitude()
        );

        Ok(field)
    }
}

impl BlockFlowEstimator {
    /// Create a new estimator.
    ///
    /// # Arguments
    ///
    /// * `block_size` - width and height of matched blocks.
    /// * `search_range` - largest displacement searched for along each axis.
    pub fn new(block_size: usize, search_range: usize) -> Self {
        Self {
            block_size: block_size.max(1),
            search_range,
        }
    }
}

/// Rectangle of the current frame matched as one unit.
struct Block {
    x: usize,
    y: usize,
    w: usize,
    h: usize,
}

impl Block {
    /// Find the displacement that moved the block from the previous frame.
    ///
    /// Candidates are ranked by SAD first and squared displacement second.
    fn best_match(&self, previous: &GrayFrame, current: &GrayFrame, range: usize) -> (isize, isize) {
        let (width, height) = previous.dim();
        let range = range as isize;

        let mut best = (u32::MAX, usize::MAX);
        let mut best_motion = (0, 0);

        for my in -range..=range {
            for mx in -range..=range {
                // Source of the block in the previous frame.
                let sx = self.x as isize - mx;
                let sy = self.y as isize - my;

                if sx < 0
                    || sy < 0
                    || sx as usize + self.w > width
                    || sy as usize + self.h > height
                {
                    continue;
                }

                let sad = self.sad(previous, current, sx as usize, sy as usize);
                let cost = (sad, (mx * mx + my * my) as usize);

                if cost < best {
                    best = cost;
                    best_motion = (mx, my);
                }
            }
        }

        best_motion
    }

    fn sad(&self, previous: &GrayFrame, current: &GrayFrame, sx: usize, sy: usize) -> u32 {
        (0..self.h)
            .map(|row| {
                let cur = &current.row(self.y + row)[self.x..self.x + self.w];
                let prev = &previous.row(sy + row)[sx..sx + self.w];
                cur.iter()
                    .zip(prev)
                    .map(|(&a, &b)| (a as i32 - b as i32).unsigned_abs())
                    .sum::<u32>()
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;

    /// Random texture, large enough to cut shifted windows out of.
    struct Texture {
        data: Vec<u8>,
        width: usize,
    }

    impl Texture {
        fn new(seed: u64, width: usize, height: usize) -> Self {
            let mut rng = StdRng::seed_from_u64(seed);
            Self {
                data: (0..width * height).map(|_| rng.gen()).collect(),
                width,
            }
        }

        fn at(&self, x: usize, y: usize) -> u8 {
            self.data[y * self.width + x]
        }

        fn window(&self, ox: usize, oy: usize, w: usize, h: usize) -> GrayFrame {
            Frame::from_fn(w, h, |x, y| self.at(x + ox, y + oy))
        }
    }

    fn gray_to_color(frame: &GrayFrame) -> ColorFrame {
        frame.map(|v| Bgr::new(v, v, v))
    }

    #[test]
    fn identical_frames_have_zero_flow() {
        let texture = Texture::new(1, 96, 64);
        let frame = texture.window(0, 0, 96, 64);

        let field = BlockFlowEstimator::default()
            .estimate(&frame, &frame)
            .unwrap();

        assert_eq!(field.dim(), (96, 64));
        assert_eq!(field.max_magnitude(), 0.0);

        // Flat frames have no texture to match, which must also give zero motion.
        let flat = GrayFrame::filled(40, 30, 128);
        let field = BlockFlowEstimator::default()
            .estimate(&flat, &flat)
            .unwrap();
        assert_eq!(field.max_magnitude(), 0.0);
    }

    #[test]
    fn recovers_global_shift() {
        let texture = Texture::new(2, 140, 100);
        // Content moves 3 pixels right and 2 down.
        let previous = texture.window(10, 10, 120, 80);
        let current = texture.window(7, 8, 120, 80);

        let field = BlockFlowEstimator::default()
            .estimate(&previous, &current)
            .unwrap();

        for (x, y, motion) in field.iter() {
            if x >= 8 && y >= 8 {
                assert_eq!(motion, na::Vector2::new(3.0, 2.0), "{x} {y}");
            }
        }
    }

    #[test]
    fn partial_blocks_are_covered() {
        let texture = Texture::new(3, 50, 40);
        let previous = texture.window(5, 5, 37, 29);
        let current = texture.window(4, 5, 37, 29);

        let field = BlockFlowEstimator::new(8, 2)
            .estimate(&previous, &current)
            .unwrap();

        assert_eq!(field.dim(), (37, 29));
        // The last, partial column of blocks still finds the shift.
        assert_eq!(field.get_motion(36, 28), na::Vector2::new(1.0, 0.0));
    }

    #[test]
    fn rejects_dimension_mismatch() {
        let a = GrayFrame::new(32, 32);
        let b = GrayFrame::new(32, 16);

        assert!(BlockFlowEstimator::default().estimate(&a, &b).is_err());
    }

    #[test]
    fn properties() {
        let mut estimator = BlockFlowEstimator::default();
        estimator.set_prop("Block size", "16").unwrap();
        estimator.set_prop("Search range", "100").unwrap();

        assert_eq!(estimator, BlockFlowEstimator::new(16, 32));
    }

    #[test]
    fn static_scene_has_no_motion() {
        let texture = Texture::new(4, 320, 240);
        let frame = gray_to_color(&texture.window(0, 0, 320, 240));

        let mut pipeline = MotionPipeline::new(BlockFlowEstimator::default());

        let first = pipeline.process(&frame).unwrap();
        assert_eq!(first.bbox, None);
        assert_eq!(pipeline.state().previous(), Some(&frame.to_gray()));

        let second = pipeline.process(&frame).unwrap();
        assert_eq!(second.bbox, None);
        assert_eq!(second.mask.map(|m| m.count_moving()), Some(0));
    }

    #[test]
    fn camera_pan_covers_frame() {
        let texture = Texture::new(5, 340, 260);
        let previous = texture.window(10, 10, 320, 240);
        let current = texture.window(7, 7, 320, 240);

        let mut pipeline = MotionPipeline::new(BlockFlowEstimator::default());

        assert_eq!(pipeline.process_gray(previous).unwrap(), None);
        let bbox = pipeline.process_gray(current).unwrap().unwrap();

        assert!(bbox.left <= 8 && bbox.top <= 8, "{bbox:?}");
        assert_eq!((bbox.right, bbox.bottom), (319, 239));
    }

    #[test]
    fn moving_object_is_boxed() {
        let background = Texture::new(6, 320, 240);
        let object = Texture::new(7, 160, 160);

        let render = |ox: usize, oy: usize| {
            Frame::from_fn(320, 240, |x, y| {
                if (ox..ox + 160).contains(&x) && (oy..oy + 160).contains(&y) {
                    object.at(x - ox, y - oy)
                } else {
                    background.at(x, y)
                }
            })
        };

        let mut pipeline = MotionPipeline::new(BlockFlowEstimator::default());

        // The object moves 4 pixels right and 4 down.
        pipeline.process(&gray_to_color(&render(80, 40))).unwrap();
        let detection = pipeline.process(&gray_to_color(&render(84, 44))).unwrap();

        let bbox = detection.bbox.unwrap();

        assert!((77..=88).contains(&bbox.left), "{bbox:?}");
        assert!((37..=48).contains(&bbox.top), "{bbox:?}");
        assert!((239..=250).contains(&bbox.right), "{bbox:?}");
        assert!((199..=210).contains(&bbox.bottom), "{bbox:?}");
        assert_eq!(detection.annotated.get(bbox.left, bbox.top), Bgr::RED);
    }
}
