//! # Morphological mask cleanup
//!
//! All operations act on the set of moving cells. Dilation grows moving regions, erosion shrinks
//! them. The structuring element is the 3x3 square, and applying it `n` times is computed in one
//! go as a `(2n + 1)` square. The square is separable, so every pass is a horizontal sweep
//! followed by a vertical one, each linear in the number of cells.
//!
//! Cells outside the mask never influence the result. An eroded cell at the border only looks at
//! the in-bounds part of its neighbourhood, and so does a dilated one.

use crate::prelude::v1::*;
use log::*;

/// Two-stage mask cleanup.
///
/// First a closing fills small gaps between nearby motion fragments. Then an opening removes every
/// region that does not contain a full `(2 * open_iterations + 1)` square. With the default 50
/// iterations, only large, solid regions of motion survive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MaskCleaner {
    pub close_iterations: usize,
    pub open_iterations: usize,
}

impl Default for MaskCleaner {
    fn default() -> Self {
        Self {
            close_iterations: 3,
            open_iterations: 50,
        }
    }
}

impl Properties for MaskCleaner {
    fn props_mut(&mut self) -> Vec<(&str, PropertyMut)> {
        vec![
            (
                "Close iters",
                PropertyMut::usize(&mut self.close_iterations, 0, 100),
            ),
            (
                "Open iters",
                PropertyMut::usize(&mut self.open_iterations, 0, 200),
            ),
        ]
    }
}

impl MaskCleaner {
    pub fn new(close_iterations: usize, open_iterations: usize) -> Self {
        Self {
            close_iterations,
            open_iterations,
        }
    }

    /// Close, then open the mask in place.
    pub fn clean(&self, mask: &mut MotionMask) {
        close(mask, self.close_iterations);
        open(mask, self.open_iterations);
        trace!("{} moving cells after cleanup", mask.count_moving());
    }

    /// Close, then open the mask, returning the result.
    pub fn cleaned(&self, mut mask: MotionMask) -> MotionMask {
        self.clean(&mut mask);
        mask
    }
}

/// Dilation followed by erosion.
pub fn close(mask: &mut MotionMask, iterations: usize) {
    dilate(mask, iterations);
    erode(mask, iterations);
}

/// Erosion followed by dilation.
pub fn open(mask: &mut MotionMask, iterations: usize) {
    erode(mask, iterations);
    dilate(mask, iterations);
}

/// Grow moving regions by `iterations` cells in every direction.
pub fn dilate(mask: &mut MotionMask, iterations: usize) {
    apply(mask, iterations, Op::Dilate);
}

/// Shrink moving regions by `iterations` cells in every direction.
pub fn erode(mask: &mut MotionMask, iterations: usize) {
    apply(mask, iterations, Op::Erode);
}

#[derive(Clone, Copy)]
enum Op {
    Dilate,
    Erode,
}

fn apply(mask: &mut MotionMask, radius: usize, op: Op) {
    if radius == 0 {
        return;
    }

    let (width, height) = mask.dim();
    let cells = mask.as_mut_slice();

    let mut scratch = Sweep::default();

    for y in 0..height {
        scratch.run(cells, y * width, 1, width, radius, op);
    }

    for x in 0..width {
        scratch.run(cells, x, width, height, radius, op);
    }
}

/// Buffers reused across line sweeps.
#[derive(Default)]
struct Sweep {
    prefix: Vec<usize>,
}

impl Sweep {
    /// Filter a single line of `len` cells starting at `start`, `step` cells apart.
    fn run(&mut self, cells: &mut [u8], start: usize, step: usize, len: usize, radius: usize, op: Op) {
        let at = |i: usize| start + i * step;

        // prefix[i] holds the number of moving cells in [0; i).
        self.prefix.clear();
        self.prefix.push(0);
        let mut count = 0;
        for i in 0..len {
            if cells[at(i)] == MotionMask::MOVING {
                count += 1;
            }
            self.prefix.push(count);
        }

        for i in 0..len {
            let lo = i.saturating_sub(radius);
            let hi = std::cmp::min(i + radius + 1, len);
            let moving = self.prefix[hi] - self.prefix[lo];

            let set = match op {
                Op::Dilate => moving > 0,
                Op::Erode => moving == hi - lo,
            };

            cells[at(i)] = if set {
                MotionMask::MOVING
            } else {
                MotionMask::STATIC
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;

    /// Single 3x3 step with out-of-bounds cells ignored.
    fn step_3x3(mask: &MotionMask, op: Op) -> MotionMask {
        let (w, h) = mask.dim();
        MotionMask::from_fn(w, h, |x, y| {
            let mut neighbours = (-1isize..=1)
                .flat_map(|oy| (-1isize..=1).map(move |ox| (ox, oy)))
                .map(|(ox, oy)| (x as isize + ox, y as isize + oy))
                .filter(|&(nx, ny)| (0..w as isize).contains(&nx) && (0..h as isize).contains(&ny))
                .map(|(nx, ny)| mask.is_moving(nx as usize, ny as usize));

            match op {
                Op::Dilate => neighbours.any(|m| m),
                Op::Erode => neighbours.all(|m| m),
            }
        })
    }

    fn iterate_3x3(mask: &MotionMask, iterations: usize, op: Op) -> MotionMask {
        (0..iterations).fold(mask.clone(), |m, _| step_3x3(&m, op))
    }

    fn random_mask(rng: &mut StdRng, w: usize, h: usize, density: f64) -> MotionMask {
        MotionMask::from_fn(w, h, |_, _| rng.gen_bool(density))
    }

    #[test]
    fn matches_iterated_3x3() {
        let mut rng = StdRng::seed_from_u64(1234);

        for &(w, h, density) in &[(17, 11, 0.5), (23, 9, 0.8), (8, 30, 0.2), (1, 12, 0.6)] {
            let mask = random_mask(&mut rng, w, h, density);

            for iters in 1..5 {
                let mut dilated = mask.clone();
                dilate(&mut dilated, iters);
                assert_eq!(dilated, iterate_3x3(&mask, iters, Op::Dilate), "dilate {iters}");

                let mut eroded = mask.clone();
                erode(&mut eroded, iters);
                assert_eq!(eroded, iterate_3x3(&mask, iters, Op::Erode), "erode {iters}");
            }
        }
    }

    #[test]
    fn closing_bridges_gaps() {
        let mut mask = MotionMask::new(100, 60);
        mask.fill_rect(10, 10, 40, 40);
        mask.fill_rect(45, 10, 75, 40);

        close(&mut mask, 3);

        let mut expected = MotionMask::new(100, 60);
        expected.fill_rect(10, 10, 75, 40);

        assert_eq!(mask, expected);
    }

    #[test]
    fn closing_keeps_wide_gaps() {
        let mut mask = MotionMask::new(100, 60);
        mask.fill_rect(10, 10, 40, 40);
        mask.fill_rect(48, 10, 75, 40);
        let expected = mask.clone();

        close(&mut mask, 3);

        assert_eq!(mask, expected);
    }

    #[test]
    fn opening_size_cutoff() {
        let mut mask = MotionMask::new(300, 300);
        mask.fill_rect(100, 100, 200, 200);
        let expected = mask.clone();

        open(&mut mask, 50);
        assert_eq!(mask, expected);

        let mut mask = MotionMask::new(300, 300);
        mask.fill_rect(100, 100, 199, 200);

        open(&mut mask, 50);
        assert_eq!(mask.count_moving(), 0);
    }

    #[test]
    fn border_does_not_erode() {
        let mut mask = MotionMask::new(320, 240);
        mask.fill_rect(0, 0, 150, 150);
        mask.fill_rect(200, 100, 319, 239);
        let expected = mask.clone();

        open(&mut mask, 50);

        assert_eq!(mask, expected);
    }

    #[test]
    fn default_cleanup_removes_noise() {
        let mut rng = StdRng::seed_from_u64(99);

        let mut mask = MotionMask::new(640, 480);
        mask.fill_rect(300, 150, 520, 400);

        // Sprinkle isolated specks and a mid-sized blob away from the main region.
        for _ in 0..200 {
            let x = rng.gen_range(0..250);
            let y = rng.gen_range(0..480);
            mask.set_moving(x, y, true);
        }
        mask.fill_rect(40, 40, 110, 110);

        let cleaner = MaskCleaner::default();
        let cleaned = cleaner.cleaned(mask);

        let mut expected = MotionMask::new(640, 480);
        expected.fill_rect(300, 150, 520, 400);

        assert_eq!(cleaned, expected);
    }

    #[test]
    fn cleanup_is_stable_on_large_blobs() {
        let mut mask = MotionMask::new(640, 480);
        mask.fill_rect(20, 30, 200, 300);
        mask.fill_rect(350, 100, 600, 420);
        mask.fill_rect(5, 400, 9, 405);

        let cleaner = MaskCleaner::default();
        let once = cleaner.cleaned(mask);
        let twice = cleaner.cleaned(once.clone());

        assert_eq!(once, twice);
        assert!(once.is_moving(100, 100));
        assert!(!once.is_moving(7, 402));
    }

    #[test]
    fn zero_iterations_is_identity() {
        let mut rng = StdRng::seed_from_u64(5);
        let mask = random_mask(&mut rng, 30, 20, 0.3);

        let cleaned = MaskCleaner::new(0, 0).cleaned(mask.clone());

        assert_eq!(cleaned, mask);
    }

    #[test]
    fn iteration_properties() {
        let mut cleaner = MaskCleaner::default();
        cleaner.set_prop("Open iters", "10").unwrap();
        cleaner.set_prop("Close iters", "1").unwrap();

        assert_eq!(cleaner, MaskCleaner::new(1, 10));
    }
}
