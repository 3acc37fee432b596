//! # Bounding box overlay

use crate::prelude::v1::*;

/// Draws detected motion boxes on colour frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Overlay {
    pub color: Bgr,
    /// Line thickness in pixels, centred on the box edges.
    pub thickness: usize,
}

impl Default for Overlay {
    fn default() -> Self {
        Self {
            color: Bgr::RED,
            thickness: 3,
        }
    }
}

impl Properties for Overlay {
    fn props_mut(&mut self) -> Vec<(&str, PropertyMut)> {
        vec![(
            "Thickness",
            PropertyMut::usize(&mut self.thickness, 0, 32),
        )]
    }
}

impl Overlay {
    /// Draw the outline of `bbox` onto the frame.
    ///
    /// Parts of the outline that fall outside the frame are clipped.
    pub fn draw(&self, frame: &mut ColorFrame, bbox: &BoundingBox) {
        let (width, height) = frame.dim();

        if self.thickness == 0 || width == 0 || height == 0 {
            return;
        }

        // Outward and inward reach of the line from the edge.
        let outer = self.thickness / 2;
        let inner = self.thickness - 1 - outer;

        let x0 = bbox.left.saturating_sub(outer);
        let y0 = bbox.top.saturating_sub(outer);
        let x1 = std::cmp::min(bbox.right + outer, width - 1);
        let y1 = std::cmp::min(bbox.bottom + outer, height - 1);

        for y in y0..=y1 {
            let horizontal = y <= bbox.top + inner || y + inner >= bbox.bottom;
            let row = frame.row_mut(y);

            for (x, px) in row.iter_mut().enumerate().take(x1 + 1).skip(x0) {
                if horizontal || x <= bbox.left + inner || x + inner >= bbox.right {
                    *px = self.color;
                }
            }
        }
    }

    /// Copy the frame, drawing the box on it if there is one.
    pub fn annotate(&self, frame: &ColorFrame, bbox: Option<&BoundingBox>) -> ColorFrame {
        let mut out = frame.clone();
        if let Some(bbox) = bbox {
            self.draw(&mut out, bbox);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn painted(frame: &ColorFrame) -> usize {
        frame.pixels().filter(|&(_, _, p)| p == Bgr::RED).count()
    }

    #[test]
    fn thin_outline() {
        let mut frame = ColorFrame::new(20, 20);
        let overlay = Overlay {
            thickness: 1,
            ..Default::default()
        };

        overlay.draw(&mut frame, &BoundingBox::new(5, 5, 14, 14));

        assert_eq!(frame.get(5, 5), Bgr::RED);
        assert_eq!(frame.get(10, 5), Bgr::RED);
        assert_eq!(frame.get(14, 10), Bgr::RED);
        assert_eq!(frame.get(10, 10), Bgr::default());
        assert_eq!(frame.get(4, 4), Bgr::default());
        assert_eq!(frame.get(15, 15), Bgr::default());
        // Perimeter of a 10x10 box.
        assert_eq!(painted(&frame), 36);
    }

    #[test]
    fn thick_outline_is_centred() {
        let mut frame = ColorFrame::new(30, 30);

        Overlay::default().draw(&mut frame, &BoundingBox::new(10, 10, 19, 19));

        assert_eq!(frame.get(9, 9), Bgr::RED);
        assert_eq!(frame.get(11, 15), Bgr::RED);
        assert_eq!(frame.get(20, 20), Bgr::RED);
        assert_eq!(frame.get(12, 12), Bgr::default());
        assert_eq!(frame.get(8, 8), Bgr::default());
        assert_eq!(frame.get(21, 15), Bgr::default());
        // 12x12 outer square minus 6x6 inner square.
        assert_eq!(painted(&frame), 144 - 36);
    }

    #[test]
    fn clipped_at_frame_edges() {
        let mut frame = ColorFrame::new(8, 6);

        Overlay::default().draw(&mut frame, &BoundingBox::new(0, 0, 7, 5));

        assert_eq!(frame.get(0, 0), Bgr::RED);
        assert_eq!(frame.get(7, 5), Bgr::RED);
        assert_eq!(frame.get(3, 3), Bgr::default());
    }

    #[test]
    fn annotate_without_box_copies() {
        let frame = ColorFrame::from_fn(6, 4, |x, y| Bgr::new(x as u8, y as u8, 9));

        assert_eq!(Overlay::default().annotate(&frame, None), frame);

        let annotated =
            Overlay::default().annotate(&frame, Some(&BoundingBox::new(1, 1, 4, 2)));
        assert_ne!(annotated, frame);
        assert_eq!(annotated.get(1, 1), Bgr::RED);
    }
}
