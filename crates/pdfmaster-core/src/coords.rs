//! Percentage UI coordinates to PDF user space
//!
//! The editor measures positions as 0-100 percent of the rendered page image
//! with the origin at the top-left. PDF user space has its origin at the
//! bottom-left, so the vertical axis flips.

use serde::Serialize;

/// Page width and height in PDF points
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn letter() -> Self {
        Self::new(612.0, 792.0)
    }

    /// Anchor point for a percentage position.
    pub fn to_pdf(&self, x: f64, y: f64) -> PdfPoint {
        PdfPoint {
            x: x / 100.0 * self.width,
            y: self.height - (y / 100.0 * self.height),
        }
    }

    /// Absolute size for a percentage width/height pair.
    pub fn scale(&self, width_pct: f64, height_pct: f64) -> (f64, f64) {
        (
            width_pct / 100.0 * self.width,
            height_pct / 100.0 * self.height,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfPoint {
    pub x: f64,
    pub y: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_top_center_maps_to_top_edge() {
        let page = PageSize::new(200.0, 300.0);
        assert_eq!(page.to_pdf(50.0, 0.0), PdfPoint { x: 100.0, y: 300.0 });
    }

    #[test]
    fn test_corners() {
        let page = PageSize::letter();
        assert_eq!(page.to_pdf(0.0, 0.0), PdfPoint { x: 0.0, y: 792.0 });
        assert_eq!(page.to_pdf(100.0, 100.0), PdfPoint { x: 612.0, y: 0.0 });
    }

    #[test]
    fn test_out_of_range_is_not_clamped() {
        let page = PageSize::new(100.0, 100.0);
        assert_eq!(page.to_pdf(150.0, -50.0), PdfPoint { x: 150.0, y: 150.0 });
    }

    #[test]
    fn test_scale_is_per_axis() {
        let page = PageSize::new(200.0, 400.0);
        assert_eq!(page.scale(10.0, 10.0), (20.0, 40.0));
    }

    proptest! {
        #[test]
        fn prop_vertical_flip(y in -200.0f64..200.0, height in 1.0f64..2000.0) {
            let page = PageSize::new(100.0, height);
            let point = page.to_pdf(0.0, y);
            let expected = height - y / 100.0 * height;
            prop_assert!((point.y - expected).abs() < 1e-9);
        }

        #[test]
        fn prop_horizontal_is_linear(x in -200.0f64..200.0, width in 1.0f64..2000.0) {
            let page = PageSize::new(width, 100.0);
            let point = page.to_pdf(x, 0.0);
            prop_assert!((point.x - x * width / 100.0).abs() < 1e-9);
        }
    }
}
