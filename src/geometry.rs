//! Percent-space, center-anchored layer boxes and their conversion to absolute pixels.
//!
//! Every layer box is stored as percentages of the logical canvas resolution with `(x, y)` being the
//! box *center*. Changing the canvas resolution never touches these numbers; the absolute geometry is
//! derived on demand.

use crate::foundation::core::{Point, Rect, Vec2};

/// Smallest width/height a box may have, in percent.
pub const MIN_EXTENT_PERCENT: f64 = 1.0;

/// Center-anchored box in percent of the canvas width (x, width) and height (y, height).
///
/// Values are not clamped to `0..=100`: layers may bleed off the canvas.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PercentBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PercentBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn left(&self) -> f64 {
        self.x - self.width / 2.0
    }

    pub fn right(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn top(&self) -> f64 {
        self.y - self.height / 2.0
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height / 2.0
    }

    /// Same box with width/height floored at `min` percent.
    pub fn with_min_extent(self, min: f64) -> Self {
        Self {
            width: self.width.max(min),
            height: self.height.max(min),
            ..self
        }
    }

    pub fn translated(self, delta: Vec2) -> Self {
        Self {
            x: self.x + delta.x,
            y: self.y + delta.y,
            ..self
        }
    }
}

impl Default for PercentBox {
    fn default() -> Self {
        Self::new(50.0, 50.0, 50.0, 50.0)
    }
}

/// Absolute rectangle in logical canvas pixels, top-left anchored.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl PixelRect {
    pub fn center(&self) -> Point {
        Point::new(
            self.left + self.width / 2.0,
            self.top + self.height / 2.0,
        )
    }

    pub fn to_rect(self) -> Rect {
        Rect::new(
            self.left,
            self.top,
            self.left + self.width,
            self.top + self.height,
        )
    }
}

/// Convert a percent box into absolute pixels for a canvas of `canvas_w` x `canvas_h`.
pub fn percent_to_pixels(b: &PercentBox, canvas_w: f64, canvas_h: f64) -> PixelRect {
    let width = canvas_w * (b.width / 100.0);
    let height = canvas_h * (b.height / 100.0);
    PixelRect {
        left: canvas_w * (b.x / 100.0) - width / 2.0,
        top: canvas_h * (b.y / 100.0) - height / 2.0,
        width,
        height,
    }
}

/// Inverse of [`percent_to_pixels`]. A zero-sized canvas axis yields `0` on that axis.
pub fn pixels_to_percent(r: &PixelRect, canvas_w: f64, canvas_h: f64) -> PercentBox {
    let c = r.center();
    PercentBox {
        x: pixel_delta_to_percent(c.x, canvas_w),
        y: pixel_delta_to_percent(c.y, canvas_h),
        width: pixel_delta_to_percent(r.width, canvas_w),
        height: pixel_delta_to_percent(r.height, canvas_h),
    }
}

/// Convert a pixel distance measured against an axis of `axis_len_px` into percent units.
///
/// Pointer deltas are measured against the *rendered* canvas box, so passing the on-screen size
/// here makes manipulation math independent of the current viewport zoom.
pub fn pixel_delta_to_percent(delta_px: f64, axis_len_px: f64) -> f64 {
    if axis_len_px == 0.0 {
        return 0.0;
    }
    delta_px / axis_len_px * 100.0
}

/// Pointer delta in screen pixels converted to a percent-space vector.
pub fn screen_delta_to_percent(delta: Vec2, rendered: Rect) -> Vec2 {
    Vec2::new(
        pixel_delta_to_percent(delta.x, rendered.width()),
        pixel_delta_to_percent(delta.y, rendered.height()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn percent_to_pixels_matches_formula() {
        let b = PercentBox::new(50.0, 25.0, 80.0, 10.0);
        let r = percent_to_pixels(&b, 1080.0, 1920.0);
        assert!(close(r.width, 864.0));
        assert!(close(r.height, 192.0));
        assert!(close(r.left, 540.0 - 432.0));
        assert!(close(r.top, 480.0 - 96.0));
    }

    #[test]
    fn box_pixels_box_roundtrip_is_identity() {
        let boxes = [
            PercentBox::new(50.0, 50.0, 80.0, 15.0),
            PercentBox::new(-12.5, 130.0, 1.0, 250.0),
            PercentBox::new(0.333, 99.9, 33.3, 7.77),
        ];
        for (w, h) in [(1080.0, 1920.0), (1920.0, 1080.0), (1.0, 3.0)] {
            for b in boxes {
                let back = pixels_to_percent(&percent_to_pixels(&b, w, h), w, h);
                assert!(close(back.x, b.x), "{back:?} vs {b:?}");
                assert!(close(back.y, b.y));
                assert!(close(back.width, b.width));
                assert!(close(back.height, b.height));
            }
        }
    }

    #[test]
    fn delta_conversion_uses_rendered_size() {
        let rendered = Rect::new(100.0, 50.0, 640.0, 1010.0);
        let d = screen_delta_to_percent(Vec2::new(54.0, -96.0), rendered);
        assert!(close(d.x, 10.0));
        assert!(close(d.y, -10.0));
        assert_eq!(pixel_delta_to_percent(5.0, 0.0), 0.0);
    }

    #[test]
    fn edges_and_min_extent() {
        let b = PercentBox::new(50.0, 40.0, 20.0, 10.0);
        assert!(close(b.left(), 40.0));
        assert!(close(b.right(), 60.0));
        assert!(close(b.top(), 35.0));
        assert!(close(b.bottom(), 45.0));

        let tiny = PercentBox::new(0.0, 0.0, -3.0, 0.5).with_min_extent(MIN_EXTENT_PERCENT);
        assert_eq!(tiny.width, 1.0);
        assert_eq!(tiny.height, 1.0);
    }
}
