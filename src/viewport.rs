//! Fit-to-container display scale for the editing view.
//!
//! The scale only feeds the on-screen transform. Stored geometry and exported pixels never depend
//! on it.

use crate::config::EditorConfig;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportScaler {
    padding_px: f64,
    margin_factor: f64,
    scale: f64,
}

impl Default for ViewportScaler {
    fn default() -> Self {
        Self::new(64.0, 0.95)
    }
}

impl ViewportScaler {
    pub fn new(padding_px: f64, margin_factor: f64) -> Self {
        Self {
            padding_px,
            margin_factor,
            scale: 1.0,
        }
    }

    pub fn from_config(cfg: &EditorConfig) -> Self {
        Self::new(cfg.viewport_padding_px, cfg.viewport_margin_factor)
    }

    /// Current display scale.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Recompute from the container size and the logical canvas resolution and return the new
    /// scale. A zero canvas axis keeps the previous value.
    pub fn recompute(
        &mut self,
        container_w: f64,
        container_h: f64,
        canvas_w: f64,
        canvas_h: f64,
    ) -> f64 {
        if canvas_w == 0.0 || canvas_h == 0.0 {
            return self.scale;
        }
        let avail_w = (container_w - self.padding_px).max(0.0);
        let avail_h = (container_h - self.padding_px).max(0.0);
        self.scale = fit_scale(avail_w, avail_h, canvas_w, canvas_h, self.margin_factor);
        tracing::trace!(scale = self.scale, "viewport rescaled");
        self.scale
    }
}

/// `min(avail_w / canvas_w, avail_h / canvas_h) * margin_factor`, or `1.0` when that is not finite.
pub fn fit_scale(avail_w: f64, avail_h: f64, canvas_w: f64, canvas_h: f64, margin_factor: f64) -> f64 {
    let s = (avail_w / canvas_w).min(avail_h / canvas_h) * margin_factor;
    if s.is_finite() { s } else { 1.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fits_limiting_axis_with_margin() {
        let mut v = ViewportScaler::default();
        let s = v.recompute(1064.0, 1064.0, 1080.0, 1920.0);
        assert!((s - (1000.0 / 1920.0) * 0.95).abs() < 1e-12);
        assert_eq!(v.scale(), s);
    }

    #[test]
    fn zero_canvas_keeps_previous() {
        let mut v = ViewportScaler::default();
        let s = v.recompute(800.0, 600.0, 100.0, 100.0);
        assert_eq!(v.recompute(800.0, 600.0, 0.0, 100.0), s);
        assert_eq!(v.recompute(800.0, 600.0, 100.0, 0.0), s);
    }

    #[test]
    fn non_finite_falls_back_to_one() {
        assert_eq!(fit_scale(f64::INFINITY, f64::INFINITY, 1.0, 1.0, 0.95), 1.0);
        assert_eq!(fit_scale(f64::NAN, f64::NAN, 1.0, 1.0, 0.95), 1.0);
    }

    #[test]
    fn tiny_container_clamps_to_zero_scale() {
        let mut v = ViewportScaler::default();
        assert_eq!(v.recompute(10.0, 10.0, 1080.0, 1920.0), 0.0);
    }
}
