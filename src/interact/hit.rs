//! Pointer hit testing against the rendered canvas.
//!
//! Everything here is computed in screen pixels relative to the rendered canvas rectangle, so the
//! handle size stays constant whatever the display zoom is.

use super::handle::Handle;
use crate::{
    document::Document,
    foundation::core::{Point, Rect, Vec2},
    layer::{Layer, LayerId},
};

/// Edge length of a resize handle, in screen pixels.
pub const HANDLE_SIZE_PX: f64 = 10.0;

#[derive(Clone, Debug, PartialEq)]
pub enum HitTarget {
    Handle(LayerId, Handle),
    Body(LayerId),
    Canvas,
}

/// Layer box mapped into screen pixels, still center-anchored with its rotation.
#[derive(Clone, Copy, Debug, PartialEq)]
struct ScreenBox {
    center: Point,
    half: Vec2,
    rotation_rad: f64,
}

impl ScreenBox {
    fn of(layer: &Layer, rendered: Rect) -> Self {
        let (rw, rh) = (rendered.width(), rendered.height());
        let f = &layer.frame;
        Self {
            center: Point::new(
                rendered.x0 + f.x / 100.0 * rw,
                rendered.y0 + f.y / 100.0 * rh,
            ),
            half: Vec2::new(f.width / 100.0 * rw / 2.0, f.height / 100.0 * rh / 2.0),
            rotation_rad: layer.rotation.to_radians(),
        }
    }

    /// `p` expressed in the box's unrotated frame, relative to its center.
    fn to_local(self, p: Point) -> Vec2 {
        let d = p - self.center;
        let (sin, cos) = (-self.rotation_rad).sin_cos();
        Vec2::new(d.x * cos - d.y * sin, d.x * sin + d.y * cos)
    }

    fn contains(self, p: Point) -> bool {
        let l = self.to_local(p);
        l.x.abs() <= self.half.x && l.y.abs() <= self.half.y
    }

    fn handle_at(self, p: Point) -> Option<Handle> {
        let l = self.to_local(p);
        let r = HANDLE_SIZE_PX / 2.0;
        Handle::ALL.into_iter().find(|h| {
            let (fx, fy) = h.unit_position();
            let hx = (fx * 2.0 - 1.0) * self.half.x;
            let hy = (fy * 2.0 - 1.0) * self.half.y;
            (l.x - hx).abs() <= r && (l.y - hy).abs() <= r
        })
    }
}

/// Resolve a pointer position (screen pixels) to what it lands on.
///
/// The selected layer's handles win over any body, then visible bodies are tested top-most first.
pub fn hit_test(doc: &Document, point: Point, rendered: Rect) -> HitTarget {
    if rendered.width() <= 0.0 || rendered.height() <= 0.0 {
        return HitTarget::Canvas;
    }

    if let Some(sel) = doc.selected_layer().filter(|l| l.visible)
        && let Some(h) = ScreenBox::of(sel, rendered).handle_at(point)
    {
        return HitTarget::Handle(sel.id.clone(), h);
    }

    doc.layers
        .iter()
        .rev()
        .filter(|l| l.visible)
        .find(|l| ScreenBox::of(l, rendered).contains(point))
        .map(|l| HitTarget::Body(l.id.clone()))
        .unwrap_or(HitTarget::Canvas)
}
