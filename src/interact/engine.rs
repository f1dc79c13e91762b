//! Pointer-driven move/resize state machine.
//!
//! A gesture starts on pointer-down over a layer body or one of the selected layer's handles and
//! captures a snapshot of that layer's box. Every pointer-move recomputes the box from the snapshot
//! and the total pointer delta, never incrementally, so rounding cannot accumulate over a drag.
//! Pointer-up and pointer-leave both end the gesture.

use super::{
    handle::{Handle, resize_box},
    hit::{HitTarget, hit_test},
    snap::{Guide, SnapTargets, snap_box},
};
use crate::{
    config::EditorConfig,
    document::Document,
    foundation::core::{Point, Rect},
    geometry::{PercentBox, pixel_delta_to_percent, screen_delta_to_percent},
    layer::{LayerId, LayerPatch},
};

#[derive(Clone, Debug, PartialEq)]
pub enum Gesture {
    Idle,
    Moving {
        id: LayerId,
        start_pointer: Point,
        start_box: PercentBox,
    },
    Resizing {
        id: LayerId,
        handle: Handle,
        start_pointer: Point,
        start_box: PercentBox,
    },
}

/// Pointer cursor the view should show.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CursorHint {
    Default,
    Move,
    Resize(Handle),
}

impl CursorHint {
    pub fn css_name(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Move => "move",
            Self::Resize(h) => h.cursor_name(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ManipulationEngine {
    gesture: Gesture,
    guides: Vec<Guide>,
    snap_threshold_px: f64,
    min_extent_percent: f64,
}

impl Default for ManipulationEngine {
    fn default() -> Self {
        Self::from_config(&EditorConfig::default())
    }
}

impl ManipulationEngine {
    pub fn from_config(cfg: &EditorConfig) -> Self {
        Self {
            gesture: Gesture::Idle,
            guides: Vec::new(),
            snap_threshold_px: cfg.snap_threshold_px,
            min_extent_percent: cfg.min_extent_percent,
        }
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn is_idle(&self) -> bool {
        self.gesture == Gesture::Idle
    }

    /// Alignment guides of the current move step. Empty unless a snap is active.
    pub fn guides(&self) -> &[Guide] {
        &self.guides
    }

    /// Hit-test `pointer` and start whatever gesture it lands on. Pressing empty canvas clears the
    /// selection.
    pub fn pointer_down(&mut self, doc: &mut Document, pointer: Point, rendered: Rect) -> HitTarget {
        let target = hit_test(doc, pointer, rendered);
        match &target {
            HitTarget::Handle(id, handle) => self.begin_resize(doc, id, *handle, pointer),
            HitTarget::Body(id) => self.begin_move(doc, id, pointer),
            HitTarget::Canvas => {
                doc.select(None);
                self.end();
            }
        }
        target
    }

    /// Start moving `id`. Selects it. Unknown ids leave the engine idle.
    pub fn begin_move(&mut self, doc: &mut Document, id: &LayerId, pointer: Point) {
        let Some(layer) = doc.layer(id) else {
            self.end();
            return;
        };
        let start_box = layer.frame;
        doc.select(Some(id));
        self.guides.clear();
        self.gesture = Gesture::Moving {
            id: id.clone(),
            start_pointer: pointer,
            start_box,
        };
        tracing::debug!(layer = %id, "move started");
    }

    /// Start resizing `id` from `handle`. Selects it. Unknown ids leave the engine idle.
    pub fn begin_resize(&mut self, doc: &mut Document, id: &LayerId, handle: Handle, pointer: Point) {
        let Some(layer) = doc.layer(id) else {
            self.end();
            return;
        };
        let start_box = layer.frame;
        doc.select(Some(id));
        self.guides.clear();
        self.gesture = Gesture::Resizing {
            id: id.clone(),
            handle,
            start_pointer: pointer,
            start_box,
        };
        tracing::debug!(layer = %id, %handle, "resize started");
    }

    /// Advance the active gesture. Returns `true` when the document changed.
    pub fn pointer_move(&mut self, doc: &mut Document, pointer: Point, rendered: Rect) -> bool {
        if rendered.width() <= 0.0 || rendered.height() <= 0.0 {
            return false;
        }

        match &self.gesture {
            Gesture::Idle => false,
            Gesture::Moving {
                id,
                start_pointer,
                start_box,
            } => {
                let delta = screen_delta_to_percent(pointer - *start_pointer, rendered);
                let candidate = start_box.translated(delta);
                let targets = SnapTargets::collect(
                    doc.layers.iter().filter(|l| &l.id != id).map(|l| &l.frame),
                );
                let (snapped, guides) = snap_box(
                    candidate,
                    &targets,
                    pixel_delta_to_percent(self.snap_threshold_px, rendered.width()),
                    pixel_delta_to_percent(self.snap_threshold_px, rendered.height()),
                );

                let id = id.clone();
                if doc.update_layer(&id, &LayerPatch::center(snapped.x, snapped.y)) {
                    self.guides = guides;
                    true
                } else {
                    self.end();
                    false
                }
            }
            Gesture::Resizing {
                id,
                handle,
                start_pointer,
                start_box,
            } => {
                let delta = screen_delta_to_percent(pointer - *start_pointer, rendered);
                let resized = resize_box(
                    *start_box,
                    *handle,
                    delta.x,
                    delta.y,
                    self.min_extent_percent,
                );
                self.guides.clear();

                let id = id.clone();
                if doc.update_layer(&id, &LayerPatch::frame(resized)) {
                    true
                } else {
                    self.end();
                    false
                }
            }
        }
    }

    pub fn pointer_up(&mut self) {
        self.end();
    }

    pub fn pointer_leave(&mut self) {
        self.end();
    }

    /// What the cursor should look like at `pointer`.
    pub fn cursor_hint(&self, doc: &Document, pointer: Point, rendered: Rect) -> CursorHint {
        match &self.gesture {
            Gesture::Resizing { .. } => CursorHint::Default,
            Gesture::Moving { .. } => CursorHint::Move,
            Gesture::Idle => match hit_test(doc, pointer, rendered) {
                HitTarget::Handle(_, h) => CursorHint::Resize(h),
                HitTarget::Body(_) => CursorHint::Move,
                HitTarget::Canvas => CursorHint::Default,
            },
        }
    }

    fn end(&mut self) {
        if self.gesture != Gesture::Idle {
            tracing::debug!("gesture ended");
        }
        self.gesture = Gesture::Idle;
        self.guides.clear();
    }
}
