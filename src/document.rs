//! The canvas document: background, logical resolution, the ordered layer stack and selection.
//!
//! Array position is z-order (index 0 is drawn first, the last layer is on top). Layers are addressed
//! by [`LayerId`]; every mutation looks the id up and silently does nothing when it is absent, so
//! stale ids coming from an in-progress gesture or a widget can never fail an operation.

use crate::{
    foundation::error::{CoverError, CoverResult},
    layer::{Layer, LayerId, LayerKindTag, LayerPatch},
};

pub const DEFAULT_BACKGROUND: &str = "#ffffff";
pub const DEFAULT_WIDTH: u32 = 1080;
pub const DEFAULT_HEIGHT: u32 = 1920;
pub const DEFAULT_ASPECT_LABEL: &str = "9:16";

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Color string, or `"transparent"` to preserve alpha on export.
    #[serde(rename = "canvasBackgroundColor")]
    pub background_color: String,
    #[serde(rename = "canvasBackgroundImage")]
    pub background_image: Option<String>,
    /// Logical resolution in pixels. Always > 0.
    pub width: u32,
    pub height: u32,
    pub aspect_ratio_label: String,
    pub layers: Vec<Layer>,
    #[serde(rename = "selectedId")]
    pub selected: Option<LayerId>,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            background_color: DEFAULT_BACKGROUND.to_string(),
            background_image: None,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            aspect_ratio_label: DEFAULT_ASPECT_LABEL.to_string(),
            layers: Vec::new(),
            selected: None,
        }
    }
}

/// Direction for [`Document::reorder`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReorderDirection {
    /// One step toward the top (end of the list).
    Up,
    /// One step toward the bottom (start of the list).
    Down,
    Top,
    Bottom,
}

/// Named output resolutions offered by the editor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Preset {
    pub label: &'static str,
    pub width: u32,
    pub height: u32,
    pub ratio_label: &'static str,
}

pub const PRESETS: &[Preset] = &[
    Preset {
        label: "Shorts / vertical video",
        width: 1080,
        height: 1920,
        ratio_label: "9:16",
    },
    Preset {
        label: "Photo note",
        width: 1242,
        height: 1660,
        ratio_label: "3:4",
    },
    Preset {
        label: "Portrait post",
        width: 1080,
        height: 1350,
        ratio_label: "4:5",
    },
    Preset {
        label: "Square post",
        width: 1080,
        height: 1080,
        ratio_label: "1:1",
    },
    Preset {
        label: "Landscape HD",
        width: 1920,
        height: 1080,
        ratio_label: "16:9",
    },
    Preset {
        label: "Classic landscape",
        width: 1440,
        height: 1080,
        ratio_label: "4:3",
    },
];

impl Document {
    pub fn new(width: u32, height: u32) -> CoverResult<Self> {
        let mut doc = Self::default();
        doc.set_resolution(width, height, None)?;
        Ok(doc)
    }

    pub fn index_of(&self, id: &LayerId) -> Option<usize> {
        self.layers.iter().position(|l| &l.id == id)
    }

    pub fn layer(&self, id: &LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| &l.id == id)
    }

    pub fn selected_layer(&self) -> Option<&Layer> {
        self.selected.as_ref().and_then(|id| self.layer(id))
    }

    /// Append a new layer of `kind` with defaults merged with `overrides`, select it and return
    /// its id.
    pub fn add_layer(&mut self, kind: LayerKindTag, overrides: &LayerPatch) -> LayerId {
        let id = LayerId::generate();
        let mut layer = Layer::with_defaults(id.clone(), kind);
        overrides.apply(&mut layer);
        tracing::debug!(layer = %id, ?kind, "add layer");
        self.layers.push(layer);
        self.selected = Some(id.clone());
        id
    }

    /// Insert an already-built layer on top and select it.
    pub fn push_layer(&mut self, layer: Layer) {
        self.selected = Some(layer.id.clone());
        self.layers.push(layer);
    }

    /// Apply a partial update. Returns `false` (and changes nothing) when `id` is absent.
    pub fn update_layer(&mut self, id: &LayerId, patch: &LayerPatch) -> bool {
        match self.layers.iter_mut().find(|l| &l.id == id) {
            Some(layer) => {
                patch.apply(layer);
                true
            }
            None => {
                tracing::trace!(layer = %id, "update for absent layer ignored");
                false
            }
        }
    }

    /// Move a layer within the stack. Untouched layers keep their relative order.
    pub fn reorder(&mut self, id: &LayerId, direction: ReorderDirection) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        let moved = self.layers.remove(index);
        let target = match direction {
            ReorderDirection::Up => (index + 1).min(self.layers.len()),
            ReorderDirection::Down => index.saturating_sub(1),
            ReorderDirection::Top => self.layers.len(),
            ReorderDirection::Bottom => 0,
        };
        self.layers.insert(target, moved);
        tracing::debug!(layer = %id, ?direction, from = index, to = target, "reorder layer");
        true
    }

    /// Remove a layer, clearing the selection if it pointed at it.
    pub fn delete_layer(&mut self, id: &LayerId) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        self.layers.remove(index);
        if self.selected.as_ref() == Some(id) {
            self.selected = None;
        }
        tracing::debug!(layer = %id, "delete layer");
        true
    }

    /// Select a layer or clear the selection. Selecting an absent id clears it.
    pub fn select(&mut self, id: Option<&LayerId>) {
        self.selected = id.filter(|id| self.index_of(id).is_some()).cloned();
    }

    pub fn set_resolution(
        &mut self,
        width: u32,
        height: u32,
        aspect_label: Option<&str>,
    ) -> CoverResult<()> {
        if width == 0 || height == 0 {
            return Err(CoverError::validation("canvas width/height must be > 0"));
        }
        self.width = width;
        self.height = height;
        if let Some(label) = aspect_label {
            self.aspect_ratio_label = label.to_string();
        }
        Ok(())
    }

    pub fn apply_preset(&mut self, preset: &Preset) {
        self.width = preset.width;
        self.height = preset.height;
        self.aspect_ratio_label = preset.ratio_label.to_string();
    }

    pub fn set_background_color(&mut self, color: impl Into<String>) {
        self.background_color = color.into();
    }

    pub fn set_background_image(&mut self, src: Option<String>) {
        self.background_image = src.filter(|s| !s.is_empty());
    }

    /// Restore the default empty document.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Deep copy with the selection cleared.
    pub fn snapshot(&self) -> Self {
        Self {
            selected: None,
            ..self.clone()
        }
    }
}
