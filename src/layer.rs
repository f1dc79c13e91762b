//! Layer variants and the partial-update record used to mutate them.
//!
//! The JSON shape is flat: shared base fields, the percent box, a `type` tag and the kind-specific
//! fields all live side by side in one object, e.g.
//! `{"id":"a1","type":"shape","x":50,"y":50,"width":60,"height":30,"shapeType":"rectangle",...}`.

use crate::geometry::{MIN_EXTENT_PERCENT, PercentBox};

/// Stable identity of a layer for its whole lifetime.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct LayerId(pub String);

impl LayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which variant a layer is. Fixed at creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKindTag {
    Text,
    Shape,
    Image,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    #[serde(default = "LayerId::generate")]
    pub id: LayerId,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub frame: PercentBox,
    /// Degrees, 0..360.
    #[serde(default)]
    pub rotation: f64,
    /// Percent, 0..=100.
    #[serde(default = "full_opacity")]
    pub opacity: f64,
    #[serde(default = "yes")]
    pub visible: bool,
    /// Informational only; draw order is the position in the document's layer list.
    #[serde(default)]
    pub z_index: f64,
    #[serde(flatten)]
    pub kind: LayerKind,
}

fn full_opacity() -> f64 {
    100.0
}

fn yes() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LayerKind {
    Text(TextProps),
    Shape(ShapeProps),
    Image(ImageProps),
}

impl LayerKind {
    pub fn tag(&self) -> LayerKindTag {
        match self {
            Self::Text(_) => LayerKindTag::Text,
            Self::Shape(_) => LayerKindTag::Shape,
            Self::Image(_) => LayerKindTag::Image,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextProps {
    pub text: String,
    /// Absolute logical pixels, not percent.
    pub font_size: f64,
    pub color: String,
    pub font_family: String,
    pub font_weight: String,
    pub text_align: TextAlign,
    pub letter_spacing: f64,
    pub line_height: f64,
    pub text_shadow_enabled: bool,
    pub text_shadow_blur: f64,
    pub text_shadow_color: String,
    pub background_color: String,
    pub padding: f64,
    pub border_radius: f64,
}

impl Default for TextProps {
    fn default() -> Self {
        Self {
            text: "Double-click to edit".to_string(),
            font_size: 120.0,
            color: "#ffffff".to_string(),
            font_family: "Noto Sans SC".to_string(),
            font_weight: "900".to_string(),
            text_align: TextAlign::Center,
            letter_spacing: 0.0,
            line_height: 1.2,
            text_shadow_enabled: true,
            text_shadow_blur: 10.0,
            text_shadow_color: "rgba(0,0,0,0.5)".to_string(),
            background_color: crate::color::TRANSPARENT.to_string(),
            padding: 0.0,
            border_radius: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Rectangle,
    Circle,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShapeProps {
    pub shape_type: ShapeKind,
    pub background_color: String,
    pub border_color: String,
    pub border_width: f64,
    pub border_radius: f64,
    pub box_shadow_enabled: bool,
    pub box_shadow_blur: f64,
    pub box_shadow_color: String,
}

impl Default for ShapeProps {
    fn default() -> Self {
        Self {
            shape_type: ShapeKind::Rectangle,
            background_color: "#f97316".to_string(),
            border_color: "#ffffff".to_string(),
            border_width: 0.0,
            border_radius: 40.0,
            box_shadow_enabled: true,
            box_shadow_blur: 40.0,
            box_shadow_color: "rgba(0,0,0,0.3)".to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectFit {
    Cover,
    Contain,
    Fill,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageProps {
    /// `data:` URL or a path relative to the assets root. Empty renders nothing.
    pub src: String,
    pub object_fit: ObjectFit,
}

impl Default for ImageProps {
    fn default() -> Self {
        Self {
            src: String::new(),
            object_fit: ObjectFit::Contain,
        }
    }
}

impl Layer {
    /// A layer of `kind` with its kind-specific defaults.
    pub fn with_defaults(id: LayerId, kind: LayerKindTag) -> Self {
        let (name, frame, kind) = match kind {
            LayerKindTag::Text => (
                "Text",
                PercentBox::new(50.0, 50.0, 80.0, 15.0),
                LayerKind::Text(TextProps::default()),
            ),
            LayerKindTag::Shape => (
                "Shape",
                PercentBox::new(50.0, 50.0, 60.0, 30.0),
                LayerKind::Shape(ShapeProps::default()),
            ),
            LayerKindTag::Image => (
                "Image",
                PercentBox::new(50.0, 50.0, 50.0, 50.0),
                LayerKind::Image(ImageProps::default()),
            ),
        };
        Self {
            id,
            name: name.to_string(),
            frame,
            rotation: 0.0,
            opacity: 100.0,
            visible: true,
            z_index: 0.0,
            kind,
        }
    }

    pub fn tag(&self) -> LayerKindTag {
        self.kind.tag()
    }

    /// Bring stored values back inside the ranges edits maintain: extents of at least 1 %,
    /// rotation in `0..360`, opacity in `0..=100`. Non-finite numbers fall back to the defaults.
    pub fn normalized(mut self) -> Self {
        let f = &mut self.frame;
        if !f.x.is_finite() {
            f.x = 50.0;
        }
        if !f.y.is_finite() {
            f.y = 50.0;
        }
        if !f.width.is_finite() {
            f.width = MIN_EXTENT_PERCENT;
        }
        if !f.height.is_finite() {
            f.height = MIN_EXTENT_PERCENT;
        }
        *f = f.with_min_extent(MIN_EXTENT_PERCENT);

        self.rotation = if self.rotation.is_finite() {
            self.rotation.rem_euclid(360.0)
        } else {
            0.0
        };
        self.opacity = if self.opacity.is_finite() {
            self.opacity.clamp(0.0, 100.0)
        } else {
            100.0
        };
        self
    }
}

/// Partial update for a layer. `None` leaves a field untouched.
///
/// This is the single mutation record shared by editing widgets and the manipulation engine.
/// Fields that do not exist on the target layer's kind are ignored; `id` and `type` cannot be
/// patched.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayerPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z_index: Option<f64>,

    // text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_align: Option<TextAlign>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub letter_spacing: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_shadow_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_shadow_blur: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_shadow_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding: Option<f64>,

    // text + shape
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_radius: Option<f64>,

    // shape
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape_type: Option<ShapeKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub box_shadow_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub box_shadow_blur: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub box_shadow_color: Option<String>,

    // image
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_fit: Option<ObjectFit>,
}

impl LayerPatch {
    /// Patch that only moves the box center.
    pub fn center(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    /// Patch that replaces the whole box.
    pub fn frame(b: PercentBox) -> Self {
        Self {
            x: Some(b.x),
            y: Some(b.y),
            width: Some(b.width),
            height: Some(b.height),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply onto `layer`, enforcing the value ranges of the model.
    pub fn apply(&self, layer: &mut Layer) {
        fn set<T: Clone>(dst: &mut T, src: &Option<T>) {
            if let Some(v) = src {
                *dst = v.clone();
            }
        }

        set(&mut layer.name, &self.name);
        set(&mut layer.visible, &self.visible);
        set(&mut layer.z_index, &self.z_index);
        if let Some(r) = self.rotation.filter(|r| r.is_finite()) {
            layer.rotation = r.rem_euclid(360.0);
        }
        if let Some(o) = self.opacity.filter(|o| o.is_finite()) {
            layer.opacity = o.clamp(0.0, 100.0);
        }

        let f = &mut layer.frame;
        set(&mut f.x, &self.x.filter(|v| v.is_finite()));
        set(&mut f.y, &self.y.filter(|v| v.is_finite()));
        set(&mut f.width, &self.width.filter(|v| v.is_finite()));
        set(&mut f.height, &self.height.filter(|v| v.is_finite()));
        *f = f.with_min_extent(MIN_EXTENT_PERCENT);

        match &mut layer.kind {
            LayerKind::Text(t) => {
                set(&mut t.text, &self.text);
                set(&mut t.font_size, &self.font_size);
                set(&mut t.color, &self.color);
                set(&mut t.font_family, &self.font_family);
                set(&mut t.font_weight, &self.font_weight);
                set(&mut t.text_align, &self.text_align);
                set(&mut t.letter_spacing, &self.letter_spacing);
                set(&mut t.line_height, &self.line_height);
                set(&mut t.text_shadow_enabled, &self.text_shadow_enabled);
                set(&mut t.text_shadow_blur, &self.text_shadow_blur);
                set(&mut t.text_shadow_color, &self.text_shadow_color);
                set(&mut t.background_color, &self.background_color);
                set(&mut t.padding, &self.padding);
                set(&mut t.border_radius, &self.border_radius);
            }
            LayerKind::Shape(s) => {
                set(&mut s.shape_type, &self.shape_type);
                set(&mut s.background_color, &self.background_color);
                set(&mut s.border_color, &self.border_color);
                set(&mut s.border_width, &self.border_width);
                set(&mut s.border_radius, &self.border_radius);
                set(&mut s.box_shadow_enabled, &self.box_shadow_enabled);
                set(&mut s.box_shadow_blur, &self.box_shadow_blur);
                set(&mut s.box_shadow_color, &self.box_shadow_color);
            }
            LayerKind::Image(i) => {
                set(&mut i.src, &self.src);
                set(&mut i.object_fit, &self.object_fit);
            }
        }
    }
}
