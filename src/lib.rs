//! coverkit: a layered cover image composer.
//!
//! A [`Document`] holds an ordered stack of text, shape and image layers positioned in percent of a
//! fixed logical resolution. [`ManipulationEngine`] turns pointer input into moves (with alignment
//! snapping) and anchor-preserving resizes, [`ViewportScaler`] fits the canvas on screen, and
//! [`ExportPipeline`] rasterizes the document with [`CpuRasterizer`] into an exact-size PNG.
#![forbid(unsafe_code)]

pub mod color;
pub mod config;
pub mod document;
pub mod export;
pub mod foundation;
pub mod geometry;
pub mod interact;
pub mod layer;
pub mod render;
pub mod session;
pub mod template;
pub mod viewport;

pub use color::{ColorDef, parse_color};
pub use config::{DownsampleFilter, EditorConfig, ExportOpts};
pub use document::{Document, PRESETS, Preset, ReorderDirection};
pub use export::{ExportPipeline, ExportTicket, RasterArtifact};
pub use foundation::core::{Affine, Point, Rect, Vec2};
pub use foundation::error::{CoverError, CoverResult};
pub use geometry::{PercentBox, PixelRect};
pub use interact::{
    CursorHint, Gesture, Guide, GuideAxis, Handle, HitTarget, ManipulationEngine, hit_test,
};
pub use layer::{Layer, LayerId, LayerKind, LayerKindTag, LayerPatch};
pub use render::{RasterFrame, Rasterizer, cpu::CpuRasterizer, text::TextEngine};
pub use session::EditorSession;
pub use template::{JsonFileStore, MemoryStore, Template, TemplateLibrary, TemplateStore};
pub use viewport::ViewportScaler;
