//! The single owned editor state: document, gesture, viewport and export guard.
//!
//! Every mutation goes through here, so a view layer only needs one value to drive and observe.

use crate::{
    config::EditorConfig,
    document::{Document, Preset, ReorderDirection},
    export::{ExportPipeline, ExportTicket, RasterArtifact},
    foundation::{
        core::{Point, Rect},
        error::CoverResult,
    },
    interact::{CursorHint, Gesture, Guide, HitTarget, ManipulationEngine},
    layer::{LayerId, LayerKindTag, LayerPatch},
    render::Rasterizer,
    template::{Template, load_document_json},
    viewport::ViewportScaler,
};

#[derive(Debug)]
pub struct EditorSession {
    config: EditorConfig,
    doc: Document,
    engine: ManipulationEngine,
    viewport: ViewportScaler,
    export: ExportPipeline,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl EditorSession {
    pub fn new(config: EditorConfig) -> Self {
        Self::with_document(Document::default(), config)
    }

    pub fn with_document(doc: Document, config: EditorConfig) -> Self {
        Self {
            engine: ManipulationEngine::from_config(&config),
            viewport: ViewportScaler::from_config(&config),
            export: ExportPipeline::new(config.export.clone()),
            config,
            doc,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn guides(&self) -> &[Guide] {
        self.engine.guides()
    }

    pub fn gesture(&self) -> &Gesture {
        self.engine.gesture()
    }

    pub fn viewport_scale(&self) -> f64 {
        self.viewport.scale()
    }

    // Layer store

    pub fn add_layer(&mut self, kind: LayerKindTag, overrides: &LayerPatch) -> LayerId {
        self.doc.add_layer(kind, overrides)
    }

    pub fn update_layer(&mut self, id: &LayerId, patch: &LayerPatch) -> bool {
        self.doc.update_layer(id, patch)
    }

    pub fn reorder(&mut self, id: &LayerId, direction: ReorderDirection) -> bool {
        self.doc.reorder(id, direction)
    }

    pub fn delete_layer(&mut self, id: &LayerId) -> bool {
        self.doc.delete_layer(id)
    }

    pub fn select(&mut self, id: Option<&LayerId>) {
        self.doc.select(id);
    }

    /// Change the logical resolution and refit the view to `container`.
    pub fn set_resolution(
        &mut self,
        width: u32,
        height: u32,
        aspect_label: Option<&str>,
        container: (f64, f64),
    ) -> CoverResult<f64> {
        self.doc.set_resolution(width, height, aspect_label)?;
        Ok(self.resize_viewport(container.0, container.1))
    }

    pub fn apply_preset(&mut self, preset: &Preset, container: (f64, f64)) -> f64 {
        self.doc.apply_preset(preset);
        self.resize_viewport(container.0, container.1)
    }

    pub fn set_background_color(&mut self, color: impl Into<String>) {
        self.doc.set_background_color(color);
    }

    pub fn set_background_image(&mut self, src: Option<String>) {
        self.doc.set_background_image(src);
    }

    /// Back to the default empty document; any gesture in progress ends.
    pub fn reset(&mut self) {
        self.engine.pointer_leave();
        self.doc.reset();
    }

    // Viewport

    pub fn resize_viewport(&mut self, container_w: f64, container_h: f64) -> f64 {
        self.viewport.recompute(
            container_w,
            container_h,
            f64::from(self.doc.width),
            f64::from(self.doc.height),
        )
    }

    /// On-screen rectangle of the canvas when its top-left sits at `origin`.
    pub fn rendered_rect(&self, origin: Point) -> Rect {
        let s = self.viewport.scale();
        Rect::from_origin_size(
            origin,
            (f64::from(self.doc.width) * s, f64::from(self.doc.height) * s),
        )
    }

    // Manipulation

    pub fn pointer_down(&mut self, pointer: Point, rendered: Rect) -> HitTarget {
        self.engine.pointer_down(&mut self.doc, pointer, rendered)
    }

    pub fn pointer_move(&mut self, pointer: Point, rendered: Rect) -> bool {
        self.engine.pointer_move(&mut self.doc, pointer, rendered)
    }

    pub fn pointer_up(&mut self) {
        self.engine.pointer_up();
    }

    pub fn pointer_leave(&mut self) {
        self.engine.pointer_leave();
    }

    pub fn cursor_hint(&self, pointer: Point, rendered: Rect) -> CursorHint {
        self.engine.cursor_hint(&self.doc, pointer, rendered)
    }

    // Export

    /// First export phase: clears the selection.
    pub fn request_export(&mut self) -> CoverResult<ExportTicket> {
        self.export.request(&mut self.doc)
    }

    pub fn capture_export(
        &mut self,
        ticket: ExportTicket,
        rasterizer: &mut dyn Rasterizer,
        now_ms: u64,
    ) -> CoverResult<RasterArtifact> {
        self.export.capture(ticket, &self.doc, rasterizer, now_ms)
    }

    /// Abandon a requested export; the next request can proceed.
    pub fn cancel_export(&mut self, ticket: ExportTicket) {
        self.export.cancel(ticket);
    }

    /// Both export phases back to back, for callers without a view to settle.
    pub fn export_now(
        &mut self,
        rasterizer: &mut dyn Rasterizer,
        now_ms: u64,
    ) -> CoverResult<RasterArtifact> {
        let ticket = self.request_export()?;
        self.capture_export(ticket, rasterizer, now_ms)
    }

    // Templates

    pub fn snapshot_template(&self, now_ms: u64) -> Template {
        Template::snapshot(&self.doc, now_ms)
    }

    /// Replace the document with a template's state.
    pub fn load_template(&mut self, template: &Template) {
        self.engine.pointer_leave();
        self.doc = template.instantiate();
    }

    /// Replace the document from JSON text (a bare state or a template). On error the current
    /// document is untouched.
    pub fn load_json(&mut self, text: &str) -> CoverResult<()> {
        let doc = load_document_json(text)?;
        self.engine.pointer_leave();
        self.doc = doc;
        Ok(())
    }
}
