//! Named document snapshots and their persistence.
//!
//! Saved and imported templates are parsed leniently: malformed canvas fields fall back to the
//! defaults and undecodable layer entries are dropped, but a `layers` value that is not an array
//! rejects the whole state.

use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::{
    document::{DEFAULT_ASPECT_LABEL, DEFAULT_BACKGROUND, DEFAULT_HEIGHT, DEFAULT_WIDTH, Document},
    foundation::{
        core::format_compact_utc,
        error::{CoverError, CoverResult},
    },
    layer::Layer,
};

const IMPORTED_SUFFIX: &str = " (Imported)";
const IMPORTED_NAME: &str = "Imported Template";

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub name: String,
    /// Unix milliseconds.
    pub created_at: u64,
    pub state: Document,
}

fn new_template_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

impl Template {
    /// Deep copy of `doc` with the selection cleared, named `template-YYYYMMDDHHmmss` (UTC).
    pub fn snapshot(doc: &Document, now_ms: u64) -> Self {
        Self {
            id: new_template_id(),
            name: format!("template-{}", format_compact_utc(now_ms)),
            created_at: now_ms,
            state: doc.snapshot(),
        }
    }

    /// Parse a stored template entry. Missing id/name/createdAt are filled in; the state goes
    /// through [`load_state`].
    pub fn from_value(value: &serde_json::Value) -> CoverResult<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| CoverError::validation("template must be a JSON object"))?;
        let state = obj
            .get("state")
            .ok_or_else(|| CoverError::validation("template has no state"))?;
        Ok(Self {
            id: non_empty_str(obj.get("id")).map_or_else(new_template_id, str::to_owned),
            name: non_empty_str(obj.get("name")).unwrap_or("template").to_owned(),
            created_at: obj.get("createdAt").and_then(|v| v.as_u64()).unwrap_or(0),
            state: load_state(state)?,
        })
    }

    /// Parse a template file picked by the user. The result gets a fresh id, a name marked as
    /// imported, and `createdAt = now_ms`.
    pub fn import_json(text: &str, now_ms: u64) -> CoverResult<Self> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        let has_layers = value
            .get("state")
            .and_then(|s| s.get("layers"))
            .is_some_and(serde_json::Value::is_array);
        if !has_layers {
            return Err(CoverError::validation(
                "invalid template file: state.layers must be an array",
            ));
        }

        let mut template = Self::from_value(&value)?;
        template.id = new_template_id();
        template.name = match non_empty_str(value.get("name")) {
            Some(name) => format!("{name}{IMPORTED_SUFFIX}"),
            None => IMPORTED_NAME.to_string(),
        };
        template.created_at = now_ms;
        tracing::info!(name = %template.name, layers = template.state.layers.len(), "imported template");
        Ok(template)
    }

    pub fn to_json_pretty(&self) -> CoverResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Download file name, `{name}.json` with path separators replaced.
    pub fn file_name(&self) -> String {
        let base = if self.name.trim().is_empty() {
            "template".to_string()
        } else {
            self.name.replace(['/', '\\'], "_")
        };
        format!("{base}.json")
    }

    /// Fresh document built from this template, with nothing selected.
    pub fn instantiate(&self) -> Document {
        self.state.snapshot()
    }
}

fn non_empty_str(v: Option<&serde_json::Value>) -> Option<&str> {
    v.and_then(serde_json::Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Positive dimension from a JSON number or numeric string.
fn dimension(v: Option<&serde_json::Value>) -> Option<u32> {
    let n = match v? {
        serde_json::Value::Number(n) => n.as_f64()?,
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !n.is_finite() || n.round() < 1.0 {
        return None;
    }
    Some(n.round().min(f64::from(u32::MAX)) as u32)
}

/// Build a document from a saved state object, substituting defaults for malformed canvas fields.
///
/// Fails with [`CoverError::Validation`] when the state is not an object or its `layers` is not
/// an array. Layer entries that do not decode, or that repeat an earlier id, are skipped.
pub fn load_state(state: &serde_json::Value) -> CoverResult<Document> {
    let obj = state
        .as_object()
        .ok_or_else(|| CoverError::validation("document state must be a JSON object"))?;
    let raw_layers = obj
        .get("layers")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| CoverError::validation("document layers must be an array"))?;

    let mut layers: Vec<Layer> = Vec::with_capacity(raw_layers.len());
    for (index, raw) in raw_layers.iter().enumerate() {
        match serde_json::from_value::<Layer>(raw.clone()) {
            Ok(layer) if layers.iter().any(|l| l.id == layer.id) => {
                tracing::warn!(index, id = %layer.id, "skipping layer with duplicate id");
            }
            Ok(layer) => layers.push(layer.normalized()),
            Err(e) => tracing::warn!(index, error = %e, "skipping undecodable layer"),
        }
    }

    Ok(Document {
        background_color: non_empty_str(obj.get("canvasBackgroundColor"))
            .unwrap_or(DEFAULT_BACKGROUND)
            .to_string(),
        background_image: non_empty_str(obj.get("canvasBackgroundImage")).map(str::to_owned),
        width: dimension(obj.get("width")).unwrap_or(DEFAULT_WIDTH),
        height: dimension(obj.get("height")).unwrap_or(DEFAULT_HEIGHT),
        aspect_ratio_label: non_empty_str(obj.get("aspectRatioLabel"))
            .unwrap_or(DEFAULT_ASPECT_LABEL)
            .to_string(),
        layers,
        selected: None,
    })
}

/// Load a document from JSON text holding either a bare state or a template (`{.., "state": ..}`).
pub fn load_document_json(text: &str) -> CoverResult<Document> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    match value.get("state") {
        Some(state) if value.get("layers").is_none() => load_state(state),
        _ => load_state(&value),
    }
}

/// Where a [`TemplateLibrary`] keeps its list.
pub trait TemplateStore {
    fn load(&mut self) -> CoverResult<Vec<Template>>;

    /// Replace the stored list. On error the previous contents must still be in place.
    fn save(&mut self, templates: &[Template]) -> CoverResult<()>;
}

fn check_quota(bytes: usize, quota: Option<usize>) -> CoverResult<()> {
    match quota {
        Some(q) if bytes > q => Err(CoverError::storage(format!(
            "quota exceeded: {bytes} bytes > {q} byte limit"
        ))),
        _ => Ok(()),
    }
}

/// In-process store, mostly for tests and embedding.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    saved: Vec<Template>,
    quota_bytes: Option<usize>,
}

impl MemoryStore {
    pub fn with_quota_bytes(mut self, quota: usize) -> Self {
        self.quota_bytes = Some(quota);
        self
    }

    pub fn saved(&self) -> &[Template] {
        &self.saved
    }
}

impl TemplateStore for MemoryStore {
    fn load(&mut self) -> CoverResult<Vec<Template>> {
        Ok(self.saved.clone())
    }

    fn save(&mut self, templates: &[Template]) -> CoverResult<()> {
        let bytes = serde_json::to_vec(templates)?.len();
        check_quota(bytes, self.quota_bytes)?;
        self.saved = templates.to_vec();
        Ok(())
    }
}

/// Whole template list as one JSON array in a file.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    quota_bytes: Option<usize>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            quota_bytes: None,
        }
    }

    pub fn with_quota_bytes(mut self, quota: usize) -> Self {
        self.quota_bytes = Some(quota);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TemplateStore for JsonFileStore {
    fn load(&mut self) -> CoverResult<Vec<Template>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let text = std::fs::read_to_string(&self.path)
            .with_context(|| format!("read templates '{}'", self.path.display()))
            .map_err(|e| CoverError::storage(format!("{e:#}")))?;
        let value: serde_json::Value = serde_json::from_str(&text)?;
        let entries = value
            .as_array()
            .ok_or_else(|| CoverError::storage("template file must hold a JSON array"))?;

        let mut out = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            match Template::from_value(entry) {
                Ok(t) => out.push(t),
                Err(e) => tracing::warn!(index, error = %e, "skipping unreadable template"),
            }
        }
        Ok(out)
    }

    fn save(&mut self, templates: &[Template]) -> CoverResult<()> {
        let bytes = serde_json::to_vec(templates)?;
        check_quota(bytes.len(), self.quota_bytes)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| CoverError::storage(format!("create '{}': {e}", parent.display())))?;
        }
        std::fs::write(&self.path, bytes)
            .map_err(|e| CoverError::storage(format!("write '{}': {e}", self.path.display())))
    }
}

/// Newest-first template list mirrored to a [`TemplateStore`].
///
/// Every change is written to the store first; the in-memory list only changes once that write
/// succeeded.
#[derive(Debug)]
pub struct TemplateLibrary<S> {
    store: S,
    templates: Vec<Template>,
}

impl<S: TemplateStore> TemplateLibrary<S> {
    pub fn open(mut store: S) -> CoverResult<Self> {
        let templates = store.load()?;
        Ok(Self { store, templates })
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    pub fn get(&self, id: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Snapshot `doc` as a new template at the front of the list.
    pub fn save_snapshot(&mut self, doc: &Document, now_ms: u64) -> CoverResult<&Template> {
        self.add(Template::snapshot(doc, now_ms))
    }

    /// Parse and add an imported template file.
    pub fn import_json(&mut self, text: &str, now_ms: u64) -> CoverResult<&Template> {
        self.add(Template::import_json(text, now_ms)?)
    }

    pub fn add(&mut self, template: Template) -> CoverResult<&Template> {
        let mut next = Vec::with_capacity(self.templates.len() + 1);
        next.push(template);
        next.extend(self.templates.iter().cloned());
        self.commit(next)?;
        self.templates
            .first()
            .ok_or_else(|| CoverError::storage("template list unexpectedly empty"))
    }

    /// Returns `false` when no template has that id.
    pub fn delete(&mut self, id: &str) -> CoverResult<bool> {
        if self.get(id).is_none() {
            return Ok(false);
        }
        let next = self.templates.iter().filter(|t| t.id != id).cloned().collect();
        self.commit(next)?;
        Ok(true)
    }

    pub fn rename(&mut self, id: &str, name: &str) -> CoverResult<bool> {
        if self.get(id).is_none() {
            return Ok(false);
        }
        let next = self
            .templates
            .iter()
            .map(|t| {
                let mut t = t.clone();
                if t.id == id {
                    t.name = name.to_string();
                }
                t
            })
            .collect();
        self.commit(next)?;
        Ok(true)
    }

    fn commit(&mut self, next: Vec<Template>) -> CoverResult<()> {
        if let Err(e) = self.store.save(&next) {
            tracing::warn!(error = %e, "template store rejected write");
            return Err(e);
        }
        self.templates = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::layer::{LayerKindTag, LayerPatch};

    fn doc_with_layers() -> Document {
        let mut doc = Document::new(1242, 1660).unwrap();
        doc.add_layer(LayerKindTag::Text, &LayerPatch::default());
        doc.add_layer(LayerKindTag::Shape, &LayerPatch::default());
        doc
    }

    #[test]
    fn snapshot_clears_selection_and_names_by_time() {
        let doc = doc_with_layers();
        assert!(doc.selected.is_some());
        let t = Template::snapshot(&doc, 1_709_210_096_000);
        assert_eq!(t.name, "template-20240229123456");
        assert_eq!(t.created_at, 1_709_210_096_000);
        assert!(t.state.selected.is_none());
        assert_eq!(t.state.layers, doc.layers);
        assert_eq!(t.file_name(), "template-20240229123456.json");
    }

    #[test]
    fn load_state_substitutes_defaults() {
        let doc = load_state(&json!({
            "canvasBackgroundColor": "",
            "width": "720",
            "height": -4,
            "layers": [
                {"id": "a", "type": "shape", "x": 10, "y": 20, "width": 30, "height": 40},
                {"id": "b", "type": "hologram"},
                {"id": "a", "type": "text"},
                42
            ],
            "selectedId": "a"
        }))
        .unwrap();
        assert_eq!(doc.background_color, DEFAULT_BACKGROUND);
        assert_eq!(doc.background_image, None);
        assert_eq!((doc.width, doc.height), (720, DEFAULT_HEIGHT));
        assert_eq!(doc.aspect_ratio_label, DEFAULT_ASPECT_LABEL);
        assert_eq!(doc.layers.len(), 1);
        assert_eq!(doc.layers[0].frame.width, 30.0);
        assert!(doc.selected.is_none());
    }

    #[test]
    fn load_state_rejects_non_array_layers() {
        for bad in [json!({"layers": {}}), json!({"layers": "x"}), json!({}), json!([1])] {
            let err = load_state(&bad).unwrap_err();
            assert!(matches!(err, CoverError::Validation(_)), "{bad}");
        }
    }

    #[test]
    fn document_json_accepts_bare_state_or_template() {
        let doc = doc_with_layers();
        let bare = serde_json::to_string(&doc).unwrap();
        assert_eq!(load_document_json(&bare).unwrap().layers, doc.layers);

        let t = Template::snapshot(&doc, 0).to_json_pretty().unwrap();
        assert_eq!(load_document_json(&t).unwrap().layers, doc.layers);
    }

    #[test]
    fn import_marks_name_and_resets_identity() {
        let t = Template::snapshot(&doc_with_layers(), 5);
        let text = t.to_json_pretty().unwrap();
        let imported = Template::import_json(&text, 99).unwrap();
        assert_ne!(imported.id, t.id);
        assert_eq!(imported.name, format!("{} (Imported)", t.name));
        assert_eq!(imported.created_at, 99);
        assert_eq!(imported.state, t.state);

        let unnamed = Template::import_json(r#"{"state":{"layers":[]}}"#, 1).unwrap();
        assert_eq!(unnamed.name, "Imported Template");
    }

    #[test]
    fn import_requires_layer_array() {
        for bad in [r#"{"name":"x"}"#, r#"{"state":{"layers":3}}"#, "not json"] {
            assert!(Template::import_json(bad, 0).is_err(), "{bad}");
        }
    }

    #[test]
    fn library_is_newest_first_with_rename_and_delete() {
        let mut lib = TemplateLibrary::open(MemoryStore::default()).unwrap();
        let doc = doc_with_layers();
        let first = lib.save_snapshot(&doc, 1_000).unwrap().id.clone();
        let second = lib.save_snapshot(&doc, 2_000).unwrap().id.clone();
        assert_eq!(lib.templates()[0].id, second);
        assert_eq!(lib.templates()[1].id, first);

        assert!(lib.rename(&first, "Launch").unwrap());
        assert_eq!(lib.get(&first).unwrap().name, "Launch");
        assert!(!lib.rename("nope", "x").unwrap());

        assert!(lib.delete(&second).unwrap());
        assert!(!lib.delete(&second).unwrap());
        assert_eq!(lib.templates().len(), 1);
        assert_eq!(lib.store().saved().len(), 1);
    }

    #[test]
    fn quota_failure_leaves_library_unchanged() {
        let store = MemoryStore::default().with_quota_bytes(64);
        let mut lib = TemplateLibrary::open(store).unwrap();
        let err = lib.save_snapshot(&doc_with_layers(), 0).unwrap_err();
        assert!(matches!(err, CoverError::Storage(_)));
        assert!(err.to_string().contains("quota exceeded"));
        assert!(lib.templates().is_empty());
    }
}
