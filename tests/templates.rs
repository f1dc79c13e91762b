use std::path::PathBuf;

use coverkit::{
    CoverError, Document, EditorSession, JsonFileStore, LayerKindTag, LayerPatch, Template,
    TemplateLibrary,
};

fn scratch(name: &str) -> PathBuf {
    let dir = PathBuf::from("target").join("template_tests").join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn busy_session() -> EditorSession {
    let mut s = EditorSession::default();
    s.add_layer(LayerKindTag::Text, &LayerPatch::default());
    let id = s.add_layer(LayerKindTag::Shape, &LayerPatch::center(20.0, 30.0));
    s.set_background_color("#0b1020");
    s.select(Some(&id));
    s
}

#[test]
fn non_array_layers_leave_the_document_byte_for_byte_unchanged() {
    let mut s = busy_session();
    let before = serde_json::to_string(s.document()).unwrap();

    for bad in [
        r#"{"id":"t","name":"bad","createdAt":1,"state":{"width":10,"height":10,"layers":{"0":{}}}}"#,
        r##"{"canvasBackgroundColor":"#000","layers":null}"##,
        r#"{"state":{"layers":"[]"}}"#,
    ] {
        let err = s.load_json(bad).unwrap_err();
        assert!(matches!(err, CoverError::Validation(_)), "{bad}: {err}");
        assert_eq!(serde_json::to_string(s.document()).unwrap(), before);
    }
}

#[test]
fn exported_template_imports_back() {
    let s = busy_session();
    let t = s.snapshot_template(1_700_000_000_000);
    let text = t.to_json_pretty().unwrap();
    let v: serde_json::Value = serde_json::from_str(&text).unwrap();
    for key in ["id", "name", "createdAt", "state"] {
        assert!(v.get(key).is_some(), "{key}");
    }
    assert!(v["state"]["selectedId"].is_null());

    let imported = Template::import_json(&text, 5).unwrap();
    assert_eq!(imported.name, format!("{} (Imported)", t.name));
    assert_eq!(imported.state.layers, s.document().layers);
    assert_eq!(imported.state.background_color, "#0b1020");
}

#[test]
fn file_store_persists_newest_first() {
    let dir = scratch("persist");
    let path = dir.join("templates.json");
    let doc = busy_session().document().clone();

    let (a, b) = {
        let mut lib = TemplateLibrary::open(JsonFileStore::new(&path)).unwrap();
        let a = lib.save_snapshot(&doc, 1_000).unwrap().id.clone();
        let b = lib.save_snapshot(&Document::default(), 2_000).unwrap().id.clone();
        lib.rename(&a, "hero").unwrap();
        (a, b)
    };

    let lib = TemplateLibrary::open(JsonFileStore::new(&path)).unwrap();
    let ids: Vec<_> = lib.templates().iter().map(|t| t.id.clone()).collect();
    assert_eq!(ids, vec![b, a.clone()]);
    let hero = lib.get(&a).unwrap();
    assert_eq!(hero.name, "hero");
    assert_eq!(hero.state.layers, doc.layers);
    assert!(hero.state.selected.is_none());
}

#[test]
fn file_store_quota_keeps_memory_and_disk() {
    let dir = scratch("quota");
    let path = dir.join("templates.json");
    let doc = busy_session().document().clone();

    let mut lib = TemplateLibrary::open(JsonFileStore::new(&path).with_quota_bytes(4_096)).unwrap();
    lib.save_snapshot(&Document::default(), 1).unwrap();
    let on_disk = std::fs::read(&path).unwrap();

    let mut big = doc.clone();
    big.set_background_image(Some(format!("data:image/png;base64,{}", "A".repeat(8_192))));
    let err = lib.save_snapshot(&big, 2).unwrap_err();
    assert!(matches!(err, CoverError::Storage(_)));
    assert_eq!(lib.templates().len(), 1);
    assert_eq!(std::fs::read(&path).unwrap(), on_disk);
}

#[test]
fn partial_state_gets_defaults() {
    let mut s = EditorSession::default();
    s.load_json(
        r#"{"width":"1440","height":0,"layers":[{"type":"image","src":"logo.png"},{"type":"?"}]}"#,
    )
    .unwrap();
    let doc = s.document();
    assert_eq!((doc.width, doc.height), (1440, 1920));
    assert_eq!(doc.background_color, "#ffffff");
    assert_eq!(doc.layers.len(), 1);
    assert_eq!(doc.layers[0].tag(), LayerKindTag::Image);
    assert_eq!(doc.layers[0].frame.width, 50.0);
}

#[test]
fn loaded_layers_are_brought_back_into_range() {
    let doc = coverkit::template::load_document_json(
        r#"{"width":100,"height":100,"layers":[
            {"id":"a","type":"shape","x":50,"y":50,"width":0,"height":-5,"rotation":400,"opacity":250}
        ]}"#,
    )
    .unwrap();
    let layer = &doc.layers[0];
    assert_eq!((layer.frame.width, layer.frame.height), (1.0, 1.0));
    assert_eq!(layer.rotation, 40.0);
    assert_eq!(layer.opacity, 100.0);

    let rendered = coverkit::Rect::new(0.0, 0.0, 100.0, 100.0);
    assert_eq!(
        coverkit::hit_test(&doc, coverkit::Point::new(50.0, 50.0), rendered),
        coverkit::HitTarget::Body(layer.id.clone())
    );
}
