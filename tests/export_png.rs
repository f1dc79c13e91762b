use std::io::Cursor;

use coverkit::{
    CpuRasterizer, Document, EditorConfig, EditorSession, ExportOpts, LayerKindTag, LayerPatch,
    PercentBox,
};

fn one_shape_doc(background: &str) -> Document {
    let mut doc = Document::new(40, 30).unwrap();
    doc.set_background_color(background);
    doc.add_layer(
        LayerKindTag::Shape,
        &LayerPatch {
            background_color: Some("#f97316".into()),
            border_radius: Some(0.0),
            box_shadow_enabled: Some(false),
            ..LayerPatch::frame(PercentBox::new(50.0, 50.0, 50.0, 50.0))
        },
    );
    doc
}

fn export(doc: Document, oversample: u32) -> (String, image::RgbaImage) {
    let cfg = EditorConfig::default().with_export(ExportOpts::default().with_oversample(oversample));
    let mut session = EditorSession::with_document(doc, cfg);
    let art = session
        .export_now(&mut CpuRasterizer::new(None), 1_234)
        .unwrap();
    let img = image::load(Cursor::new(&art.png_bytes), image::ImageFormat::Png)
        .unwrap()
        .to_rgba8();
    (art.file_name, img)
}

fn assert_close(got: [u8; 4], want: [u8; 4]) {
    for (g, w) in got.iter().zip(want) {
        assert!(g.abs_diff(w) <= 1, "{got:?} vs {want:?}");
    }
}

const CORNERS: [(u32, u32); 4] = [(0, 0), (39, 0), (0, 29), (39, 29)];

#[test]
fn transparent_background_keeps_corners_clear() {
    let (name, img) = export(one_shape_doc("transparent"), 2);
    assert_eq!(name, "cover-40x30-1234.png");
    assert_eq!(img.dimensions(), (40, 30));
    for (x, y) in CORNERS {
        assert_eq!(img.get_pixel(x, y).0[3], 0, "corner {x},{y}");
    }
    assert_close(img.get_pixel(20, 15).0, [0xf9, 0x73, 0x16, 255]);
}

#[test]
fn opaque_background_fills_corners() {
    for oversample in [1, 2, 3] {
        let (_, img) = export(one_shape_doc("#123456"), oversample);
        assert_eq!(img.dimensions(), (40, 30));
        for (x, y) in CORNERS {
            assert_eq!(img.get_pixel(x, y).0, [0x12, 0x34, 0x56, 255], "x{oversample}");
        }
        assert_close(img.get_pixel(20, 15).0, [0xf9, 0x73, 0x16, 255]);
    }
}

#[test]
fn half_opacity_layer_blends_with_background() {
    let mut doc = one_shape_doc("#000000");
    let id = doc.layers[0].id.clone();
    doc.update_layer(
        &id,
        &LayerPatch {
            opacity: Some(50.0),
            background_color: Some("#ffffff".into()),
            ..LayerPatch::default()
        },
    );
    let (_, img) = export(doc, 1);
    let [r, g, b, a] = img.get_pixel(20, 15).0;
    assert_eq!(a, 255);
    for c in [r, g, b] {
        assert!((127..=129).contains(&c), "{c}");
    }
}

#[test]
fn hidden_and_empty_image_layers_draw_nothing() {
    let mut doc = Document::new(16, 16).unwrap();
    doc.set_background_color("transparent");
    doc.add_layer(LayerKindTag::Image, &LayerPatch::default());
    let id = doc.add_layer(LayerKindTag::Shape, &LayerPatch::default());
    doc.update_layer(
        &id,
        &LayerPatch {
            visible: Some(false),
            ..LayerPatch::default()
        },
    );
    let (_, img) = export(doc, 2);
    assert!(img.pixels().all(|p| p.0[3] == 0));
}

#[test]
fn box_shadow_darkens_below_the_shape() {
    let mut doc = Document::new(60, 60).unwrap();
    doc.set_background_color("#ffffff");
    doc.add_layer(
        LayerKindTag::Shape,
        &LayerPatch {
            border_radius: Some(0.0),
            box_shadow_blur: Some(4.0),
            box_shadow_color: Some("rgba(0,0,0,1)".into()),
            ..LayerPatch::frame(PercentBox::new(50.0, 40.0, 50.0, 30.0))
        },
    );
    let (_, img) = export(doc, 1);
    // the shape spans y 15..33; the shadow is offset 4px down
    let below = img.get_pixel(30, 35).0;
    assert!(below[0] < 250, "{below:?}");
    assert_eq!(img.get_pixel(2, 2).0, [255, 255, 255, 255]);
}

#[test]
fn data_url_background_image_is_cover_fitted() {
    let svg = "<svg xmlns='http://www.w3.org/2000/svg' width='10' height='10'>\
               <rect width='10' height='10' fill='#00ff00'/></svg>";
    let mut doc = Document::new(20, 10).unwrap();
    doc.set_background_color("#ff0000");
    doc.set_background_image(Some(format!(
        "data:image/svg+xml,{}",
        svg.replace('<', "%3C").replace('>', "%3E").replace('#', "%23")
    )));
    let (_, img) = export(doc, 1);
    for (x, y) in [(0, 0), (19, 9), (10, 5)] {
        assert_close(img.get_pixel(x, y).0, [0, 255, 0, 255]);
    }
}

#[test]
fn unreadable_image_fails_without_touching_layers() {
    let mut doc = Document::new(10, 10).unwrap();
    doc.add_layer(
        LayerKindTag::Image,
        &LayerPatch {
            src: Some("https://cdn.example.com/a.png".into()),
            ..LayerPatch::default()
        },
    );
    let layers = doc.layers.clone();
    let mut session = EditorSession::with_document(doc, EditorConfig::default());
    let err = session
        .export_now(&mut CpuRasterizer::new(None), 0)
        .unwrap_err();
    assert!(matches!(err, coverkit::CoverError::Resource(_)));
    assert_eq!(session.document().layers, layers);
    assert!(session.document().selected.is_none());
    // the guard was released
    assert!(session.request_export().is_ok());
}

#[test]
fn rotated_bleed_layer_exports_like_its_visible_part() {
    let mut doc = Document::new(200, 100).unwrap();
    doc.set_background_color("#ffffff");
    doc.add_layer(
        LayerKindTag::Shape,
        &LayerPatch {
            background_color: Some("#0000ff".into()),
            border_radius: Some(0.0),
            box_shadow_enabled: Some(false),
            rotation: Some(45.0),
            ..LayerPatch::frame(PercentBox::new(50.0, 50.0, 4000.0, 5.0))
        },
    );
    let (_, img) = export(doc, 2);
    assert_eq!(img.dimensions(), (200, 100));
    // the bar runs down-right through the center
    for (x, y) in [(100, 50), (50, 0), (149, 99)] {
        assert_close(img.get_pixel(x, y).0, [0, 0, 255, 255]);
    }
    for (x, y) in [(0, 0), (199, 0), (0, 99), (199, 99)] {
        assert_eq!(img.get_pixel(x, y).0, [255, 255, 255, 255], "{x},{y}");
    }
}
