//! vello_cpu rasterizer for a whole document.
//!
//! Each visible layer is drawn into its own surface in device pixels (content plus shadow margin),
//! then placed onto the canvas as an image paint under the layer's rotation and opacity. Unrotated
//! layers land on whole-pixel offsets so their pixels are copied rather than resampled.

use std::{collections::HashMap, path::PathBuf, sync::Arc};

use kurbo::{ParamCurve, PathSeg, Shape};

use super::{
    RasterFrame, Rasterizer,
    assets::{AssetLoader, DecodedImage, ImageAsset, rasterize_svg},
    blur::{gaussian_blur_premul, radius_for_sigma},
    composite::over_in_place,
    text::{TextEngine, TextStyle, parse_font_weight},
};
use crate::{
    color::{ColorDef, TRANSPARENT, parse_color_or_transparent},
    config::EditorConfig,
    document::Document,
    foundation::{
        core::{Affine, BezPath, Point, Rect, Vec2},
        error::{CoverError, CoverResult},
    },
    geometry::percent_to_pixels,
    layer::{ImageProps, Layer, LayerKind, ObjectFit, ShapeKind, ShapeProps, TextProps},
};

const BOX_SHADOW_OFFSET_Y: f64 = 4.0;
const TEXT_SHADOW_OFFSET_Y: f64 = 2.0;
const MAX_SVG_RASTER_DIM: u32 = 16_384;
const PATH_TOLERANCE: f64 = 0.1;

pub struct CpuRasterizer {
    assets: AssetLoader,
    text: TextEngine,
    image_cache: HashMap<String, vello_cpu::Image>,
    svg_cache: HashMap<(String, u32, u32), vello_cpu::Image>,
    warned_no_fonts: bool,
}

/// A layer drawn into its own surface, plus where that surface goes on the canvas.
struct LayerSurface {
    pixmap: vello_cpu::Pixmap,
    placement: Affine,
}

/// Surface size, where the layer box's top-left sits inside it, and where the surface sits on the
/// canvas.
#[derive(Clone, Copy, Debug, PartialEq)]
struct SurfaceGeometry {
    width: u16,
    height: u16,
    content_origin: Point,
    placement: Affine,
}

impl CpuRasterizer {
    pub fn new(assets_root: Option<PathBuf>) -> Self {
        Self {
            assets: AssetLoader::new(assets_root),
            text: TextEngine::new(),
            image_cache: HashMap::new(),
            svg_cache: HashMap::new(),
            warned_no_fonts: false,
        }
    }

    /// Rasterizer rooted at the configured assets directory, with every font in `fontsDir`
    /// registered.
    pub fn from_config(cfg: &EditorConfig) -> CoverResult<Self> {
        let mut r = Self::new(cfg.assets_root.clone());
        if let Some(dir) = &cfg.fonts_dir {
            let n = r.text.register_fonts_dir(dir)?;
            tracing::info!(fonts = n, dir = %dir.display(), "registered fonts");
        }
        Ok(r)
    }

    pub fn text_engine_mut(&mut self) -> &mut TextEngine {
        &mut self.text
    }

    fn render_document(&mut self, doc: &Document, scale: u32) -> CoverResult<RasterFrame> {
        let s = f64::from(scale);
        let width = doc
            .width
            .checked_mul(scale)
            .ok_or_else(|| CoverError::render("canvas size overflow"))?;
        let height = doc
            .height
            .checked_mul(scale)
            .ok_or_else(|| CoverError::render("canvas size overflow"))?;
        let w16 = to_u16(width, "canvas width")?;
        let h16 = to_u16(height, "canvas height")?;
        let canvas = Rect::new(0.0, 0.0, f64::from(width), f64::from(height));

        let mut ctx = vello_cpu::RenderContext::new(w16, h16);
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

        if !doc.background_color.trim().eq_ignore_ascii_case(TRANSPARENT) {
            let bg = parse_color_or_transparent(&doc.background_color);
            if !bg.is_transparent() {
                ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
                ctx.set_paint(cpu_color(bg));
                ctx.fill_rect(&rect_to_cpu(canvas));
            }
        }

        if let Some(src) = doc.background_image.as_deref().filter(|s| !s.trim().is_empty()) {
            self.draw_image_fitted(&mut ctx, src, ObjectFit::Cover, canvas)?;
        }

        for layer in doc.layers.iter().filter(|l| l.visible && l.opacity > 0.0) {
            let Some(surface) = self.render_layer(layer, doc, s, canvas)? else {
                continue;
            };
            let (pw, ph) = (
                f64::from(surface.pixmap.width()),
                f64::from(surface.pixmap.height()),
            );
            let paint = pixmap_paint(surface.pixmap);
            let opacity = (layer.opacity / 100.0).clamp(0.0, 1.0) as f32;

            ctx.set_transform(affine_to_cpu(surface.placement));
            ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_paint(paint);
            if opacity < 1.0 {
                ctx.push_opacity_layer(opacity);
            }
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, pw, ph));
            if opacity < 1.0 {
                ctx.pop_layer();
            }
        }

        let pixmap = finish(&mut ctx, w16, h16);
        Ok(RasterFrame {
            width,
            height,
            scale,
            data: pixmap.data_as_u8_slice().to_vec(),
        })
    }

    #[tracing::instrument(skip_all, fields(layer = %layer.id))]
    fn render_layer(
        &mut self,
        layer: &Layer,
        doc: &Document,
        s: f64,
        canvas: Rect,
    ) -> CoverResult<Option<LayerSurface>> {
        let px = percent_to_pixels(&layer.frame, f64::from(doc.width), f64::from(doc.height));
        let bounds = Rect::new(px.left * s, px.top * s, (px.left + px.width) * s, (px.top + px.height) * s);
        if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
            return Ok(None);
        }

        match &layer.kind {
            LayerKind::Shape(p) => self.render_shape(p, bounds, layer.rotation, s, canvas),
            LayerKind::Text(p) => self.render_text(p, bounds, layer.rotation, s, canvas),
            LayerKind::Image(p) => self.render_image(p, bounds, layer.rotation, canvas),
        }
    }

    fn render_shape(
        &mut self,
        p: &ShapeProps,
        bounds: Rect,
        rotation: f64,
        s: f64,
        canvas: Rect,
    ) -> CoverResult<Option<LayerSurface>> {
        let fill = parse_color_or_transparent(&p.background_color);
        let border_color = parse_color_or_transparent(&p.border_color);
        let shadow_color = parse_color_or_transparent(&p.box_shadow_color);
        let shadow_on = p.box_shadow_enabled && !shadow_color.is_transparent();
        let sigma = if shadow_on { (p.box_shadow_blur.max(0.0) / 2.0 * s) as f32 } else { 0.0 };
        let offset_y = BOX_SHADOW_OFFSET_Y * s;
        let margin = if shadow_on {
            f64::from(radius_for_sigma(sigma)) + offset_y
        } else {
            0.0
        };

        let Some(geo) = surface_geometry(bounds, rotation, margin, canvas)? else {
            return Ok(None);
        };
        let local = Rect::from_origin_size(geo.content_origin, bounds.size());
        let radius = p.border_radius.max(0.0) * s;
        let outline = shape_outline(p.shape_type, local, radius);

        let mut ctx = vello_cpu::RenderContext::new(geo.width, geo.height);
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        if !fill.is_transparent() {
            ctx.set_paint(cpu_color(fill));
            ctx.fill_path(&bezpath_to_cpu(&outline));
        }
        let border = (p.border_width.max(0.0) * s).min(local.width().min(local.height()) / 2.0);
        if border > 0.0 && !border_color.is_transparent() {
            let inner = shape_outline(
                p.shape_type,
                local.inset(-border),
                (radius - border).max(0.0),
            );
            let mut ring = outline.clone();
            ring.extend(reversed(&inner));
            ctx.set_paint(cpu_color(border_color));
            ctx.fill_path(&bezpath_to_cpu(&ring));
        }
        let mut body = finish(&mut ctx, geo.width, geo.height);

        if shadow_on {
            let mut shadow = silhouette(
                &(Affine::translate((0.0, offset_y)) * outline.clone()),
                shadow_color,
                geo.width,
                geo.height,
            );
            blur_pixmap(&mut shadow, sigma)?;

            // A box shadow is only visible outside the border box.
            let mask = silhouette(&outline, ColorDef::rgba(1.0, 1.0, 1.0, 1.0), geo.width, geo.height);
            for (px, m) in shadow
                .data_as_u8_slice_mut()
                .chunks_exact_mut(4)
                .zip(mask.data_as_u8_slice().chunks_exact(4))
            {
                let keep = 255 - u16::from(m[3]);
                for c in px.iter_mut() {
                    *c = ((u16::from(*c) * keep + 127) / 255) as u8;
                }
            }

            over_in_place(shadow.data_as_u8_slice_mut(), body.data_as_u8_slice(), 1.0)?;
            body = shadow;
        }

        Ok(Some(LayerSurface {
            pixmap: body,
            placement: geo.placement,
        }))
    }

    fn render_text(
        &mut self,
        p: &TextProps,
        bounds: Rect,
        rotation: f64,
        s: f64,
        canvas: Rect,
    ) -> CoverResult<Option<LayerSurface>> {
        // Text is clipped to its box, shadow included, so the surface needs no margin.
        let Some(geo) = surface_geometry(bounds, rotation, 0.0, canvas)? else {
            return Ok(None);
        };
        let local = Rect::from_origin_size(geo.content_origin, bounds.size());
        let pad = p.padding.max(0.0) * s;
        let text_width = (local.width() - 2.0 * pad).max(0.0);

        let style = TextStyle {
            font_family: p.font_family.clone(),
            font_weight: parse_font_weight(&p.font_weight),
            font_size_px: (p.font_size * s) as f32,
            letter_spacing_px: (p.letter_spacing * s) as f32,
            line_height: p.line_height as f32,
            align: p.text_align,
        };
        let layout = if p.text.is_empty() || style.font_size_px <= 0.0 {
            None
        } else {
            let layout = self.text.layout(&p.text, &style, Some(text_width as f32))?;
            if layout.is_none() && !self.warned_no_fonts {
                tracing::warn!("no fonts registered, text glyphs are skipped");
                self.warned_no_fonts = true;
            }
            layout
        };
        let text_height = layout.as_ref().map_or(0.0, |l| f64::from(l.height()));

        // The text block (text plus padding) spans the full box width and is vertically centered.
        let block_h = text_height + 2.0 * pad;
        let block = Rect::new(
            local.x0,
            local.y0 + (local.height() - block_h) / 2.0,
            local.x1,
            local.y0 + (local.height() + block_h) / 2.0,
        );
        let origin = (block.x0 + pad, block.y0 + pad);

        let mut ctx = vello_cpu::RenderContext::new(geo.width, geo.height);
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        let bg = parse_color_or_transparent(&p.background_color);
        if !bg.is_transparent() {
            let radius = p.border_radius.max(0.0) * s;
            ctx.set_paint(cpu_color(bg));
            ctx.fill_path(&bezpath_to_cpu(&shape_outline(ShapeKind::Rectangle, block, radius)));
        }
        let mut base = finish(&mut ctx, geo.width, geo.height);

        if let Some(layout) = &layout {
            let shadow_color = parse_color_or_transparent(&p.text_shadow_color);
            if p.text_shadow_enabled && !shadow_color.is_transparent() {
                let mut ctx = vello_cpu::RenderContext::new(geo.width, geo.height);
                self.text.draw_layout(
                    &mut ctx,
                    layout,
                    (origin.0, origin.1 + TEXT_SHADOW_OFFSET_Y * s),
                    shadow_color.to_rgba8(),
                );
                let mut shadow = finish(&mut ctx, geo.width, geo.height);
                blur_pixmap(&mut shadow, (p.text_shadow_blur.max(0.0) / 2.0 * s) as f32)?;
                over_in_place(base.data_as_u8_slice_mut(), shadow.data_as_u8_slice(), 1.0)?;
            }

            let color = parse_color_or_transparent(&p.color);
            let mut ctx = vello_cpu::RenderContext::new(geo.width, geo.height);
            self.text.draw_layout(&mut ctx, layout, origin, color.to_rgba8());
            let glyphs = finish(&mut ctx, geo.width, geo.height);
            over_in_place(base.data_as_u8_slice_mut(), glyphs.data_as_u8_slice(), 1.0)?;
        }

        Ok(Some(LayerSurface {
            pixmap: base,
            placement: geo.placement,
        }))
    }

    fn render_image(
        &mut self,
        p: &ImageProps,
        bounds: Rect,
        rotation: f64,
        canvas: Rect,
    ) -> CoverResult<Option<LayerSurface>> {
        if p.src.trim().is_empty() {
            return Ok(None);
        }
        let Some(geo) = surface_geometry(bounds, rotation, 0.0, canvas)? else {
            return Ok(None);
        };
        let local = Rect::from_origin_size(geo.content_origin, bounds.size());

        let mut ctx = vello_cpu::RenderContext::new(geo.width, geo.height);
        self.draw_image_fitted(&mut ctx, &p.src, p.object_fit, local)?;
        Ok(Some(LayerSurface {
            pixmap: finish(&mut ctx, geo.width, geo.height),
            placement: geo.placement,
        }))
    }

    /// Draw the image at `src` into `target` with the given fit. Overflow beyond the surface is
    /// clipped by the surface itself.
    fn draw_image_fitted(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        src: &str,
        fit: ObjectFit,
        target: Rect,
    ) -> CoverResult<()> {
        let asset = self.assets.load(src)?;
        let (iw, ih) = asset.intrinsic_size();
        if iw <= 0.0 || ih <= 0.0 {
            return Ok(());
        }
        let dest = fit_rect(fit, iw, ih, target);
        if dest.width() <= 0.0 || dest.height() <= 0.0 {
            return Ok(());
        }

        let paint = match asset {
            ImageAsset::Raster(img) => self.raster_paint(src, &img)?,
            ImageAsset::Svg(tree) => {
                let w = (dest.width().ceil() as u32).clamp(1, MAX_SVG_RASTER_DIM);
                let h = (dest.height().ceil() as u32).clamp(1, MAX_SVG_RASTER_DIM);
                let key = (src.to_string(), w, h);
                match self.svg_cache.get(&key) {
                    Some(paint) => paint.clone(),
                    None => {
                        let img = rasterize_svg(&tree, w, h)?;
                        let paint = pixmap_paint(premul_bytes_to_pixmap(&img)?);
                        self.svg_cache.insert(key, paint.clone());
                        paint
                    }
                }
            }
        };
        let (pw, ph) = image_paint_size(&paint)?;

        ctx.set_transform(affine_to_cpu(
            Affine::translate(dest.origin().to_vec2())
                * Affine::scale_non_uniform(dest.width() / pw, dest.height() / ph),
        ));
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(paint);
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, pw, ph));
        Ok(())
    }

    fn raster_paint(&mut self, src: &str, img: &DecodedImage) -> CoverResult<vello_cpu::Image> {
        if let Some(paint) = self.image_cache.get(src) {
            return Ok(paint.clone());
        }
        let paint = pixmap_paint(premul_bytes_to_pixmap(img)?);
        self.image_cache.insert(src.to_string(), paint.clone());
        Ok(paint)
    }
}

impl Rasterizer for CpuRasterizer {
    fn rasterize(&mut self, doc: &Document, scale: u32) -> CoverResult<RasterFrame> {
        if scale == 0 {
            return Err(CoverError::render("raster scale must be > 0"));
        }
        let _span = tracing::info_span!("rasterize", w = doc.width, h = doc.height, scale).entered();
        self.render_document(doc, scale)
    }
}

/// Where `fit` places an `iw` x `ih` image inside `target`.
pub fn fit_rect(fit: ObjectFit, iw: f64, ih: f64, target: Rect) -> Rect {
    let (tw, th) = (target.width(), target.height());
    let (w, h) = match fit {
        ObjectFit::Fill => (tw, th),
        ObjectFit::Contain => {
            let k = (tw / iw).min(th / ih);
            (iw * k, ih * k)
        }
        ObjectFit::Cover => {
            let k = (tw / iw).max(th / ih);
            (iw * k, ih * k)
        }
    };
    let c = target.center();
    Rect::from_center_size(c, (w, h))
}

fn surface_geometry(
    bounds: Rect,
    rotation: f64,
    margin: f64,
    canvas: Rect,
) -> CoverResult<Option<SurfaceGeometry>> {
    let margin = margin.max(0.0).ceil();
    if rotation.rem_euclid(360.0) == 0.0 {
        // Clip to the canvas, keeping a margin so blurred edges near the border stay intact.
        let outer = bounds.inflate(margin, margin);
        let x0 = outer.x0.floor().max(canvas.x0 - margin);
        let y0 = outer.y0.floor().max(canvas.y0 - margin);
        let x1 = outer.x1.ceil().min(canvas.x1 + margin);
        let y1 = outer.y1.ceil().min(canvas.y1 + margin);
        if x1 <= x0 || y1 <= y0 {
            return Ok(None);
        }
        return Ok(Some(SurfaceGeometry {
            width: surface_dim(x1 - x0, "layer surface width")?,
            height: surface_dim(y1 - y0, "layer surface height")?,
            content_origin: Point::new(bounds.x0 - x0, bounds.y0 - y0),
            placement: Affine::translate((x0, y0)),
        }));
    }

    // Rotated: work in the box's own frame (origin at its center) and keep only the part of the
    // box that can land on the canvas.
    let (hw, hh) = (bounds.width() / 2.0 + margin, bounds.height() / 2.0 + margin);
    let to_canvas = Affine::translate(bounds.center().to_vec2()) * Affine::rotate(rotation.to_radians());
    let visible = to_canvas.inverse().transform_rect_bbox(canvas.inflate(margin, margin));
    let x0 = visible.x0.max(-hw).floor();
    let y0 = visible.y0.max(-hh).floor();
    let x1 = visible.x1.min(hw).ceil();
    let y1 = visible.y1.min(hh).ceil();
    if x1 <= x0 || y1 <= y0 {
        return Ok(None);
    }
    Ok(Some(SurfaceGeometry {
        width: surface_dim(x1 - x0, "layer surface width")?,
        height: surface_dim(y1 - y0, "layer surface height")?,
        content_origin: Point::new(-bounds.width() / 2.0 - x0, -bounds.height() / 2.0 - y0),
        placement: to_canvas * Affine::translate(Vec2::new(x0, y0)),
    }))
}

fn surface_dim(v: f64, what: &str) -> CoverResult<u16> {
    let n = v.ceil().max(1.0);
    if n > f64::from(u16::MAX) {
        return Err(CoverError::render(format!("{what} exceeds u16")));
    }
    Ok(n as u16)
}

fn to_u16(v: u32, what: &str) -> CoverResult<u16> {
    v.try_into()
        .map_err(|_| CoverError::render(format!("{what} exceeds u16")))
}

/// Rounded rectangle (radius clamped to half the shorter side) or the inscribed ellipse.
fn shape_outline(kind: ShapeKind, rect: Rect, radius: f64) -> BezPath {
    match kind {
        ShapeKind::Rectangle => {
            let r = radius.min(rect.width().min(rect.height()) / 2.0).max(0.0);
            kurbo::RoundedRect::from_rect(rect, r).to_path(PATH_TOLERANCE)
        }
        ShapeKind::Circle => kurbo::Ellipse::from_rect(rect).to_path(PATH_TOLERANCE),
    }
}

/// Single closed subpath traversed in the opposite direction, so that filling it together with
/// an enclosing path under the non-zero rule cuts a hole.
fn reversed(path: &BezPath) -> BezPath {
    let segs: Vec<PathSeg> = path.segments().collect();
    let mut out = BezPath::new();
    let Some(last) = segs.last() else {
        return out;
    };
    out.move_to(last.end());
    for seg in segs.iter().rev() {
        match seg.reverse() {
            PathSeg::Line(l) => out.line_to(l.p1),
            PathSeg::Quad(q) => out.quad_to(q.p1, q.p2),
            PathSeg::Cubic(c) => out.curve_to(c.p1, c.p2, c.p3),
        }
    }
    out.close_path();
    out
}

fn silhouette(path: &BezPath, color: ColorDef, w: u16, h: u16) -> vello_cpu::Pixmap {
    let mut ctx = vello_cpu::RenderContext::new(w, h);
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_paint(cpu_color(color));
    ctx.fill_path(&bezpath_to_cpu(path));
    finish(&mut ctx, w, h)
}

fn blur_pixmap(pixmap: &mut vello_cpu::Pixmap, sigma: f32) -> CoverResult<()> {
    let (w, h) = (u32::from(pixmap.width()), u32::from(pixmap.height()));
    let blurred = gaussian_blur_premul(pixmap.data_as_u8_slice(), w, h, sigma)?;
    pixmap.data_as_u8_slice_mut().copy_from_slice(&blurred);
    Ok(())
}

fn finish(ctx: &mut vello_cpu::RenderContext, w: u16, h: u16) -> vello_cpu::Pixmap {
    let mut pixmap = vello_cpu::Pixmap::new(w, h);
    ctx.flush();
    ctx.render_to_pixmap(&mut pixmap);
    pixmap
}

fn cpu_color(c: ColorDef) -> vello_cpu::peniko::Color {
    let [r, g, b, a] = c.to_rgba8();
    vello_cpu::peniko::Color::from_rgba8(r, g, b, a)
}

fn pixmap_paint(pixmap: vello_cpu::Pixmap) -> vello_cpu::Image {
    vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    }
}

fn image_paint_size(image: &vello_cpu::Image) -> CoverResult<(f64, f64)> {
    match &image.image {
        vello_cpu::ImageSource::Pixmap(p) => Ok((f64::from(p.width()), f64::from(p.height()))),
        vello_cpu::ImageSource::OpaqueId(_) => Err(CoverError::render(
            "cpu rasterizer does not support opaque image ids",
        )),
    }
}

fn premul_bytes_to_pixmap(img: &DecodedImage) -> CoverResult<vello_cpu::Pixmap> {
    let w = to_u16(img.width, "image width")?;
    let h = to_u16(img.height, "image height")?;
    if img.rgba8_premul.len() != img.width as usize * img.height as usize * 4 {
        return Err(CoverError::render("decoded image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let pixels = img
        .rgba8_premul
        .chunks_exact(4)
        .map(|px| {
            may_have_opacities |= px[3] != 255;
            vello_cpu::peniko::color::PremulRgba8 {
                r: px[0],
                g: px[1],
                b: px[2],
                a: px[3],
            }
        })
        .collect();
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

fn rect_to_cpu(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}
