//! Font registry and text layout on top of parley, with glyph drawing into vello_cpu.

use std::{collections::HashMap, path::Path, sync::Arc};

use crate::{
    foundation::error::{CoverError, CoverResult},
    layer::TextAlign,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush carried through parley layouts. Drawing picks the paint explicitly, so this only
/// satisfies parley's brush bound.
pub struct TextBrushRgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Text styling resolved from a text layer, already scaled to device pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct TextStyle {
    pub font_family: String,
    pub font_weight: f32,
    pub font_size_px: f32,
    pub letter_spacing_px: f32,
    /// Multiple of the font size.
    pub line_height: f32,
    pub align: TextAlign,
}

/// Numeric CSS font weight for `"900"`, `"bold"`, `"normal"`...
pub fn parse_font_weight(s: &str) -> f32 {
    match s.trim().to_ascii_lowercase().as_str() {
        "bold" | "bolder" => 700.0,
        "normal" | "" => 400.0,
        "lighter" => 300.0,
        other => other
            .parse::<f32>()
            .ok()
            .filter(|w| w.is_finite())
            .map(|w| w.clamp(1.0, 1000.0))
            .unwrap_or(400.0),
    }
}

/// First entry of a CSS family list with quotes stripped.
pub fn primary_family(css: &str) -> &str {
    css.split(',')
        .next()
        .unwrap_or_default()
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
}

pub struct TextEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    /// Family names in registration order.
    families: Vec<String>,
    /// Raw font file bytes keyed by parley blob id.
    blobs: HashMap<u64, Arc<Vec<u8>>>,
    draw_fonts: HashMap<(u64, u32), vello_cpu::peniko::FontData>,
}

impl Default for TextEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TextEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextEngine")
            .field("families", &self.families)
            .finish_non_exhaustive()
    }
}

impl TextEngine {
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            families: Vec::new(),
            blobs: HashMap::new(),
            draw_fonts: HashMap::new(),
        }
    }

    pub fn has_fonts(&self) -> bool {
        !self.families.is_empty()
    }

    pub fn families(&self) -> &[String] {
        &self.families
    }

    /// Register a font file and return the family names it provides.
    pub fn register_font_bytes(&mut self, bytes: Vec<u8>) -> CoverResult<Vec<String>> {
        let bytes = Arc::new(bytes);
        let blob = parley::fontique::Blob::from(bytes.as_ref().clone());
        let blob_id = blob.id();
        let registered = self.font_ctx.collection.register_fonts(blob, None);
        if registered.is_empty() {
            return Err(CoverError::resource("no font faces found in font data"));
        }

        let mut names = Vec::new();
        for (family_id, _) in registered {
            let name = self
                .font_ctx
                .collection
                .family_name(family_id)
                .ok_or_else(|| CoverError::resource("registered font family has no name"))?
                .to_string();
            if !self.families.iter().any(|f| f.eq_ignore_ascii_case(&name)) {
                self.families.push(name.clone());
            }
            names.push(name);
        }
        self.blobs.insert(blob_id, bytes);
        tracing::debug!(families = ?names, "registered font");
        Ok(names)
    }

    /// Register every `.ttf`, `.otf` and `.ttc` file in `dir` (non-recursive, sorted by name).
    pub fn register_fonts_dir(&mut self, dir: &Path) -> CoverResult<usize> {
        let entries = std::fs::read_dir(dir).map_err(|e| {
            CoverError::resource(format!("read fonts dir '{}': {e}", dir.display()))
        })?;
        let mut paths: Vec<_> = entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| matches!(e.to_ascii_lowercase().as_str(), "ttf" | "otf" | "ttc"))
            })
            .collect();
        paths.sort();

        let mut count = 0;
        for path in paths {
            let bytes = std::fs::read(&path).map_err(|e| {
                CoverError::resource(format!("read font '{}': {e}", path.display()))
            })?;
            match self.register_font_bytes(bytes) {
                Ok(_) => count += 1,
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping font file"),
            }
        }
        Ok(count)
    }

    /// Registered family best matching a CSS family list: the first listed family compared
    /// case-insensitively, otherwise the first registered family.
    pub fn resolve_family(&self, css: &str) -> Option<&str> {
        let wanted = primary_family(css);
        self.families
            .iter()
            .find(|f| f.eq_ignore_ascii_case(wanted))
            .or_else(|| self.families.first())
            .map(String::as_str)
    }

    /// Shape and wrap `text`. Returns `None` when no fonts are registered.
    pub fn layout(
        &mut self,
        text: &str,
        style: &TextStyle,
        max_width_px: Option<f32>,
    ) -> CoverResult<Option<parley::Layout<TextBrushRgba8>>> {
        if !style.font_size_px.is_finite() || style.font_size_px <= 0.0 {
            return Err(CoverError::validation("font size must be finite and > 0"));
        }
        let Some(family) = self.resolve_family(&style.font_family).map(str::to_owned) else {
            return Ok(None);
        };

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(style.font_size_px));
        builder.push_default(parley::style::StyleProperty::FontWeight(
            parley::style::FontWeight::new(style.font_weight),
        ));
        builder.push_default(parley::style::StyleProperty::LetterSpacing(
            style.letter_spacing_px,
        ));
        builder.push_default(parley::style::StyleProperty::LineHeight(
            parley::style::LineHeight::FontSizeRelative(style.line_height),
        ));
        builder.push_default(parley::style::StyleProperty::Brush(TextBrushRgba8::default()));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        let alignment = match style.align {
            TextAlign::Left => parley::Alignment::Start,
            TextAlign::Center => parley::Alignment::Center,
            TextAlign::Right => parley::Alignment::End,
        };
        layout.break_all_lines(max_width_px);
        layout.align(max_width_px, alignment, parley::AlignmentOptions::default());
        Ok(Some(layout))
    }

    /// Fill every glyph of `layout` with `color`, placing the layout's top-left at `origin`.
    pub fn draw_layout(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        layout: &parley::Layout<TextBrushRgba8>,
        origin: (f64, f64),
        color: [u8; 4],
    ) {
        ctx.set_transform(vello_cpu::kurbo::Affine::translate(origin));
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
            color[0], color[1], color[2], color[3],
        ));

        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(glyph_run) = item else {
                    continue;
                };
                let run = glyph_run.run();
                let key = (run.font().data.id(), run.font().index);
                let Some(font) = self.draw_font(key) else {
                    continue;
                };

                let mut x = glyph_run.offset();
                let y = glyph_run.baseline();
                let glyphs: Vec<vello_cpu::Glyph> = glyph_run
                    .glyphs()
                    .map(|g| {
                        let glyph = vello_cpu::Glyph {
                            id: g.id,
                            x: x + g.x,
                            y: y - g.y,
                        };
                        x += g.advance;
                        glyph
                    })
                    .collect();
                ctx.glyph_run(&font)
                    .font_size(run.font_size())
                    .fill_glyphs(glyphs.into_iter());
            }
        }
    }

    fn draw_font(&mut self, key: (u64, u32)) -> Option<vello_cpu::peniko::FontData> {
        if let Some(f) = self.draw_fonts.get(&key) {
            return Some(f.clone());
        }
        let bytes = self.blobs.get(&key.0)?;
        let data = vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(bytes.as_ref().clone()),
            key.1,
        );
        self.draw_fonts.insert(key, data.clone());
        Some(data)
    }
}
