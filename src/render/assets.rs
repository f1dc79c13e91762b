//! Image sources: `data:` URLs and paths under an assets root, decoded to premultiplied RGBA8 or
//! parsed SVG trees.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;
use base64::Engine as _;

use super::composite::premultiply_in_place;
use crate::foundation::error::{CoverError, CoverResult};

/// Decoded raster image in premultiplied RGBA8.
#[derive(Clone, Debug)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgba8_premul: Arc<Vec<u8>>,
}

#[derive(Clone, Debug)]
pub enum ImageAsset {
    Raster(DecodedImage),
    Svg(Arc<usvg::Tree>),
}

impl ImageAsset {
    /// Natural size in pixels.
    pub fn intrinsic_size(&self) -> (f64, f64) {
        match self {
            Self::Raster(img) => (f64::from(img.width), f64::from(img.height)),
            Self::Svg(tree) => (
                f64::from(tree.size().width()),
                f64::from(tree.size().height()),
            ),
        }
    }
}

/// Where an image `src` string points.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceRef<'a> {
    Data { mime: &'a str, base64: bool, payload: &'a str },
    Path(String),
}

pub fn classify_src(src: &str) -> CoverResult<SourceRef<'_>> {
    let src = src.trim();
    if let Some(rest) = src.strip_prefix("data:") {
        let (meta, payload) = rest
            .split_once(',')
            .ok_or_else(|| CoverError::resource("data URL has no ',' separator"))?;
        let base64 = meta.ends_with(";base64");
        let mime = meta.split(';').next().unwrap_or_default();
        return Ok(SourceRef::Data {
            mime,
            base64,
            payload,
        });
    }
    if let Some((scheme, _)) = src.split_once("://") {
        return Err(CoverError::resource(format!(
            "cross-origin image source '{scheme}://...' cannot be read"
        )));
    }
    Ok(SourceRef::Path(normalize_rel_path(src)?))
}

/// Normalize a relative asset path to `/` separators without `.` segments.
///
/// Absolute paths and parent traversals are rejected.
pub fn normalize_rel_path(source: &str) -> CoverResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') || s.get(1..2) == Some(":") {
        return Err(CoverError::resource("image paths must be relative"));
    }

    let parts: Vec<&str> = s
        .split('/')
        .filter(|p| !p.is_empty() && *p != ".")
        .collect();
    if parts.contains(&"..") {
        return Err(CoverError::resource("image paths must not contain '..'"));
    }
    if parts.is_empty() {
        return Err(CoverError::resource("image path must contain a file name"));
    }
    Ok(parts.join("/"))
}

pub fn decode_image(bytes: &[u8]) -> CoverResult<DecodedImage> {
    let img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut data = rgba.into_raw();
    premultiply_in_place(&mut data);
    Ok(DecodedImage {
        width,
        height,
        rgba8_premul: Arc::new(data),
    })
}

pub fn parse_svg(bytes: &[u8]) -> CoverResult<Arc<usvg::Tree>> {
    let opts = usvg::Options::default();
    let tree = usvg::Tree::from_data(bytes, &opts).context("parse svg tree")?;
    Ok(Arc::new(tree))
}

/// Render `tree` stretched to exactly `width` x `height` pixels.
pub fn rasterize_svg(tree: &usvg::Tree, width: u32, height: u32) -> CoverResult<DecodedImage> {
    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| CoverError::render("failed to allocate svg pixmap"))?;
    let sx = (width as f32) / tree.size().width();
    let sy = (height as f32) / tree.size().height();
    resvg::render(
        tree,
        resvg::tiny_skia::Transform::from_scale(sx, sy),
        &mut pixmap.as_mut(),
    );
    Ok(DecodedImage {
        width,
        height,
        rgba8_premul: Arc::new(pixmap.data().to_vec()),
    })
}

fn looks_like_svg(mime: Option<&str>, path: Option<&str>, bytes: &[u8]) -> bool {
    if mime.is_some_and(|m| m.contains("svg")) {
        return true;
    }
    if path.is_some_and(|p| p.to_ascii_lowercase().ends_with(".svg")) {
        return true;
    }
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(256)]);
    let head = head.trim_start();
    head.starts_with("<svg") || (head.starts_with("<?xml") && head.contains("<svg"))
}

fn percent_decode(s: &str) -> Vec<u8> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && let Some(v) = s
                .get(i + 1..i + 3)
                .and_then(|h| u8::from_str_radix(h, 16).ok())
        {
            out.push(v);
            i += 3;
            continue;
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}

/// Resolves and caches image sources by their `src` string.
#[derive(Debug, Default)]
pub struct AssetLoader {
    root: Option<PathBuf>,
    cache: HashMap<String, ImageAsset>,
}

impl AssetLoader {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self {
            root,
            cache: HashMap::new(),
        }
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn load(&mut self, src: &str) -> CoverResult<ImageAsset> {
        if let Some(asset) = self.cache.get(src) {
            return Ok(asset.clone());
        }
        let asset = self.load_uncached(src)?;
        self.cache.insert(src.to_string(), asset.clone());
        Ok(asset)
    }

    fn load_uncached(&self, src: &str) -> CoverResult<ImageAsset> {
        let (bytes, mime, path) = match classify_src(src)? {
            SourceRef::Data {
                mime,
                base64,
                payload,
            } => {
                let bytes = if base64 {
                    base64::engine::general_purpose::STANDARD
                        .decode(payload.trim())
                        .map_err(|e| CoverError::resource(format!("invalid base64 data URL: {e}")))?
                } else {
                    percent_decode(payload)
                };
                (bytes, Some(mime.to_string()), None)
            }
            SourceRef::Path(rel) => {
                let root = self.root.as_deref().unwrap_or_else(|| Path::new("."));
                let full = root.join(&rel);
                let bytes = std::fs::read(&full).map_err(|e| {
                    CoverError::resource(format!("read image '{}': {e}", full.display()))
                })?;
                (bytes, None, Some(rel))
            }
        };

        tracing::debug!(bytes = bytes.len(), "loaded image source");
        if looks_like_svg(mime.as_deref(), path.as_deref(), &bytes) {
            parse_svg(&bytes)
                .map(ImageAsset::Svg)
                .map_err(|e| CoverError::resource(format!("svg source: {e}")))
        } else {
            decode_image(&bytes)
                .map(ImageAsset::Raster)
                .map_err(|e| CoverError::resource(format!("image source: {e}")))
        }
    }
}
