//! Editor and export tuning knobs.
//!
//! Every field has a default, so an empty JSON object (or no file at all) is a valid configuration.
//! `COVERKIT_*` environment variables override the loaded values; unparsable or non-positive values
//! are ignored.

use std::path::{Path, PathBuf};

use crate::foundation::error::{CoverError, CoverResult};

pub const ENV_SNAP_THRESHOLD_PX: &str = "COVERKIT_SNAP_THRESHOLD_PX";
pub const ENV_EXPORT_OVERSAMPLE: &str = "COVERKIT_EXPORT_OVERSAMPLE";

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    /// Snap distance in on-screen pixels.
    pub snap_threshold_px: f64,
    pub viewport_padding_px: f64,
    pub viewport_margin_factor: f64,
    /// Floor applied to width/height while resizing, in percent.
    pub min_extent_percent: f64,
    pub export: ExportOpts,
    /// Base directory for relative image paths.
    pub assets_root: Option<PathBuf>,
    /// Directory scanned for `.ttf`/`.otf` files.
    pub fonts_dir: Option<PathBuf>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            snap_threshold_px: 5.0,
            viewport_padding_px: 64.0,
            viewport_margin_factor: 0.95,
            min_extent_percent: crate::geometry::MIN_EXTENT_PERCENT,
            export: ExportOpts::default(),
            assets_root: None,
            fonts_dir: None,
        }
    }
}

impl EditorConfig {
    pub fn from_json_str(s: &str) -> CoverResult<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_file(path: &Path) -> CoverResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            CoverError::validation(format!("read config '{}': {e}", path.display()))
        })?;
        Self::from_json_str(&text)
    }

    /// Apply `COVERKIT_*` overrides from the process environment.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(px) = std::env::var(ENV_SNAP_THRESHOLD_PX)
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|&n| n.is_finite() && n > 0.0)
        {
            self.snap_threshold_px = px;
        }
        if let Some(n) = std::env::var(ENV_EXPORT_OVERSAMPLE)
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|&n| n > 0)
        {
            self.export.oversample = n;
        }
        self
    }

    pub fn with_assets_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.assets_root = Some(root.into());
        self
    }

    pub fn with_fonts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.fonts_dir = Some(dir.into());
        self
    }

    pub fn with_snap_threshold_px(mut self, px: f64) -> Self {
        self.snap_threshold_px = px;
        self
    }

    pub fn with_export(mut self, export: ExportOpts) -> Self {
        self.export = export;
        self
    }

    pub fn validate(&self) -> CoverResult<()> {
        if !self.snap_threshold_px.is_finite() || self.snap_threshold_px < 0.0 {
            return Err(CoverError::validation("snapThresholdPx must be finite and >= 0"));
        }
        if !self.viewport_padding_px.is_finite() || self.viewport_padding_px < 0.0 {
            return Err(CoverError::validation(
                "viewportPaddingPx must be finite and >= 0",
            ));
        }
        if !(self.viewport_margin_factor > 0.0 && self.viewport_margin_factor <= 1.0) {
            return Err(CoverError::validation(
                "viewportMarginFactor must be in (0, 1]",
            ));
        }
        if !(self.min_extent_percent > 0.0 && self.min_extent_percent.is_finite()) {
            return Err(CoverError::validation("minExtentPercent must be > 0"));
        }
        self.export.validate()
    }
}

/// Resampling filter used when reducing the oversampled raster to the logical resolution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DownsampleFilter {
    Nearest,
    #[default]
    Triangle,
    CatmullRom,
    Lanczos3,
}

impl DownsampleFilter {
    pub fn to_image_filter(self) -> image::imageops::FilterType {
        match self {
            Self::Nearest => image::imageops::FilterType::Nearest,
            Self::Triangle => image::imageops::FilterType::Triangle,
            Self::CatmullRom => image::imageops::FilterType::CatmullRom,
            Self::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportOpts {
    /// Raster scale factor before downsampling. `1` disables oversampling.
    pub oversample: u32,
    pub downsample_filter: DownsampleFilter,
}

impl Default for ExportOpts {
    fn default() -> Self {
        Self {
            oversample: 2,
            downsample_filter: DownsampleFilter::default(),
        }
    }
}

impl ExportOpts {
    pub fn with_oversample(mut self, oversample: u32) -> Self {
        self.oversample = oversample;
        self
    }

    pub fn with_downsample_filter(mut self, filter: DownsampleFilter) -> Self {
        self.downsample_filter = filter;
        self
    }

    pub fn validate(&self) -> CoverResult<()> {
        if self.oversample == 0 || self.oversample > 8 {
            return Err(CoverError::validation("export.oversample must be in 1..=8"));
        }
        Ok(())
    }
}
