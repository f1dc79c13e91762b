//! Two-phase export: commit the selection clear, then capture on the next turn.
//!
//! [`ExportPipeline::request`] clears the selection (so no handle chrome can end up in the
//! raster) and hands out an [`ExportTicket`]. The caller lets its view settle, then passes the
//! ticket to [`ExportPipeline::capture`], which renders off-screen at `oversample` times the logical
//! resolution, downsamples to exactly `width x height` and encodes PNG. Only one ticket can be
//! outstanding at a time; dropping or cancelling it frees the pipeline again.

use std::{
    io::Cursor,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use anyhow::Context;

use crate::{
    config::{DownsampleFilter, ExportOpts},
    document::Document,
    foundation::error::{CoverError, CoverResult},
    render::{RasterFrame, Rasterizer, composite::unpremultiply_in_place},
};

/// Proof that the selection clear was committed. Consumed by [`ExportPipeline::capture`].
///
/// Holding a ticket keeps the pipeline busy; dropping it uncaptured releases the guard.
#[derive(Debug)]
#[must_use = "an export ticket does nothing unless it is captured"]
pub struct ExportTicket {
    seq: u64,
    guard: Arc<AtomicU64>,
}

impl ExportTicket {
    fn release(&self) -> bool {
        self.guard
            .compare_exchange(self.seq, IDLE, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl Drop for ExportTicket {
    fn drop(&mut self) {
        if self.release() {
            tracing::debug!(ticket = self.seq, "export ticket dropped, guard released");
        }
    }
}

/// Encoded export result.
#[derive(Clone, Debug)]
pub struct RasterArtifact {
    pub file_name: String,
    pub width: u32,
    pub height: u32,
    pub png_bytes: Vec<u8>,
}

impl RasterArtifact {
    /// Write the PNG into `dir` (created if needed) and return the full path.
    pub fn write_to_dir(&self, dir: &Path) -> CoverResult<PathBuf> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create output directory '{}'", dir.display()))?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.png_bytes)
            .with_context(|| format!("write '{}'", path.display()))?;
        Ok(path)
    }
}

/// `cover-{width}x{height}-{timestamp}.png`
pub fn artifact_file_name(width: u32, height: u32, now_ms: u64) -> String {
    format!("cover-{width}x{height}-{now_ms}.png")
}

const IDLE: u64 = 0;

#[derive(Debug, Default)]
pub struct ExportPipeline {
    opts: ExportOpts,
    next_seq: u64,
    /// Sequence number of the outstanding ticket, or `IDLE`.
    in_flight: Arc<AtomicU64>,
}

impl ExportPipeline {
    pub fn new(opts: ExportOpts) -> Self {
        Self {
            opts,
            ..Self::default()
        }
    }

    pub fn opts(&self) -> &ExportOpts {
        &self.opts
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire) != IDLE
    }

    /// Phase one. Fails with [`CoverError::Busy`] while another export is outstanding, in which
    /// case the document is left alone.
    pub fn request(&mut self, doc: &mut Document) -> CoverResult<ExportTicket> {
        let seq = self.next_seq + 1;
        if self
            .in_flight
            .compare_exchange(IDLE, seq, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(CoverError::busy("an export is already in progress"));
        }
        self.next_seq = seq;
        doc.select(None);
        tracing::debug!(ticket = seq, "export requested, selection cleared");
        Ok(ExportTicket {
            seq,
            guard: Arc::clone(&self.in_flight),
        })
    }

    /// Give up on an outstanding export without rendering. A ticket from another pipeline is
    /// ignored.
    pub fn cancel(&mut self, ticket: ExportTicket) {
        if Arc::ptr_eq(&ticket.guard, &self.in_flight) && ticket.release() {
            tracing::debug!(ticket = ticket.seq, "export cancelled");
        }
    }

    /// Phase two. Releases the guard whatever the outcome; a ticket that is not the outstanding
    /// one fails with [`CoverError::Busy`].
    #[tracing::instrument(skip_all, fields(ticket = ticket.seq, w = doc.width, h = doc.height))]
    pub fn capture(
        &mut self,
        ticket: ExportTicket,
        doc: &Document,
        rasterizer: &mut dyn Rasterizer,
        now_ms: u64,
    ) -> CoverResult<RasterArtifact> {
        if !Arc::ptr_eq(&ticket.guard, &self.in_flight) || !ticket.release() {
            return Err(CoverError::busy("export ticket is not the outstanding one"));
        }

        let oversample = self.opts.oversample;
        let frame = rasterizer.rasterize(doc, oversample)?;
        let png_bytes = encode_png(&frame, doc.width, doc.height, self.opts.downsample_filter)?;
        let artifact = RasterArtifact {
            file_name: artifact_file_name(doc.width, doc.height, now_ms),
            width: doc.width,
            height: doc.height,
            png_bytes,
        };
        tracing::info!(file = %artifact.file_name, bytes = artifact.png_bytes.len(), "export captured");
        Ok(artifact)
    }
}

/// Downsample a premultiplied frame to `width x height`, un-premultiply and encode as PNG.
pub fn encode_png(
    frame: &RasterFrame,
    width: u32,
    height: u32,
    filter: DownsampleFilter,
) -> CoverResult<Vec<u8>> {
    if frame.width != width.saturating_mul(frame.scale)
        || frame.height != height.saturating_mul(frame.scale)
    {
        return Err(CoverError::render(format!(
            "raster is {}x{}, expected {width}x{height} at scale {}",
            frame.width, frame.height, frame.scale
        )));
    }

    let full = image::RgbaImage::from_raw(frame.width, frame.height, frame.data.clone())
        .ok_or_else(|| CoverError::render("raster byte length does not match its size"))?;
    // Filtering happens on premultiplied data so transparent pixels cannot bleed color.
    let mut out = if frame.scale == 1 {
        full
    } else {
        image::imageops::resize(&full, width, height, filter.to_image_filter())
    };
    unpremultiply_in_place(&mut out);

    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(out)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .context("encode png")?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::{LayerKindTag, LayerPatch};

    /// Fills the whole frame with one premultiplied color.
    struct Flat([u8; 4]);

    impl Rasterizer for Flat {
        fn rasterize(&mut self, doc: &Document, scale: u32) -> CoverResult<RasterFrame> {
            let (width, height) = (doc.width * scale, doc.height * scale);
            Ok(RasterFrame {
                width,
                height,
                scale,
                data: self.0.repeat((width * height) as usize),
            })
        }
    }

    struct Failing;

    impl Rasterizer for Failing {
        fn rasterize(&mut self, _doc: &Document, _scale: u32) -> CoverResult<RasterFrame> {
            Err(CoverError::resource("cross-origin image source"))
        }
    }

    fn decode(png: &[u8]) -> image::RgbaImage {
        image::load_from_memory(png).unwrap().to_rgba8()
    }

    #[test]
    fn request_clears_selection() {
        let mut doc = Document::new(4, 4).unwrap();
        doc.add_layer(LayerKindTag::Shape, &LayerPatch::default());
        assert!(doc.selected.is_some());
        let mut pipeline = ExportPipeline::default();
        let _ticket = pipeline.request(&mut doc).unwrap();
        assert!(doc.selected.is_none());
        assert!(pipeline.is_busy());
    }

    #[test]
    fn second_request_is_busy_and_leaves_doc_alone() {
        let mut doc = Document::new(4, 4).unwrap();
        let mut pipeline = ExportPipeline::default();
        let ticket = pipeline.request(&mut doc).unwrap();

        let id = doc.add_layer(LayerKindTag::Shape, &LayerPatch::default());
        let err = pipeline.request(&mut doc).unwrap_err();
        assert!(matches!(err, CoverError::Busy(_)));
        assert_eq!(doc.selected, Some(id));

        pipeline.capture(ticket, &doc, &mut Flat([0, 0, 0, 255]), 1).unwrap();
        assert!(!pipeline.is_busy());
        let _again = pipeline.request(&mut doc).unwrap();
    }

    #[test]
    fn capture_produces_exact_size_and_name() {
        let mut doc = Document::new(6, 3).unwrap();
        let mut pipeline = ExportPipeline::new(ExportOpts::default().with_oversample(2));
        let ticket = pipeline.request(&mut doc).unwrap();
        let art = pipeline
            .capture(ticket, &doc, &mut Flat([0, 0, 255, 255]), 1_700_000_000_000)
            .unwrap();
        assert_eq!(art.file_name, "cover-6x3-1700000000000.png");
        let img = decode(&art.png_bytes);
        assert_eq!(img.dimensions(), (6, 3));
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 255, 255]);
    }

    #[test]
    fn output_is_unpremultiplied() {
        let mut doc = Document::new(2, 2).unwrap();
        let mut pipeline = ExportPipeline::new(ExportOpts::default().with_oversample(1));
        let ticket = pipeline.request(&mut doc).unwrap();
        let art = pipeline
            .capture(ticket, &doc, &mut Flat([128, 0, 0, 128]), 0)
            .unwrap();
        assert_eq!(decode(&art.png_bytes).get_pixel(1, 1).0, [255, 0, 0, 128]);
    }

    #[test]
    fn failure_releases_guard() {
        let mut doc = Document::new(2, 2).unwrap();
        let mut pipeline = ExportPipeline::default();
        let ticket = pipeline.request(&mut doc).unwrap();
        let err = pipeline.capture(ticket, &doc, &mut Failing, 0).unwrap_err();
        assert!(matches!(err, CoverError::Resource(_)));
        assert!(!pipeline.is_busy());
    }

    #[test]
    fn foreign_ticket_is_rejected() {
        let mut doc = Document::new(2, 2).unwrap();
        let mut a = ExportPipeline::default();
        let ta = a.request(&mut doc).unwrap();

        let mut other = ExportPipeline {
            next_seq: 7,
            ..ExportPipeline::default()
        };
        let foreign = other.request(&mut doc).unwrap();
        assert!(matches!(
            a.capture(foreign, &doc, &mut Flat([0; 4]), 0),
            Err(CoverError::Busy(_))
        ));
        assert!(a.is_busy());
        a.capture(ta, &doc, &mut Flat([0; 4]), 0).unwrap();
        assert!(!a.is_busy());
    }

    #[test]
    fn dropped_or_cancelled_ticket_frees_the_pipeline() {
        let mut doc = Document::new(2, 2).unwrap();
        let mut pipeline = ExportPipeline::default();
        {
            let _abandoned = pipeline.request(&mut doc).unwrap();
            assert!(pipeline.is_busy());
        }
        assert!(!pipeline.is_busy());

        let ticket = pipeline.request(&mut doc).unwrap();
        pipeline.cancel(ticket);
        assert!(!pipeline.is_busy());

        let ticket = pipeline.request(&mut doc).unwrap();
        pipeline.capture(ticket, &doc, &mut Flat([0; 4]), 0).unwrap();
    }

    #[test]
    fn stale_ticket_drop_keeps_the_newer_guard() {
        let mut doc = Document::new(2, 2).unwrap();
        let mut pipeline = ExportPipeline::default();
        let first = pipeline.request(&mut doc).unwrap();
        pipeline.capture(first, &doc, &mut Flat([0; 4]), 0).unwrap();

        let mut other = ExportPipeline::default();
        let foreign = other.request(&mut doc).unwrap();
        let current = pipeline.request(&mut doc).unwrap();
        pipeline.cancel(foreign);
        assert!(pipeline.is_busy());
        pipeline.capture(current, &doc, &mut Flat([0; 4]), 0).unwrap();
        assert!(!pipeline.is_busy());
    }

    #[test]
    fn mismatched_frame_size_is_render_error() {
        let frame = RasterFrame {
            width: 3,
            height: 3,
            scale: 1,
            data: vec![0; 36],
        };
        let err = encode_png(&frame, 4, 4, DownsampleFilter::Triangle).unwrap_err();
        assert!(matches!(err, CoverError::Render(_)));
    }
}
