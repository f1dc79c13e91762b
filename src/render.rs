pub mod assets;
pub mod blur;
pub mod composite;
pub mod cpu;
pub mod text;

use crate::{document::Document, foundation::error::CoverResult};

/// Premultiplied RGBA8 raster of a whole document at `scale` times its logical resolution.
#[derive(Clone, Debug)]
pub struct RasterFrame {
    pub width: u32,
    pub height: u32,
    pub scale: u32,
    pub data: Vec<u8>,
}

impl RasterFrame {
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        self.data
            .get(i..i + 4)
            .map(|p| [p[0], p[1], p[2], p[3]])
    }
}

/// Something that can draw a document off-screen.
///
/// Implementations must draw against the document's logical resolution only; the on-screen
/// viewport scale is never an input.
pub trait Rasterizer {
    fn rasterize(&mut self, doc: &Document, scale: u32) -> CoverResult<RasterFrame>;
}
