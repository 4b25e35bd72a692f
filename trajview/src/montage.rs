use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage, imageops};
use tracing::debug;

use trajview_engine::{Display, Frame};
use trajview_types::StreamConfig;

const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Placement of one stream's surface within the montage.
#[derive(Debug, Clone, Copy)]
struct Slot {
    x: u32,
    y: u32,
}

/// Keeps the most recently presented frame of every stream and saves them
/// side by side as numbered PNG files.
pub struct MontageWriter {
    dir: PathBuf,
    width: u32,
    height: u32,
    slots: Vec<Slot>,
    latest: Vec<Option<Frame>>,
    dirty: bool,
    written: usize,
}

impl MontageWriter {
    pub fn new(dir: &Path, streams: &[StreamConfig], composite_margin_pixels: u32) -> Self {
        let margin = composite_margin_pixels;
        let mut curx = 0;
        let mut max_height = 0;
        let slots = streams
            .iter()
            .map(|cfg| {
                curx += margin;
                let slot = Slot { x: curx, y: margin };
                curx += cfg.width + margin;
                max_height = max_height.max(cfg.height);
                slot
            })
            .collect();
        Self {
            dir: dir.to_path_buf(),
            width: curx.max(1),
            height: (max_height + 2 * margin).max(1),
            slots,
            latest: vec![None; streams.len()],
            dirty: false,
            written: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of montage files saved so far.
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn path_for(&self, index: usize) -> PathBuf {
        self.dir.join(format!("frame{index:05}.png"))
    }

    /// Compose the current frames into one image.
    pub fn compose(&self) -> RgbaImage {
        let mut canvas = RgbaImage::from_pixel(self.width, self.height, BACKGROUND);
        for (slot, frame) in self.slots.iter().zip(&self.latest) {
            if let Some(frame) = frame {
                let img = frame.to_rgba_image();
                imageops::replace(&mut canvas, &img, slot.x.into(), slot.y.into());
            }
        }
        canvas
    }

    /// Save a montage if anything was presented since the last save.
    ///
    /// Returns `true` if a file was written.
    pub fn flush(&mut self) -> Result<bool, image::ImageError> {
        if !self.dirty {
            return Ok(false);
        }
        let path = self.path_for(self.written);
        self.compose().save(&path)?;
        debug!("saved {}", path.display());
        self.written += 1;
        self.dirty = false;
        Ok(true)
    }
}

impl Display for MontageWriter {
    fn present(&mut self, stream: usize, frame: &Frame) {
        if let Some(slot) = self.latest.get_mut(stream) {
            *slot = Some(frame.clone());
            self.dirty = true;
        }
    }
}
