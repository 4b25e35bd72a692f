use std::sync::Arc;

use resvg::tiny_skia::{
    self, FillRule, FilterQuality, Paint, PathBuilder, Pixmap, PixmapPaint, Rect, Stroke,
    Transform,
};

use crate::{Error, Result, Sprite};

/// A straight (not premultiplied) RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    fn paint(&self) -> Paint<'static> {
        let mut paint = Paint::default();
        paint.set_color_rgba8(self.r, self.g, self.b, self.a);
        paint.anti_alias = true;
        paint
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    /// Font size in pixels.
    pub size: f32,
    pub color: Rgba,
}

/// The drawing operations a frame is composed of.
///
/// Coordinates are surface pixels with the origin at the top left.
pub trait Surface {
    /// What [`Surface::snapshot`] freezes the current contents into.
    type Snapshot;

    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn clear(&mut self, color: Rgba);
    fn fill_circle(&mut self, center: (f32, f32), radius: f32, color: Rgba);
    fn fill_rect(&mut self, origin: (f32, f32), size: (f32, f32), color: Rgba);
    fn stroke_line(&mut self, from: (f32, f32), to: (f32, f32), width: f32, color: Rgba);
    /// Draw `sprite` centered on `center`, scaled to `size` pixels and rotated
    /// clockwise by `angle` degrees.
    fn draw_sprite(&mut self, center: (f32, f32), angle: f32, size: f32, sprite: &Sprite);
    /// Draw one line of text with its top left corner at `origin`.
    fn draw_text(&mut self, text: &str, origin: (f32, f32), style: &TextStyle);
    fn snapshot(&self) -> Self::Snapshot;
}

/// An immutable rendered raster.
///
/// Cloning is cheap, the pixels are shared.
#[derive(Clone)]
pub struct Frame {
    pixmap: Arc<Pixmap>,
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Frame {{ width: {}, height: {} }}", self.width(), self.height())
    }
}

impl PartialEq for Frame {
    fn eq(&self, other: &Self) -> bool {
        self.pixmap.width() == other.pixmap.width() && self.pixmap.data() == other.pixmap.data()
    }
}

impl Frame {
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Copy into a straight-alpha RGBA image, e.g. for encoding.
    pub fn to_rgba_image(&self) -> image::RgbaImage {
        let mut buf = Vec::with_capacity(self.pixmap.data().len());
        for pixel in self.pixmap.pixels() {
            let c = pixel.demultiply();
            buf.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        // The buffer has exactly width * height * 4 bytes.
        image::RgbaImage::from_raw(self.width(), self.height(), buf)
            .unwrap_or_else(|| image::RgbaImage::new(self.width(), self.height()))
    }
}

/// A [`Surface`] drawing into a `tiny_skia` pixmap.
pub struct PixmapSurface {
    pixmap: Pixmap,
    font: rusttype::Font<'static>,
}

impl PixmapSurface {
    pub fn new(width: u32, height: u32, font: rusttype::Font<'static>) -> Result<Self> {
        let pixmap = Pixmap::new(width, height).ok_or(Error::Pixmap { width, height })?;
        Ok(Self { pixmap, font })
    }
}

impl Surface for PixmapSurface {
    type Snapshot = Frame;

    fn width(&self) -> u32 {
        self.pixmap.width()
    }

    fn height(&self) -> u32 {
        self.pixmap.height()
    }

    fn clear(&mut self, color: Rgba) {
        self.pixmap.fill(tiny_skia::Color::from_rgba8(
            color.r, color.g, color.b, color.a,
        ));
    }

    fn fill_circle(&mut self, center: (f32, f32), radius: f32, color: Rgba) {
        // `from_circle` refuses non-finite and non-positive input.
        if let Some(path) = PathBuilder::from_circle(center.0, center.1, radius) {
            self.pixmap.fill_path(
                &path,
                &color.paint(),
                FillRule::Winding,
                Transform::identity(),
                None,
            );
        }
    }

    fn fill_rect(&mut self, origin: (f32, f32), size: (f32, f32), color: Rgba) {
        if let Some(rect) = Rect::from_xywh(origin.0, origin.1, size.0, size.1) {
            self.pixmap
                .fill_rect(rect, &color.paint(), Transform::identity(), None);
        }
    }

    fn stroke_line(&mut self, from: (f32, f32), to: (f32, f32), width: f32, color: Rgba) {
        let mut pb = PathBuilder::new();
        pb.move_to(from.0, from.1);
        pb.line_to(to.0, to.1);
        if let Some(path) = pb.finish() {
            let stroke = Stroke {
                width,
                ..Default::default()
            };
            self.pixmap.stroke_path(
                &path,
                &color.paint(),
                &stroke,
                Transform::identity(),
                None,
            );
        }
    }

    fn draw_sprite(&mut self, center: (f32, f32), angle: f32, size: f32, sprite: &Sprite) {
        if !(center.0.is_finite() && center.1.is_finite() && angle.is_finite()) {
            return;
        }
        let src = sprite.pixmap();
        let (sw, sh) = (src.width() as f32, src.height() as f32);
        let scale = size / sw.max(sh);
        let transform = Transform::from_translate(center.0, center.1)
            .pre_rotate(angle)
            .pre_scale(scale, scale)
            .pre_translate(-sw / 2.0, -sh / 2.0);
        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..Default::default()
        };
        self.pixmap
            .draw_pixmap(0, 0, src.as_ref(), &paint, transform, None);
    }

    fn draw_text(&mut self, text: &str, origin: (f32, f32), style: &TextStyle) {
        crate::label::stamp_text(&mut self.pixmap, &self.font, text, origin, style);
    }

    fn snapshot(&self) -> Frame {
        Frame {
            pixmap: Arc::new(self.pixmap.clone()),
        }
    }
}
