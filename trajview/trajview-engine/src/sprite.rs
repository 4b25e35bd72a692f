use std::path::Path;

use resvg::tiny_skia::{Pixmap, PremultipliedColorU8, Transform};

use crate::{Error, Result};

/// Built-in insect glyph, head pointing up.
const DEFAULT_SPRITE_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="64" height="64" viewBox="0 0 64 64">
  <ellipse cx="20" cy="30" rx="10" ry="16" fill="#9cc9ff" fill-opacity="0.7" transform="rotate(-25 20 30)"/>
  <ellipse cx="44" cy="30" rx="10" ry="16" fill="#9cc9ff" fill-opacity="0.7" transform="rotate(25 44 30)"/>
  <ellipse cx="32" cy="38" rx="7" ry="18" fill="#303030"/>
  <circle cx="32" cy="13" r="7" fill="#303030"/>
</svg>"##;

/// The directional marker drawn at each entity's position.
///
/// Its image points up; the renderer rotates it along the velocity.
#[derive(Debug, Clone)]
pub struct Sprite {
    pixmap: Pixmap,
}

impl Sprite {
    /// The built-in insect glyph.
    pub fn builtin() -> Result<Self> {
        Self::from_svg_data(DEFAULT_SPRITE_SVG.as_bytes(), "<builtin>")
    }

    /// Load from an `.svg` file or any bitmap format supported by `image`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let is_svg = path
            .extension()
            .and_then(|x| x.to_str())
            .map(|x| x.eq_ignore_ascii_case("svg"))
            .unwrap_or(false);
        if is_svg {
            let buf = std::fs::read(path).map_err(|source| Error::Io {
                path: path.display().to_string(),
                source,
            })?;
            Self::from_svg_data(&buf, &path.display().to_string())
        } else {
            let img = image::open(path).map_err(|source| Error::ImageSprite {
                path: path.display().to_string(),
                source,
            })?;
            Self::from_rgba_image(&img.to_rgba8())
        }
    }

    fn from_svg_data(buf: &[u8], name: &str) -> Result<Self> {
        let rtree = usvg::Tree::from_data(buf, &usvg::Options::default()).map_err(|source| {
            Error::SvgSprite {
                path: name.to_string(),
                source,
            }
        })?;
        let size = rtree.size().to_int_size();
        let (width, height) = (size.width(), size.height());
        let mut pixmap = Pixmap::new(width, height).ok_or(Error::Pixmap { width, height })?;
        resvg::render(&rtree, Transform::default(), &mut pixmap.as_mut());
        Ok(Self { pixmap })
    }

    fn from_rgba_image(img: &image::RgbaImage) -> Result<Self> {
        let (width, height) = img.dimensions();
        let mut pixmap = Pixmap::new(width, height).ok_or(Error::Pixmap { width, height })?;
        for (dst, src) in pixmap.pixels_mut().iter_mut().zip(img.pixels()) {
            let [r, g, b, a] = src.0;
            let premultiply = |c: u8| ((c as u16 * a as u16 + 127) / 255) as u8;
            if let Some(c) =
                PremultipliedColorU8::from_rgba(premultiply(r), premultiply(g), premultiply(b), a)
            {
                *dst = c;
            }
        }
        Ok(Self { pixmap })
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }
}
