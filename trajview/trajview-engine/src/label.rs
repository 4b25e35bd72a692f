use resvg::tiny_skia::{Pixmap, PremultipliedColorU8};
use rusttype::{Font, Scale, point};

use crate::{Error, Result, TextStyle};

/// Parse the bundled label font.
pub(crate) fn load_font() -> Result<Font<'static>> {
    Font::try_from_bytes(ttf_firacode::REGULAR as &[u8]).ok_or(Error::Font)
}

/// Blend `color` with coverage `v` over the pixel at `(x, y)`.
fn put_pixel(pixmap: &mut Pixmap, x: i32, y: i32, style: &TextStyle, v: f32) {
    if x < 0 || y < 0 || x as u32 >= pixmap.width() || y as u32 >= pixmap.height() {
        return;
    }
    let idx = y as usize * pixmap.width() as usize + x as usize;
    let old = pixmap.pixels()[idx];

    let alpha = v.clamp(0.0, 1.0) * style.color.a as f32 / 255.0;
    let q = 1.0 - alpha;
    let out_a = alpha * 255.0 + old.alpha() as f32 * q;
    let blend = |src: u8, dst: u8| (src as f32 * alpha + dst as f32 * q).min(out_a);

    let new = PremultipliedColorU8::from_rgba(
        blend(style.color.r, old.red()).round() as u8,
        blend(style.color.g, old.green()).round() as u8,
        blend(style.color.b, old.blue()).round() as u8,
        out_a.round() as u8,
    );
    if let Some(new) = new {
        pixmap.pixels_mut()[idx] = new;
    }
}

/// Draw one line of `text` with its top left corner at `origin`.
pub(crate) fn stamp_text(
    pixmap: &mut Pixmap,
    font: &Font<'_>,
    text: &str,
    origin: (f32, f32),
    style: &TextStyle,
) {
    let scale = Scale::uniform(style.size);
    let v_metrics = font.v_metrics(scale);
    let start = point(origin.0, origin.1 + v_metrics.ascent);

    for glyph in font.layout(text, scale, start) {
        if let Some(bb) = glyph.pixel_bounding_box() {
            glyph.draw(|x, y, v| {
                put_pixel(pixmap, bb.min.x + x as i32, bb.min.y + y as i32, style, v);
            });
        }
    }
}

/// Approximate width in pixels of `n_chars` characters of the monospace label font.
pub(crate) fn text_width(n_chars: usize, size: f32) -> f32 {
    n_chars as f32 * size * 0.6
}

/// Break `text` into lines of at most `max_chars` characters at word boundaries.
pub(crate) fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let needed = if line.is_empty() {
                word.chars().count()
            } else {
                line.chars().count() + 1 + word.chars().count()
            };
            if needed > max_chars && !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(word);
        }
        lines.push(line);
    }
    lines
}
