use std::path::Path;

use ab_glyph::{point, Font, FontArc, GlyphId, ScaleFont};
use image::Rgba;

use crate::canvas::{Point, RasterCanvas, blend_over};

/// Lay out a single line of text, returning positioned glyphs and the line width.
/// Glyph positions are relative to the top of the line box, so each glyph's
/// `y` equals the ascent (its baseline).
pub fn layout_text(font: &FontArc, text: &str, font_size: f32) -> (Vec<(GlyphId, f32, f32)>, f32) {
    let scaled = font.as_scaled(font_size);
    let ascent = scaled.ascent();

    let mut glyphs = Vec::new();
    let mut cursor_x = 0.0f32;
    let mut last_glyph: Option<GlyphId> = None;

    for ch in text.chars() {
        let glyph_id = font.glyph_id(ch);
        if let Some(prev) = last_glyph {
            cursor_x += scaled.kern(prev, glyph_id);
        }
        glyphs.push((glyph_id, cursor_x, ascent));
        cursor_x += scaled.h_advance(glyph_id);
        last_glyph = Some(glyph_id);
    }

    (glyphs, cursor_x)
}

/// Stamps text onto the canvas with an optional loaded font.
///
/// Without a font, rendering is skipped with a warning; everything else in
/// the editor keeps working.
#[derive(Clone, Default)]
pub struct TextRenderer {
    font: Option<FontArc>,
}

impl std::fmt::Debug for TextRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextRenderer")
            .field("has_font", &self.font.is_some())
            .finish()
    }
}

impl TextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_font(font: FontArc) -> Self {
        Self { font: Some(font) }
    }

    /// Resolve a font from an explicit file, then a family name, then the
    /// system sans-serif. Failures are logged and leave the renderer fontless.
    pub fn from_config(font_path: Option<&Path>, family: &str) -> Self {
        if let Some(path) = font_path {
            match load_font_file(path) {
                Some(font) => return Self::with_font(font),
                None => log::warn!("could not load font file {}", path.display()),
            }
        }
        let family = if family.trim().is_empty() { None } else { Some(family.trim()) };
        match load_system_font(family) {
            Some(font) => Self::with_font(font),
            None => {
                log::warn!("no usable system font found; text tool disabled");
                Self::default()
            }
        }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Draw `text` so that the first line's glyph tops start `ascent` above
    /// the baseline, with the baseline `ascent` pixels below `origin`.
    /// Multi-line text advances by the font's line height.
    /// Returns `false` when nothing was rendered.
    pub fn render(&self, canvas: &mut RasterCanvas, text: &str, size: f32, origin: Point, color: Rgba<u8>) -> bool {
        let Some(font) = &self.font else {
            log::warn!("text tool used without a loaded font; skipping");
            return false;
        };
        if text.is_empty() || size <= 0.0 {
            return false;
        }

        let line_height = font.as_scaled(size).height();
        let (w, h) = (canvas.width() as i64, canvas.height() as i64);

        for (line_idx, line) in text.split('\n').enumerate() {
            let (glyphs, _) = layout_text(font, line, size);
            let line_top = origin.y as f32 + line_idx as f32 * line_height;
            for (id, gx, gy) in glyphs {
                let glyph = id.with_scale_and_position(size, point(origin.x as f32 + gx, line_top + gy));
                let Some(outlined) = font.outline_glyph(glyph) else {
                    continue;
                };
                let bounds = outlined.px_bounds();
                outlined.draw(|x, y, coverage| {
                    let px = bounds.min.x as i64 + x as i64;
                    let py = bounds.min.y as i64 + y as i64;
                    if px < 0 || py < 0 || px >= w || py >= h || coverage <= 0.0 {
                        return;
                    }
                    let alpha = (color[3] as f32 * coverage.min(1.0)).round() as u8;
                    let src = Rgba([color[0], color[1], color[2], alpha]);
                    if let Some(dst) = canvas.pixel(px as i32, py as i32) {
                        canvas.put_pixel(px as i32, py as i32, blend_over(dst, src));
                    }
                });
            }
        }
        true
    }
}

pub fn load_font_file(path: &Path) -> Option<FontArc> {
    let bytes = std::fs::read(path).ok()?;
    FontArc::try_from_vec(bytes).ok()
}

/// Load a font by family name from the system, or the default sans-serif.
/// Returns None if no font can be found.
pub fn load_system_font(family: Option<&str>) -> Option<FontArc> {
    use font_kit::family_name::FamilyName;
    use font_kit::properties::Properties;
    use font_kit::source::SystemSource;

    let mut names = Vec::new();
    if let Some(f) = family {
        names.push(FamilyName::Title(f.to_string()));
    }
    names.push(FamilyName::SansSerif);

    let source = SystemSource::new();
    let handle = source.select_best_match(&names, &Properties::new()).ok()?;
    let font_data = handle.load().ok()?;
    let bytes: Vec<u8> = (*font_data.copy_font_data()?).clone();
    FontArc::try_from_vec(bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fontless_renderer_skips() {
        let mut canvas = RasterCanvas::new(20, 20).unwrap();
        let before = canvas.clone();
        let r = TextRenderer::new();
        assert!(!r.render(&mut canvas, "hi", 12.0, Point::new(0, 0), Rgba([0, 0, 0, 255])));
        assert_eq!(canvas, before);
    }

    // Needs a system font; machines without one skip the assertions.
    #[test]
    fn glyphs_sit_on_the_ascent_baseline() {
        let Some(font) = load_system_font(None) else { return };
        let size = 24.0;
        let ascent = font.as_scaled(size).ascent();

        let (glyphs, width) = layout_text(&font, "Hello", size);
        assert_eq!(glyphs.len(), 5);
        assert!(glyphs.iter().all(|(_, _, y)| *y == ascent));
        assert!(glyphs.windows(2).all(|w| w[0].1 < w[1].1));
        assert!(width > glyphs[4].1);

        let mut canvas = RasterCanvas::new(64, 64).unwrap();
        let before = canvas.clone();
        let r = TextRenderer::with_font(font);
        assert!(r.render(&mut canvas, "H", size, Point::new(4, 4), Rgba([0, 0, 0, 255])));
        assert_ne!(canvas, before);
        assert_eq!(canvas.pixel(2, 2), before.pixel(2, 2));
    }
}
