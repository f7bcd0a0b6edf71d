// ============================================================================
// RASTER CANVAS - single RGBA8 pixel buffer with stroke and blit primitives
// ============================================================================

use image::{Rgba, RgbaImage, imageops};
use rayon::prelude::*;

use crate::error::CanvasError;

/// Fill colour for new canvases, cleared areas, resize margins and the eraser.
pub const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Integer canvas coordinate. `(x, y)` addresses the centre of pixel `(x, y)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned pixel rectangle. The origin may lie outside the canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Intersection with a `canvas_w`×`canvas_h` canvas, `None` when nothing overlaps.
    pub fn clamp_to(&self, canvas_w: u32, canvas_h: u32) -> Option<Region> {
        let x0 = (self.x as i64).max(0);
        let y0 = (self.y as i64).max(0);
        let x1 = (self.x as i64 + self.width as i64).min(canvas_w as i64);
        let y1 = (self.y as i64 + self.height as i64).min(canvas_h as i64);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(Region::new(x0 as i32, y0 as i32, (x1 - x0) as u32, (y1 - y0) as u32))
    }
}

/// Owns the editable pixel buffer.
///
/// The buffer length is always `width * height * 4`: every operation that changes
/// dimensions builds a complete replacement image first and swaps it in.
#[derive(Clone, Debug, PartialEq)]
pub struct RasterCanvas {
    pixels: RgbaImage,
}

impl RasterCanvas {
    /// Create an opaque white canvas.
    pub fn new(width: u32, height: u32) -> Result<Self, CanvasError> {
        check_dimensions(width, height)?;
        Ok(Self {
            pixels: RgbaImage::from_pixel(width, height, BACKGROUND),
        })
    }

    /// Like [`new`](Self::new) with each side clamped to at least one pixel.
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::from_pixel(width.max(1), height.max(1), BACKGROUND),
        }
    }

    /// Wrap an existing bitmap.
    pub fn from_image(image: RgbaImage) -> Result<Self, CanvasError> {
        check_dimensions(image.width(), image.height())?;
        Ok(Self { pixels: image })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn into_image(self) -> RgbaImage {
        self.pixels
    }

    /// Swap in a complete replacement buffer (undo/redo, whole-canvas rotation).
    pub fn replace(&mut self, image: RgbaImage) -> Result<(), CanvasError> {
        check_dimensions(image.width(), image.height())?;
        self.pixels = image;
        Ok(())
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width() && (y as u32) < self.height()
    }

    /// Pixel at `(x, y)`, or `None` outside the canvas.
    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgba<u8>> {
        if !self.contains(x, y) {
            return None;
        }
        Some(*self.pixels.get_pixel(x as u32, y as u32))
    }

    /// Overwrite one pixel. Returns `false` when out of bounds.
    pub fn put_pixel(&mut self, x: i32, y: i32, color: Rgba<u8>) -> bool {
        if !self.contains(x, y) {
            return false;
        }
        self.pixels.put_pixel(x as u32, y as u32, color);
        true
    }

    /// Fill the whole canvas with the background colour.
    pub fn clear(&mut self) {
        let buf: &mut [u8] = &mut self.pixels;
        buf.par_chunks_mut(4)
            .for_each(|px| px.copy_from_slice(&BACKGROUND.0));
    }

    /// Change dimensions. Existing content stays anchored top-left, clipped to the
    /// overlap; uncovered area is background.
    pub fn resize(&mut self, new_w: u32, new_h: u32) -> Result<(), CanvasError> {
        check_dimensions(new_w, new_h)?;
        let mut next = RgbaImage::from_pixel(new_w, new_h, BACKGROUND);
        let dst: &mut [u8] = &mut next;
        let copy_w = self.width().min(new_w) as usize * 4;
        let copy_h = self.height().min(new_h) as usize;
        let src_row = self.width() as usize * 4;
        let dst_row = new_w as usize * 4;
        let src: &[u8] = &self.pixels;
        dst.par_chunks_mut(dst_row)
            .take(copy_h)
            .enumerate()
            .for_each(|(y, row)| {
                let start = y * src_row;
                row[..copy_w].copy_from_slice(&src[start..start + copy_w]);
            });
        self.pixels = next;
        Ok(())
    }

    // ------------------------------------------------------------------------
    //  Strokes
    // ------------------------------------------------------------------------

    /// Draw a straight segment of the given stroke width.
    ///
    /// Solid strokes have round caps, so consecutive segments join smoothly.
    /// Dashed strokes alternate `2.5 * width` long dashes and gaps along the
    /// segment and use butt caps.
    pub fn draw_segment(&mut self, from: Point, to: Point, color: Rgba<u8>, width: f32, dashed: bool) {
        self.stroke_segment(from, to, color, width, dashed, 0.0);
    }

    /// Stroke a connected path. The dash pattern runs continuously across
    /// vertices instead of restarting on every edge.
    pub fn draw_polyline(&mut self, points: &[Point], closed: bool, color: Rgba<u8>, width: f32, dashed: bool) {
        match points {
            [] => {}
            [only] => {
                self.stroke_segment(*only, *only, color, width, dashed, 0.0);
            }
            _ => {
                let mut phase = 0.0;
                for pair in points.windows(2) {
                    phase = self.stroke_segment(pair[0], pair[1], color, width, dashed, phase);
                }
                if closed && points.len() > 2 {
                    self.stroke_segment(points[points.len() - 1], points[0], color, width, dashed, phase);
                }
            }
        }
    }

    /// Returns the dash phase at the end of the segment.
    fn stroke_segment(
        &mut self,
        from: Point,
        to: Point,
        color: Rgba<u8>,
        width: f32,
        dashed: bool,
        phase: f32,
    ) -> f32 {
        let half = width.max(1.0) * 0.5;
        let dash = width.max(1.0) * 2.5;
        let (ax, ay) = (from.x as f32, from.y as f32);
        let (bx, by) = (to.x as f32, to.y as f32);
        let (dx, dy) = (bx - ax, by - ay);
        let len = (dx * dx + dy * dy).sqrt();

        if dashed && len < f32::EPSILON {
            return phase;
        }

        let pad = half.ceil() as i64 + 1;
        let x0 = ((from.x.min(to.x) as i64) - pad).max(0);
        let y0 = ((from.y.min(to.y) as i64) - pad).max(0);
        let x1 = ((from.x.max(to.x) as i64) + pad + 1).min(self.width() as i64);
        let y1 = ((from.y.max(to.y) as i64) + pad + 1).min(self.height() as i64);
        if x1 <= x0 || y1 <= y0 {
            return phase + len;
        }

        let row_bytes = self.width() as usize * 4;
        let buf: &mut [u8] = &mut self.pixels;
        let rows = &mut buf[y0 as usize * row_bytes..y1 as usize * row_bytes];
        rows.par_chunks_mut(row_bytes)
            .enumerate()
            .for_each(|(i, row)| {
                let py = (y0 as usize + i) as f32;
                for x in x0..x1 {
                    let px = x as f32;
                    let covered = if dashed {
                        let seg = DashSegment { ax, ay, dx, dy, len, half, dash, phase };
                        seg.covers(px, py)
                    } else {
                        sdf_line_segment(px, py, ax, ay, bx, by) <= half + 1e-3
                    };
                    if covered {
                        let idx = x as usize * 4;
                        let dst = Rgba([row[idx], row[idx + 1], row[idx + 2], row[idx + 3]]);
                        row[idx..idx + 4].copy_from_slice(&blend_over(dst, color).0);
                    }
                }
            });
        phase + len
    }

    // ------------------------------------------------------------------------
    //  Sub-images
    // ------------------------------------------------------------------------

    /// Source-over `src` scaled (nearest neighbour) to `dest`, clipped to the canvas.
    pub fn composite_sub_image(&mut self, src: &RgbaImage, dest: Region) {
        self.place_sub_image(src, dest, true);
    }

    /// Like [`composite_sub_image`](Self::composite_sub_image) but replaces the
    /// destination pixels instead of blending.
    pub fn blit_sub_image(&mut self, src: &RgbaImage, dest: Region) {
        self.place_sub_image(src, dest, false);
    }

    /// Owned copy of `region` clamped to the canvas bounds. The result may be
    /// smaller than requested; `None` when nothing of it lies on the canvas.
    pub fn extract_sub_image(&self, region: Region) -> Option<RgbaImage> {
        let r = region.clamp_to(self.width(), self.height())?;
        Some(imageops::crop_imm(&self.pixels, r.x as u32, r.y as u32, r.width, r.height).to_image())
    }

    fn place_sub_image(&mut self, src: &RgbaImage, dest: Region, blend: bool) {
        if dest.is_empty() || src.width() == 0 || src.height() == 0 {
            return;
        }
        let Some(visible) = dest.clamp_to(self.width(), self.height()) else {
            return;
        };

        let scaled;
        let src = if src.dimensions() == (dest.width, dest.height) {
            src
        } else {
            scaled = imageops::resize(src, dest.width, dest.height, imageops::FilterType::Nearest);
            &scaled
        };

        let row_bytes = self.width() as usize * 4;
        let y_start = visible.y as usize;
        let y_end = y_start + visible.height as usize;
        let off_x = (visible.x as i64 - dest.x as i64) as u32;
        let off_y = (visible.y as i64 - dest.y as i64) as u32;

        let buf: &mut [u8] = &mut self.pixels;
        buf[y_start * row_bytes..y_end * row_bytes]
            .par_chunks_mut(row_bytes)
            .enumerate()
            .for_each(|(i, row)| {
                let sy = off_y + i as u32;
                for col in 0..visible.width {
                    let s = *src.get_pixel(off_x + col, sy);
                    let idx = (visible.x as u32 + col) as usize * 4;
                    let out = if blend {
                        let dst = Rgba([row[idx], row[idx + 1], row[idx + 2], row[idx + 3]]);
                        blend_over(dst, s)
                    } else {
                        s
                    };
                    row[idx..idx + 4].copy_from_slice(&out.0);
                }
            });
    }
}

fn check_dimensions(width: u32, height: u32) -> Result<(), CanvasError> {
    if width == 0 || height == 0 {
        return Err(CanvasError::InvalidDimensions {
            width: width as i64,
            height: height as i64,
        });
    }
    Ok(())
}

/// Distance from `(px, py)` to the segment `a`→`b`.
#[inline]
fn sdf_line_segment(px: f32, py: f32, ax: f32, ay: f32, bx: f32, by: f32) -> f32 {
    let dx = bx - ax;
    let dy = by - ay;
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq > 0.0 {
        (((px - ax) * dx + (py - ay) * dy) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let cx = ax + t * dx;
    let cy = ay + t * dy;
    ((px - cx) * (px - cx) + (py - cy) * (py - cy)).sqrt()
}

/// One edge of a dashed stroke with butt caps.
#[derive(Clone, Copy)]
struct DashSegment {
    ax: f32,
    ay: f32,
    dx: f32,
    dy: f32,
    len: f32,
    half: f32,
    dash: f32,
    phase: f32,
}

impl DashSegment {
    /// Inside the stroke band and inside an "on" interval of the pattern.
    #[inline]
    fn covers(&self, px: f32, py: f32) -> bool {
        let ux = self.dx / self.len;
        let uy = self.dy / self.len;
        let rel_x = px - self.ax;
        let rel_y = py - self.ay;
        let along = rel_x * ux + rel_y * uy;
        if along < 0.0 || along > self.len {
            return false;
        }
        let across = (rel_x * uy - rel_y * ux).abs();
        across <= self.half + 1e-3 && (along + self.phase).rem_euclid(self.dash * 2.0) < self.dash
    }
}

/// Source-over compositing of straight-alpha colours.
pub(crate) fn blend_over(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    if src[3] == 0 {
        return dst;
    }
    if src[3] == 255 || dst[3] == 0 {
        return src;
    }
    let sa = src[3] as f32 / 255.0;
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a < 0.001 {
        return Rgba([0, 0, 0, 0]);
    }
    let inv = 1.0 / out_a;
    let ch = |i: usize| {
        ((src[i] as f32 * sa + dst[i] as f32 * da * (1.0 - sa)) * inv)
            .round()
            .clamp(0.0, 255.0) as u8
    };
    Rgba([ch(0), ch(1), ch(2), (out_a * 255.0).round().clamp(0.0, 255.0) as u8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_clamp_handles_negative_origin() {
        let r = Region::new(-5, -5, 10, 10).clamp_to(100, 100);
        assert_eq!(r, Some(Region::new(0, 0, 5, 5)));
        assert_eq!(Region::new(120, 0, 10, 10).clamp_to(100, 100), None);
    }

    #[test]
    fn blend_over_half_alpha_on_white() {
        let out = blend_over(BACKGROUND, Rgba([0, 0, 0, 128]));
        assert_eq!(out[3], 255);
        assert!(out[0] > 120 && out[0] < 135);
    }

    #[test]
    fn dashed_segment_leaves_gaps() {
        let mut c = RasterCanvas::new(60, 5).unwrap();
        c.draw_segment(Point::new(0, 2), Point::new(59, 2), Rgba([0, 0, 0, 255]), 2.0, true);
        // dash = 5px on, 5px off
        assert_eq!(c.pixel(2, 2), Some(Rgba([0, 0, 0, 255])));
        assert_eq!(c.pixel(7, 2), Some(BACKGROUND));
        assert_eq!(c.pixel(12, 2), Some(Rgba([0, 0, 0, 255])));
    }

    #[test]
    fn solid_segment_has_round_cap() {
        let mut c = RasterCanvas::new(40, 40).unwrap();
        c.draw_segment(Point::new(10, 20), Point::new(30, 20), Rgba([0, 0, 0, 255]), 6.0, false);
        assert_eq!(c.pixel(8, 20), Some(Rgba([0, 0, 0, 255])));
        assert_eq!(c.pixel(7, 23), Some(BACKGROUND));
    }
}
