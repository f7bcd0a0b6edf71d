// ============================================================================
// SELECTION & CLIPBOARD - rectangular selection, copy, paste
// ============================================================================

use image::RgbaImage;

use crate::canvas::{Point, RasterCanvas, Region};

/// Rectangular selection in canvas coordinates.
///
/// While a drag is in progress `width`/`height` may be negative (the pointer
/// moved above or left of the anchor). Use [`normalized`](Self::normalized)
/// before reading it as a rectangle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Selection {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Selection {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Zero-size selection anchored at `p`.
    pub const fn at(p: Point) -> Self {
        Self::new(p.x, p.y, 0, 0)
    }

    /// Same rectangle with the origin at the min corner and non-negative extents.
    pub fn normalized(&self) -> Selection {
        let (x, width) = if self.width < 0 {
            (self.x + self.width, -self.width)
        } else {
            (self.x, self.width)
        };
        let (y, height) = if self.height < 0 {
            (self.y + self.height, -self.height)
        } else {
            (self.y, self.height)
        };
        Selection::new(x, y, width, height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn region(&self) -> Region {
        let n = self.normalized();
        Region::new(n.x, n.y, n.width as u32, n.height as u32)
    }
}

/// Holds the active selection and an independently owned clipboard image.
///
/// The clipboard outlives the selection: clearing or replacing the selection
/// never touches it, and pasting reads it without consuming it.
#[derive(Clone, Debug, Default)]
pub struct SelectionClipboard {
    selection: Option<Selection>,
    clipboard: Option<RgbaImage>,
}

impl SelectionClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a new selection at `p`, replacing any previous one.
    pub fn start_selection(&mut self, p: Point) {
        self.selection = Some(Selection::at(p));
    }

    /// Move the free corner of the selection being dragged.
    pub fn update_selection(&mut self, p: Point) {
        if let Some(sel) = &mut self.selection {
            sel.width = p.x - sel.x;
            sel.height = p.y - sel.y;
        }
    }

    /// Store the selection in normalized form (end of a drag).
    pub fn finish_selection(&mut self) {
        if let Some(sel) = &mut self.selection {
            *sel = sel.normalized();
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Current selection, normalized.
    pub fn selection(&self) -> Option<Selection> {
        self.selection.map(|s| s.normalized())
    }

    /// Normalized selection rectangle, `None` when absent or of zero area.
    pub fn active_region(&self) -> Option<Region> {
        self.selection().filter(|s| !s.is_empty()).map(|s| s.region())
    }

    pub fn clipboard(&self) -> Option<&RgbaImage> {
        self.clipboard.as_ref()
    }

    pub fn has_clipboard(&self) -> bool {
        self.clipboard.is_some()
    }

    pub fn set_clipboard(&mut self, image: RgbaImage) {
        self.clipboard = Some(image);
    }

    /// Copy the selected pixels, clamped to the canvas, into the clipboard.
    /// Returns `false` (leaving the clipboard untouched) when nothing is selected.
    pub fn copy(&mut self, canvas: &RasterCanvas) -> bool {
        let Some(region) = self.active_region() else {
            return false;
        };
        match canvas.extract_sub_image(region) {
            Some(img) => {
                self.clipboard = Some(img);
                true
            }
            None => false,
        }
    }

    /// Composite the clipboard with its top-left corner at `at`.
    /// Returns `false` when the clipboard is empty.
    pub fn paste(&self, canvas: &mut RasterCanvas, at: Point) -> bool {
        let Some(clip) = &self.clipboard else {
            return false;
        };
        canvas.composite_sub_image(clip, Region::new(at.x, at.y, clip.width(), clip.height()));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn copy_clamps_to_canvas() {
        let canvas = RasterCanvas::new(10, 10).unwrap();
        let mut sc = SelectionClipboard::new();
        sc.start_selection(Point::new(-4, 6));
        sc.update_selection(Point::new(4, 20));
        sc.finish_selection();
        assert!(sc.copy(&canvas));
        assert_eq!(sc.clipboard().map(|c| c.dimensions()), Some((4, 4)));
    }

    #[test]
    fn zero_area_copy_is_noop() {
        let canvas = RasterCanvas::new(10, 10).unwrap();
        let mut sc = SelectionClipboard::new();
        sc.set_clipboard(RgbaImage::from_pixel(1, 1, Rgba([1, 2, 3, 255])));
        sc.start_selection(Point::new(3, 3));
        sc.update_selection(Point::new(3, 8));
        assert!(!sc.copy(&canvas));
        assert_eq!(sc.clipboard().map(|c| c.dimensions()), Some((1, 1)));
    }

    #[test]
    fn clipboard_survives_selection_clear() {
        let mut canvas = RasterCanvas::new(10, 10).unwrap();
        canvas.put_pixel(1, 1, Rgba([255, 0, 0, 255]));
        let mut sc = SelectionClipboard::new();
        sc.start_selection(Point::new(0, 0));
        sc.update_selection(Point::new(3, 3));
        sc.copy(&canvas);
        sc.clear_selection();
        assert!(sc.paste(&mut canvas, Point::new(5, 5)));
        assert!(sc.paste(&mut canvas, Point::new(0, 5)));
        assert_eq!(canvas.pixel(6, 6), Some(Rgba([255, 0, 0, 255])));
        assert_eq!(canvas.pixel(1, 6), Some(Rgba([255, 0, 0, 255])));
    }
}
