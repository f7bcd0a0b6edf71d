// ============================================================================
// TRANSFORM OPERATIONS - quarter-turn rotation and flips, canvas or selection
// ============================================================================

use image::{RgbaImage, imageops};

use crate::canvas::{RasterCanvas, Region};
use crate::error::{CanvasError, EditorError};

/// Non-identity rotation by a multiple of 90° (clockwise, screen coordinates).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuarterTurn {
    Cw90,
    Half,
    Ccw90,
}

impl QuarterTurn {
    /// Map an angle in degrees to a turn. Any multiple of 360 (including 0)
    /// is the identity and yields `Ok(None)`; angles that are not multiples
    /// of 90 are rejected.
    pub fn from_degrees(degrees: i64) -> Result<Option<QuarterTurn>, EditorError> {
        match degrees.rem_euclid(360) {
            0 => Ok(None),
            90 => Ok(Some(QuarterTurn::Cw90)),
            180 => Ok(Some(QuarterTurn::Half)),
            270 => Ok(Some(QuarterTurn::Ccw90)),
            _ => Err(EditorError::UnsupportedAngle(degrees)),
        }
    }

    /// Whether width and height trade places.
    pub fn swaps_dimensions(&self) -> bool {
        !matches!(self, QuarterTurn::Half)
    }

    pub fn degrees(&self) -> i64 {
        match self {
            QuarterTurn::Cw90 => 90,
            QuarterTurn::Half => 180,
            QuarterTurn::Ccw90 => 270,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlipAxis {
    /// Mirror left↔right.
    Horizontal,
    /// Mirror top↔bottom.
    Vertical,
}

/// What a transform applies to, resolved from the current selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransformTarget {
    WholeCanvas,
    /// Selection clamped to the canvas.
    Region(Region),
}

/// Resolve the target. `selection` is the normalized selection, if any.
/// A selection with zero area, or lying entirely off the canvas, yields `None`
/// (the transform is a no-op).
pub fn resolve_target(canvas: &RasterCanvas, selection: Option<Region>) -> Option<TransformTarget> {
    match selection {
        None => Some(TransformTarget::WholeCanvas),
        Some(sel) if sel.is_empty() => None,
        Some(sel) => sel
            .clamp_to(canvas.width(), canvas.height())
            .map(TransformTarget::Region),
    }
}

pub fn rotate_image(img: &RgbaImage, turn: QuarterTurn) -> RgbaImage {
    match turn {
        QuarterTurn::Cw90 => imageops::rotate90(img),
        QuarterTurn::Half => imageops::rotate180(img),
        QuarterTurn::Ccw90 => imageops::rotate270(img),
    }
}

pub fn flip_image(img: &RgbaImage, axis: FlipAxis) -> RgbaImage {
    match axis {
        FlipAxis::Horizontal => imageops::flip_horizontal(img),
        FlipAxis::Vertical => imageops::flip_vertical(img),
    }
}

/// Rotate the target in place.
///
/// The whole canvas swaps width and height on 90°/270°. A selection is rotated
/// on its own and then stretched back into its original rectangle, so a
/// non-square selection is distorted by 90°/270° turns. The result replaces
/// the selected pixels, transparent ones included, rather than blending over them.
pub fn rotate(canvas: &mut RasterCanvas, target: TransformTarget, turn: QuarterTurn) -> Result<(), CanvasError> {
    match target {
        TransformTarget::WholeCanvas => {
            let rotated = rotate_image(canvas.image(), turn);
            canvas.replace(rotated)
        }
        TransformTarget::Region(region) => {
            if let Some(sub) = canvas.extract_sub_image(region) {
                let rotated = rotate_image(&sub, turn);
                canvas.blit_sub_image(&rotated, region);
            }
            Ok(())
        }
    }
}

/// Mirror the target in place. Applying the same flip twice restores it.
/// Selection results replace pixels like [`rotate`].
pub fn flip(canvas: &mut RasterCanvas, target: TransformTarget, axis: FlipAxis) -> Result<(), CanvasError> {
    match target {
        TransformTarget::WholeCanvas => {
            let flipped = flip_image(canvas.image(), axis);
            canvas.replace(flipped)
        }
        TransformTarget::Region(region) => {
            if let Some(sub) = canvas.extract_sub_image(region) {
                canvas.blit_sub_image(&flip_image(&sub, axis), region);
            }
            Ok(())
        }
    }
}
