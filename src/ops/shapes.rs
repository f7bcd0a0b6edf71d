use std::f32::consts::PI;

use image::Rgba;

use crate::canvas::{Point, RasterCanvas};

/// Available shape primitives.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    #[default]
    Rectangle,
    Square,
    Circle,
    Ellipse,
    Triangle,
    RightTriangle,
    Kite,
    Polygon,
    Star,
}

impl ShapeKind {
    pub fn label(&self) -> &'static str {
        match self {
            ShapeKind::Rectangle => "Rectangle",
            ShapeKind::Square => "Square",
            ShapeKind::Circle => "Circle",
            ShapeKind::Ellipse => "Ellipse",
            ShapeKind::Triangle => "Triangle",
            ShapeKind::RightTriangle => "Right Triangle",
            ShapeKind::Kite => "Kite",
            ShapeKind::Polygon => "Polygon",
            ShapeKind::Star => "Star",
        }
    }

    pub fn all() -> &'static [ShapeKind] {
        &[
            ShapeKind::Rectangle,
            ShapeKind::Square,
            ShapeKind::Circle,
            ShapeKind::Ellipse,
            ShapeKind::Triangle,
            ShapeKind::RightTriangle,
            ShapeKind::Kite,
            ShapeKind::Polygon,
            ShapeKind::Star,
        ]
    }

    /// Lenient name lookup used by scripts and config files.
    pub fn from_name(name: &str) -> Option<ShapeKind> {
        let key: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "rectangle" | "rect" => Some(ShapeKind::Rectangle),
            "square" => Some(ShapeKind::Square),
            "circle" => Some(ShapeKind::Circle),
            "ellipse" | "oval" => Some(ShapeKind::Ellipse),
            "triangle" => Some(ShapeKind::Triangle),
            "righttriangle" => Some(ShapeKind::RightTriangle),
            "kite" => Some(ShapeKind::Kite),
            "polygon" => Some(ShapeKind::Polygon),
            "star" => Some(ShapeKind::Star),
            _ => None,
        }
    }
}

// ============================================================================
// BOUNDING BOX
// ============================================================================

/// Box spanned by the press and release points of a shape gesture.
/// The original corners are kept because the right triangle uses them directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundingBox {
    pub corner1: Point,
    pub corner2: Point,
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl BoundingBox {
    pub fn from_corners(corner1: Point, corner2: Point) -> Self {
        Self {
            corner1,
            corner2,
            min_x: corner1.x.min(corner2.x),
            min_y: corner1.y.min(corner2.y),
            max_x: corner1.x.max(corner2.x),
            max_y: corner1.y.max(corner2.y),
        }
    }

    pub fn width(&self) -> i32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> i32 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> (f32, f32) {
        (
            (self.min_x + self.max_x) as f32 * 0.5,
            (self.min_y + self.max_y) as f32 * 0.5,
        )
    }

    /// Half of the shorter side.
    pub fn radius(&self) -> f32 {
        self.width().min(self.height()) as f32 * 0.5
    }
}

// ============================================================================
// OUTLINES
// ============================================================================

/// Geometric outline produced for a shape, before stroking.
#[derive(Clone, Debug, PartialEq)]
pub enum Outline {
    /// Closed polygon through these vertices.
    Polygon(Vec<(f32, f32)>),
    /// Axis-aligned ellipse inscribed in the box.
    Ellipse { cx: f32, cy: f32, rx: f32, ry: f32 },
}

impl Outline {
    /// Vertices of the closed path to stroke, with ellipses sampled finely
    /// enough that adjacent samples are at most about two pixels apart.
    pub fn path(&self) -> Vec<Point> {
        match self {
            Outline::Polygon(verts) => verts
                .iter()
                .map(|&(x, y)| Point::new(x.round() as i32, y.round() as i32))
                .collect(),
            Outline::Ellipse { cx, cy, rx, ry } => {
                let approx_perimeter = PI * (rx + ry);
                let samples = ((approx_perimeter / 2.0).ceil() as usize).clamp(16, 2048);
                (0..samples)
                    .map(|i| {
                        let a = 2.0 * PI * i as f32 / samples as f32;
                        Point::new(
                            (cx + rx * a.cos()).round() as i32,
                            (cy + ry * a.sin()).round() as i32,
                        )
                    })
                    .collect()
            }
        }
    }
}

/// Vertices of a regular `sides`-gon, the first at angle 0 (pointing +x).
pub fn regular_polygon_vertices(cx: f32, cy: f32, radius: f32, sides: u32) -> Vec<(f32, f32)> {
    let n = sides.max(3);
    (0..n)
        .map(|i| {
            let angle = 2.0 * PI * i as f32 / n as f32;
            (cx + radius * angle.cos(), cy + radius * angle.sin())
        })
        .collect()
}

/// Vertices of a `points`-pointed star alternating between `outer` and
/// `max(1, outer / 2)`, starting straight up.
pub fn star_vertices(cx: f32, cy: f32, outer: f32, points: u32) -> Vec<(f32, f32)> {
    let inner = (outer / 2.0).max(1.0);
    let step = PI / points as f32;
    (0..points * 2)
        .map(|i| {
            let r = if i % 2 == 0 { outer } else { inner };
            let angle = -PI / 2.0 + step * i as f32;
            (cx + r * angle.cos(), cy + r * angle.sin())
        })
        .collect()
}

/// Compute the outline for `kind` in the box spanned by two corners.
/// `sides` is the polygon side count (clamped to 3+) and, for stars, the
/// requested point count (clamped to 4+).
pub fn shape_outline(kind: ShapeKind, corner1: Point, corner2: Point, sides: u32) -> Outline {
    let bb = BoundingBox::from_corners(corner1, corner2);
    let (min_x, min_y) = (bb.min_x as f32, bb.min_y as f32);
    let (max_x, max_y) = (bb.max_x as f32, bb.max_y as f32);
    let (cx, cy) = bb.center();

    match kind {
        ShapeKind::Rectangle => Outline::Polygon(vec![
            (min_x, min_y),
            (max_x, min_y),
            (max_x, max_y),
            (min_x, max_y),
        ]),
        ShapeKind::Square => {
            let side = bb.width().min(bb.height()) as f32;
            Outline::Polygon(vec![
                (min_x, min_y),
                (min_x + side, min_y),
                (min_x + side, min_y + side),
                (min_x, min_y + side),
            ])
        }
        // Circle is the full inscribed oval, not forced square.
        ShapeKind::Circle | ShapeKind::Ellipse => Outline::Ellipse {
            cx,
            cy,
            rx: bb.width() as f32 * 0.5,
            ry: bb.height() as f32 * 0.5,
        },
        ShapeKind::Triangle => Outline::Polygon(vec![(cx, min_y), (min_x, max_y), (max_x, max_y)]),
        // Two vertices coincide, so this strokes as a single edge.
        ShapeKind::RightTriangle => {
            let (a, b) = (bb.corner1, bb.corner2);
            Outline::Polygon(vec![
                (a.x as f32, a.y as f32),
                (a.x as f32, a.y as f32),
                (b.x as f32, b.y as f32),
            ])
        }
        ShapeKind::Kite => Outline::Polygon(vec![(cx, min_y), (min_x, cy), (cx, max_y), (max_x, cy)]),
        ShapeKind::Polygon => Outline::Polygon(regular_polygon_vertices(cx, cy, bb.radius(), sides)),
        ShapeKind::Star => Outline::Polygon(star_vertices(cx, cy, bb.radius(), sides.max(4))),
    }
}

/// Stroke a shape onto the canvas.
#[allow(clippy::too_many_arguments)]
pub fn draw_shape(
    canvas: &mut RasterCanvas,
    kind: ShapeKind,
    corner1: Point,
    corner2: Point,
    sides: u32,
    color: Rgba<u8>,
    width: f32,
    dashed: bool,
) {
    let path = shape_outline(kind, corner1, corner2, sides).path();
    canvas.draw_polyline(&path, true, color, width, dashed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for kind in ShapeKind::all() {
            assert_eq!(ShapeKind::from_name(kind.label()), Some(*kind));
        }
        assert_eq!(ShapeKind::from_name("right_triangle"), Some(ShapeKind::RightTriangle));
        assert_eq!(ShapeKind::from_name("blob"), None);
    }

    #[test]
    fn square_uses_shorter_side_from_min_corner() {
        let outline = shape_outline(ShapeKind::Square, Point::new(40, 10), Point::new(10, 30), 5);
        assert_eq!(
            outline,
            Outline::Polygon(vec![(10.0, 10.0), (30.0, 10.0), (30.0, 30.0), (10.0, 30.0)])
        );
    }
}
