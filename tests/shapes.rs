use std::f32::consts::PI;

use image::Rgba;

use rasterpad::canvas::{BACKGROUND, Point, RasterCanvas};
use rasterpad::ops::shapes::{
    BoundingBox, Outline, ShapeKind, draw_shape, regular_polygon_vertices, shape_outline, star_vertices,
};

const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

fn close(a: (f32, f32), b: (f32, f32)) -> bool {
    (a.0 - b.0).abs() < 1e-3 && (a.1 - b.1).abs() < 1e-3
}

#[test]
fn square_polygon_vertices() {
    let v = regular_polygon_vertices(50.0, 50.0, 20.0, 4);
    let expected = [(70.0, 50.0), (50.0, 70.0), (30.0, 50.0), (50.0, 30.0)];
    assert_eq!(v.len(), 4);
    for (got, want) in v.iter().zip(expected) {
        assert!(close(*got, want), "{:?} != {:?}", got, want);
    }
}

#[test]
fn polygon_side_count_is_at_least_three() {
    assert_eq!(regular_polygon_vertices(0.0, 0.0, 5.0, 1).len(), 3);
}

#[test]
fn star_alternates_outer_and_inner() {
    let (cx, cy) = (40.0, 40.0);
    let v = star_vertices(cx, cy, 20.0, 5);
    assert_eq!(v.len(), 10);
    assert!(close(v[0], (40.0, 20.0)));
    for (i, (x, y)) in v.iter().enumerate() {
        let r = ((x - cx).powi(2) + (y - cy).powi(2)).sqrt();
        let want = if i % 2 == 0 { 20.0 } else { 10.0 };
        assert!((r - want).abs() < 1e-3);
        let angle = -PI / 2.0 + PI / 5.0 * i as f32;
        assert!(close((*x, *y), (cx + want * angle.cos(), cy + want * angle.sin())));
    }
}

#[test]
fn tiny_star_keeps_inner_radius_of_one() {
    let v = star_vertices(0.0, 0.0, 1.0, 4);
    let (x, y) = v[1];
    assert!(((x * x + y * y).sqrt() - 1.0).abs() < 1e-3);
}

#[test]
fn bounding_box_from_any_corners() {
    let bb = BoundingBox::from_corners(Point::new(30, 5), Point::new(10, 25));
    assert_eq!((bb.min_x, bb.min_y, bb.max_x, bb.max_y), (10, 5, 30, 25));
    assert_eq!(bb.center(), (20.0, 15.0));
}

#[test]
fn triangle_apex_is_top_center() {
    let Outline::Polygon(v) = shape_outline(ShapeKind::Triangle, Point::new(40, 40), Point::new(0, 0), 5) else {
        panic!("triangle should be a polygon");
    };
    assert_eq!(v, vec![(20.0, 0.0), (0.0, 40.0), (40.0, 40.0)]);
}

#[test]
fn square_uses_shorter_side() {
    let Outline::Polygon(v) = shape_outline(ShapeKind::Square, Point::new(0, 0), Point::new(30, 10), 5) else {
        panic!("square should be a polygon");
    };
    assert_eq!(v[2], (10.0, 10.0));
}

#[test]
fn circle_is_inscribed_oval() {
    match shape_outline(ShapeKind::Circle, Point::new(0, 0), Point::new(40, 20), 5) {
        Outline::Ellipse { cx, cy, rx, ry } => assert_eq!((cx, cy, rx, ry), (20.0, 10.0, 20.0, 10.0)),
        other => panic!("unexpected outline {:?}", other),
    }
}

#[test]
fn ellipse_stroke_leaves_center_empty() {
    let mut canvas = RasterCanvas::new(60, 60).unwrap();
    draw_shape(&mut canvas, ShapeKind::Ellipse, Point::new(10, 10), Point::new(50, 50), 5, BLACK, 3.0, false);
    assert_eq!(canvas.pixel(30, 30), Some(BACKGROUND));
    assert_eq!(canvas.pixel(10, 30), Some(BLACK));
    assert_eq!(canvas.pixel(30, 50), Some(BLACK));
}

#[test]
fn dashed_rectangle_has_gaps() {
    let mut canvas = RasterCanvas::new(100, 40).unwrap();
    draw_shape(&mut canvas, ShapeKind::Rectangle, Point::new(0, 10), Point::new(99, 30), 5, BLACK, 2.0, true);
    let top: Vec<bool> = (0..100).map(|x| canvas.pixel(x, 10) == Some(BLACK)).collect();
    assert!(top.iter().any(|b| *b));
    assert!(top.iter().any(|b| !*b));
}
