use image::{Rgba, RgbaImage};

use rasterpad::canvas::{BACKGROUND, Point};
use rasterpad::editor::Editor;
use rasterpad::error::EditorError;
use rasterpad::ops::transform::{FlipAxis, QuarterTurn};

const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

/// Every pixel distinct, so any misplacement shows.
fn gradient(w: u32, h: u32) -> RgbaImage {
    RgbaImage::from_fn(w, h, |x, y| Rgba([x as u8, y as u8, (x * 7 + y * 13) as u8, 255]))
}

fn editor_with(img: RgbaImage) -> Editor {
    let mut editor = Editor::default();
    editor.set_image(img).unwrap();
    editor
}

#[test]
fn angle_normalization() {
    assert_eq!(QuarterTurn::from_degrees(0).unwrap(), None);
    assert_eq!(QuarterTurn::from_degrees(720).unwrap(), None);
    assert_eq!(QuarterTurn::from_degrees(-90).unwrap(), Some(QuarterTurn::Ccw90));
    assert_eq!(QuarterTurn::from_degrees(450).unwrap(), Some(QuarterTurn::Cw90));
    assert_eq!(QuarterTurn::from_degrees(45), Err(EditorError::UnsupportedAngle(45)));
}

#[test]
fn full_turns_are_identity() {
    let original = gradient(30, 20);
    let mut editor = editor_with(original.clone());
    assert!(!editor.rotate(0).unwrap());
    assert!(!editor.rotate(360).unwrap());
    assert_eq!(editor.image(), Some(&original));
    assert_eq!(editor.history().undo_count(), 1);
}

#[test]
fn quarter_turn_and_back() {
    let original = gradient(30, 20);
    let mut editor = editor_with(original.clone());

    assert!(editor.rotate(90).unwrap());
    assert_eq!(editor.dimensions(), Some((20, 30)));
    // clockwise: the top-left corner moves to the top-right
    assert_eq!(editor.pixel(19, 0), Some(*original.get_pixel(0, 0)));

    assert!(editor.rotate(270).unwrap());
    assert_eq!(editor.image(), Some(&original));
}

#[test]
fn half_turn_twice_is_identity() {
    let original = gradient(9, 5);
    let mut editor = editor_with(original.clone());
    editor.rotate(180).unwrap();
    assert_eq!(editor.pixel(8, 4), Some(*original.get_pixel(0, 0)));
    editor.rotate(-180).unwrap();
    assert_eq!(editor.image(), Some(&original));
}

#[test]
fn unsupported_angle_changes_nothing() {
    let original = gradient(8, 8);
    let mut editor = editor_with(original.clone());
    assert_eq!(editor.rotate(45), Err(EditorError::UnsupportedAngle(45)));
    assert_eq!(editor.image(), Some(&original));
    assert_eq!(editor.history().undo_count(), 1);
}

#[test]
fn flips_are_involutions() {
    let original = gradient(17, 11);
    let mut editor = editor_with(original.clone());
    for axis in [FlipAxis::Horizontal, FlipAxis::Vertical] {
        assert!(editor.flip(axis).unwrap());
        assert_ne!(editor.image(), Some(&original));
        assert!(editor.flip(axis).unwrap());
        assert_eq!(editor.image(), Some(&original));
    }
}

#[test]
fn horizontal_flip_mirrors_columns() {
    let original = gradient(10, 4);
    let mut editor = editor_with(original.clone());
    editor.flip(FlipAxis::Horizontal).unwrap();
    assert_eq!(editor.pixel(9, 2), Some(*original.get_pixel(0, 2)));
}

#[test]
fn selection_flip_touches_only_the_selection() {
    let original = gradient(20, 20);
    let mut editor = editor_with(original.clone());
    editor.select(Point::new(5, 5), Point::new(15, 10));

    editor.flip(FlipAxis::Vertical).unwrap();
    assert_eq!(editor.pixel(5, 9), Some(*original.get_pixel(5, 5)));
    assert_eq!(editor.pixel(0, 0), Some(*original.get_pixel(0, 0)));
    assert_eq!(editor.pixel(5, 12), Some(*original.get_pixel(5, 12)));

    editor.flip(FlipAxis::Vertical).unwrap();
    assert_eq!(editor.image(), Some(&original));
}

#[test]
fn selection_transforms_replace_transparent_pixels() {
    let clear = Rgba([0, 0, 0, 0]);
    let mut img = RgbaImage::from_pixel(10, 10, BACKGROUND);
    img.put_pixel(0, 0, clear);
    let mut editor = editor_with(img);
    editor.select(Point::new(0, 0), Point::new(2, 2));

    editor.flip(FlipAxis::Horizontal).unwrap();
    assert_eq!(editor.pixel(1, 0), Some(clear));
    assert_eq!(editor.pixel(0, 0), Some(BACKGROUND));

    editor.rotate(180).unwrap();
    assert_eq!(editor.pixel(0, 1), Some(clear));
    assert_eq!(editor.pixel(1, 0), Some(BACKGROUND));
}

#[test]
fn selection_quarter_turn_stretches_into_the_rectangle() {
    let mut img = RgbaImage::from_pixel(20, 20, BACKGROUND);
    for x in 0..10 {
        img.put_pixel(x, 0, RED);
    }
    img.put_pixel(12, 0, RED);
    let mut editor = editor_with(img);
    editor.select(Point::new(0, 0), Point::new(10, 4));

    assert!(editor.rotate(90).unwrap());
    assert_eq!(editor.dimensions(), Some((20, 20)));
    // the red top row becomes the right-hand column, widened to fill 10x4
    for y in 0..4 {
        assert_eq!(editor.pixel(9, y), Some(RED));
        for x in 0..5 {
            assert_eq!(editor.pixel(x, y), Some(BACKGROUND));
        }
    }
    // outside the selection nothing moved
    assert_eq!(editor.pixel(12, 0), Some(RED));
}

#[test]
fn degenerate_selections_are_noops() {
    let original = gradient(10, 10);
    let mut editor = editor_with(original.clone());

    editor.select(Point::new(3, 3), Point::new(3, 8));
    assert!(!editor.rotate(90).unwrap());
    assert!(!editor.flip(FlipAxis::Horizontal).unwrap());

    editor.select(Point::new(50, 50), Point::new(60, 60));
    assert!(!editor.rotate(180).unwrap());

    assert_eq!(editor.image(), Some(&original));
    assert_eq!(editor.history().undo_count(), 1);
}
