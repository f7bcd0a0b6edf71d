use std::time::{Duration, Instant};

use image::{Rgba, RgbaImage};
use tempfile::tempdir;

use rasterpad::autosave::{self, AutosaveScheduler, AutosaveStatus};
use rasterpad::canvas::{BACKGROUND, Point};
use rasterpad::editor::{Editor, EditorConfig};
use rasterpad::error::BitmapIoError;
use rasterpad::io::{load_bitmap, save_bitmap};
use rasterpad::settings::Settings;

#[test]
fn settings_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("rasterpad.cfg");

    let settings = Settings {
        max_undo_steps: 12,
        auto_save_minutes: 0,
        default_canvas_width: 640,
        default_canvas_height: 480,
        default_stroke_width: 7,
        export_port: 9090,
        font_family: "DejaVu Sans".to_string(),
        font_path: String::new(),
    };
    settings.save_to(&path).unwrap();
    assert_eq!(Settings::load_from(&path), settings);

    let config = EditorConfig::from(&settings);
    assert_eq!((config.default_width, config.default_height, config.max_history), (640, 480, 12));
}

#[test]
fn missing_settings_file_gives_defaults() {
    let dir = tempdir().unwrap();
    let s = Settings::load_from(&dir.path().join("absent.cfg"));
    assert_eq!(s, Settings::default());
    assert_eq!(s.max_undo_steps, 50);
    assert_eq!(s.auto_save_minutes, 2);
    assert_eq!(s.export_port, 8080);
    assert!(s.font_path().is_none());
}

#[test]
fn png_save_and_load_is_lossless() {
    let dir = tempdir().unwrap();
    let img = RgbaImage::from_fn(5, 4, |x, y| Rgba([x as u8 * 40, y as u8 * 60, 7, 200]));

    let written = save_bitmap(&img, &dir.path().join("a.png")).unwrap();
    assert_eq!(written, dir.path().join("a.png"));
    assert_eq!(load_bitmap(&written).unwrap(), img);
}

#[test]
fn unknown_extension_is_saved_as_png() {
    let dir = tempdir().unwrap();
    let img = RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 255]));
    let written = save_bitmap(&img, &dir.path().join("drawing.xyz")).unwrap();
    assert_eq!(written, dir.path().join("drawing.xyz.png"));
    assert!(written.exists());
    assert_eq!(load_bitmap(&written).unwrap(), img);
}

#[test]
fn jpeg_and_bmp_keep_dimensions() {
    let dir = tempdir().unwrap();
    let img = RgbaImage::from_pixel(16, 9, Rgba([200, 10, 10, 255]));
    for name in ["a.jpg", "b.JPEG", "c.bmp"] {
        let written = save_bitmap(&img, &dir.path().join(name)).unwrap();
        assert_eq!(load_bitmap(&written).unwrap().dimensions(), (16, 9));
    }
}

#[test]
fn load_failures_are_typed() {
    let dir = tempdir().unwrap();
    let err = load_bitmap(&dir.path().join("nothing.png")).unwrap_err();
    assert!(matches!(err, BitmapIoError::Read { .. }));
}

#[test]
fn autosave_waits_for_interval_and_changes() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("autosave.png");
    let t0 = Instant::now();
    let mut scheduler = AutosaveScheduler::from_minutes(2, t0);
    let mut editor = Editor::with_canvas(10, 10).unwrap();

    let status = scheduler.poll(&mut editor, t0 + Duration::from_secs(60), autosave::save_to(&path)).unwrap();
    assert_eq!(status, AutosaveStatus::NotDue);

    let status = scheduler.poll(&mut editor, t0 + Duration::from_secs(120), autosave::save_to(&path)).unwrap();
    assert_eq!(status, AutosaveStatus::Clean);
    assert!(!path.exists());

    editor.stroke(Point::new(0, 0), Point::new(9, 9));
    assert!(editor.is_dirty());
    let status = scheduler.poll(&mut editor, t0 + Duration::from_secs(240), autosave::save_to(&path)).unwrap();
    assert_eq!(status, AutosaveStatus::Saved(path.clone()));
    assert!(!editor.is_dirty());
    assert_eq!(*load_bitmap(&path).unwrap().get_pixel(5, 5), Rgba([0, 0, 0, 255]));
}

#[test]
fn failed_autosave_stays_dirty() {
    let t0 = Instant::now();
    let mut scheduler = AutosaveScheduler::from_minutes(1, t0);
    let mut editor = Editor::with_canvas(4, 4).unwrap();
    editor.clear();

    let result = scheduler.poll(&mut editor, t0 + Duration::from_secs(61), |_| Err(BitmapIoError::NothingToSave));
    assert!(result.is_err());
    assert!(editor.is_dirty());
}

#[test]
fn zero_interval_disables_autosave() {
    let t0 = Instant::now();
    let mut scheduler = AutosaveScheduler::from_minutes(0, t0);
    let mut editor = Editor::with_canvas(4, 4).unwrap();
    editor.clear();
    let status = scheduler
        .poll(&mut editor, t0 + Duration::from_secs(3600), |_| panic!("must not save"))
        .unwrap();
    assert_eq!(status, AutosaveStatus::Disabled);
    assert_eq!(editor.pixel(0, 0), Some(BACKGROUND));
}
