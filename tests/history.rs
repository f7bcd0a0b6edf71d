use image::{Rgba, RgbaImage};

use rasterpad::components::history::{DEFAULT_MAX_HISTORY, HistoryStack};

fn marked(v: u8) -> RgbaImage {
    RgbaImage::from_pixel(2, 2, Rgba([v, v, v, 255]))
}

fn mark(img: &RgbaImage) -> u8 {
    img.get_pixel(0, 0)[0]
}

#[test]
fn keeps_only_the_most_recent_fifty() {
    let mut history = HistoryStack::new(DEFAULT_MAX_HISTORY);
    for i in 0..60u8 {
        history.push(&marked(i));
    }
    assert_eq!(history.undo_count(), 50);

    let marks: Vec<u8> = history.undo_entries().map(|s| mark(s.image())).collect();
    let expected: Vec<u8> = (10..60u8).rev().collect();
    assert_eq!(marks, expected);
}

#[test]
fn undo_then_redo_round_trips_the_buffer() {
    let mut history = HistoryStack::new(10);
    history.push(&marked(1));
    let current = marked(2);

    let restored = history.undo(&current).unwrap();
    assert_eq!(mark(&restored), 1);
    assert_eq!(history.redo_count(), 1);

    let again = history.redo(&restored).unwrap();
    assert_eq!(again, current);
    assert_eq!(history.undo_count(), 1);
    assert_eq!(history.redo_count(), 0);
}

#[test]
fn empty_stacks_are_noops() {
    let mut history = HistoryStack::new(10);
    let current = marked(7);
    assert!(history.undo(&current).is_none());
    assert!(history.redo(&current).is_none());
    assert!(!history.can_undo());
    assert_eq!(history.memory_usage(), 0);
}

#[test]
fn clear_redo_drops_forward_history() {
    let mut history = HistoryStack::new(10);
    history.push(&marked(1));
    let restored = history.undo(&marked(2)).unwrap();
    assert!(history.can_redo());

    history.push(&restored);
    history.clear_redo();
    assert!(!history.can_redo());
    assert!(history.redo(&restored).is_none());
}

#[test]
fn redo_stack_is_bounded_too() {
    let mut history = HistoryStack::new(3);
    for i in 0..3u8 {
        history.push(&marked(i));
    }
    let mut current = marked(9);
    while let Some(prev) = history.undo(&current) {
        current = prev;
    }
    assert_eq!(history.redo_count(), 3);
    assert_eq!(mark(&current), 0);
}

#[test]
fn memory_limit_keeps_latest_entry() {
    let one = marked(0).as_raw().len();
    let mut history = HistoryStack::new(10).with_memory_limit(one * 2);
    for i in 0..5u8 {
        history.push(&marked(i));
    }
    assert!(history.undo_count() <= 2);
    assert!(history.undo_count() >= 1);
    assert_eq!(history.undo_entries().next().map(|s| mark(s.image())), Some(4));
}
