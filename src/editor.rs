// ============================================================================
// EDITOR - controller owning the canvas, history, selection and tools
// ============================================================================
//
// Every mutation goes through here so that history snapshots, redo
// invalidation, the dirty flag and change notifications stay consistent.
// The raw pixel buffer is only ever handed out immutably.

use image::{Rgba, RgbaImage};

use crate::canvas::{Point, RasterCanvas};
use crate::components::history::{DEFAULT_MAX_HISTORY, HistoryStack};
use crate::components::tools::{Tool, ToolContext, ToolEngine, ToolOptions, ToolOutcome};
use crate::error::{CanvasError, EditorError};
use crate::ops::clipboard::{Selection, SelectionClipboard};
use crate::ops::text::TextRenderer;
use crate::ops::transform::{self, FlipAxis, QuarterTurn};
use crate::settings::Settings;

/// Size of the canvas created on first use when nothing was loaded.
pub const DEFAULT_CANVAS_WIDTH: u32 = 1440;
pub const DEFAULT_CANVAS_HEIGHT: u32 = 1920;

/// Largest accepted side length for resize requests.
pub const MAX_CANVAS_SIDE: i64 = 32_768;

/// Notifications for observers (views, autosave, export republishing).
#[derive(Clone, Debug, PartialEq)]
pub enum EditorEvent {
    CanvasChanged,
    HistoryChanged { undo: usize, redo: usize },
    SelectionChanged(Option<Selection>),
    ClipboardChanged,
    ColorPicked(Rgba<u8>),
}

type Listener = Box<dyn Fn(&EditorEvent) + Send>;

/// Construction parameters, usually derived from [`Settings`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditorConfig {
    pub default_width: u32,
    pub default_height: u32,
    pub max_history: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            default_width: DEFAULT_CANVAS_WIDTH,
            default_height: DEFAULT_CANVAS_HEIGHT,
            max_history: DEFAULT_MAX_HISTORY,
        }
    }
}

impl From<&Settings> for EditorConfig {
    fn from(s: &Settings) -> Self {
        Self {
            default_width: s.default_canvas_width,
            default_height: s.default_canvas_height,
            max_history: s.max_undo_steps,
        }
    }
}

pub struct Editor {
    canvas: Option<RasterCanvas>,
    history: HistoryStack,
    selection: SelectionClipboard,
    options: ToolOptions,
    engine: ToolEngine,
    text: TextRenderer,
    default_size: (u32, u32),
    dirty: bool,
    listeners: Vec<Listener>,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("size", &self.canvas.as_ref().map(|c| c.dimensions()))
            .field("tool", &self.engine.active_tool())
            .field("undo", &self.history.undo_count())
            .field("redo", &self.history.redo_count())
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl Editor {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            canvas: None,
            history: HistoryStack::new(config.max_history),
            selection: SelectionClipboard::new(),
            options: ToolOptions::default(),
            engine: ToolEngine::new(),
            text: TextRenderer::new(),
            default_size: (config.default_width.max(1), config.default_height.max(1)),
            dirty: false,
            listeners: Vec::new(),
        }
    }

    /// Editor with an existing canvas of the given size.
    pub fn with_canvas(width: u32, height: u32) -> Result<Self, CanvasError> {
        let mut editor = Self::default();
        editor.canvas = Some(RasterCanvas::new(width, height)?);
        Ok(editor)
    }

    pub fn set_text_renderer(&mut self, text: TextRenderer) {
        self.text = text;
    }

    pub fn subscribe(&mut self, listener: impl Fn(&EditorEvent) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn emit(&self, event: EditorEvent) {
        for listener in &self.listeners {
            listener(&event);
        }
    }

    // ------------------------------------------------------------------------
    //  Queries
    // ------------------------------------------------------------------------

    pub fn has_canvas(&self) -> bool {
        self.canvas.is_some()
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.canvas.as_ref().map(|c| c.dimensions())
    }

    /// Current bitmap, if a canvas exists yet.
    pub fn image(&self) -> Option<&RgbaImage> {
        self.canvas.as_ref().map(|c| c.image())
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgba<u8>> {
        self.canvas.as_ref()?.pixel(x, y)
    }

    pub fn history(&self) -> &HistoryStack {
        &self.history
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection.selection()
    }

    pub fn clipboard(&self) -> Option<&RgbaImage> {
        self.selection.clipboard()
    }

    pub fn options(&self) -> &ToolOptions {
        &self.options
    }

    /// Options are read at each gesture event, so changes apply to the next one.
    pub fn options_mut(&mut self) -> &mut ToolOptions {
        &mut self.options
    }

    pub fn tool(&self) -> Tool {
        self.engine.active_tool()
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.engine.set_tool(tool);
    }

    // ------------------------------------------------------------------------
    //  Dirty tracking
    // ------------------------------------------------------------------------

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    fn touch(&mut self) {
        self.dirty = true;
        self.emit(EditorEvent::CanvasChanged);
    }

    fn history_event(&self) {
        self.emit(EditorEvent::HistoryChanged {
            undo: self.history.undo_count(),
            redo: self.history.redo_count(),
        });
    }

    /// Snapshot the current buffer and invalidate redo before an edit.
    fn begin_edit(&mut self) {
        if let Some(canvas) = &self.canvas {
            self.history.push(canvas.image());
            self.history.clear_redo();
        }
    }

    // ------------------------------------------------------------------------
    //  Pointer input
    // ------------------------------------------------------------------------

    pub fn pointer_pressed(&mut self, p: Point) {
        let (w, h) = self.default_size;
        let canvas = self.canvas.get_or_insert_with(|| {
            log::info!("creating {}x{} canvas", w, h);
            RasterCanvas::blank(w, h)
        });
        let mut ctx = ToolContext {
            canvas,
            history: &mut self.history,
            selection: &mut self.selection,
            options: &mut self.options,
            text: &self.text,
        };
        let outcome = self.engine.press(&mut ctx, p);
        self.apply_outcome(outcome);
    }

    pub fn pointer_dragged(&mut self, p: Point) {
        let Some(canvas) = self.canvas.as_mut() else {
            return;
        };
        let mut ctx = ToolContext {
            canvas,
            history: &mut self.history,
            selection: &mut self.selection,
            options: &mut self.options,
            text: &self.text,
        };
        let outcome = self.engine.drag(&mut ctx, p);
        self.apply_outcome(outcome);
    }

    pub fn pointer_released(&mut self, p: Point) {
        let Some(canvas) = self.canvas.as_mut() else {
            return;
        };
        let mut ctx = ToolContext {
            canvas,
            history: &mut self.history,
            selection: &mut self.selection,
            options: &mut self.options,
            text: &self.text,
        };
        let outcome = self.engine.release(&mut ctx, p);
        self.apply_outcome(outcome);
    }

    fn apply_outcome(&mut self, outcome: ToolOutcome) {
        if outcome.history_changed {
            self.history_event();
        }
        if outcome.canvas_changed {
            self.touch();
        }
        if outcome.selection_changed {
            self.emit(EditorEvent::SelectionChanged(self.selection.selection()));
        }
        if outcome.clipboard_changed {
            self.emit(EditorEvent::ClipboardChanged);
        }
        if let Some(color) = outcome.color_picked {
            self.emit(EditorEvent::ColorPicked(color));
        }
    }

    // ------------------------------------------------------------------------
    //  History
    // ------------------------------------------------------------------------

    /// Returns `false` when there was nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(canvas) = self.canvas.as_mut() else {
            return false;
        };
        let Some(previous) = self.history.undo(canvas.image()) else {
            return false;
        };
        if let Err(e) = canvas.replace(previous) {
            log::error!("undo produced an invalid buffer: {}", e);
            return false;
        }
        self.history_event();
        self.touch();
        true
    }

    /// Returns `false` when there was nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(canvas) = self.canvas.as_mut() else {
            return false;
        };
        let Some(next) = self.history.redo(canvas.image()) else {
            return false;
        };
        if let Err(e) = canvas.replace(next) {
            log::error!("redo produced an invalid buffer: {}", e);
            return false;
        }
        self.history_event();
        self.touch();
        true
    }

    // ------------------------------------------------------------------------
    //  Whole-canvas operations
    // ------------------------------------------------------------------------

    /// Resize to `width`×`height`, keeping content anchored top-left.
    /// Non-positive or oversized dimensions are rejected and leave the canvas untouched.
    /// Any accepted resize, same size included, snapshots and clears redo.
    pub fn resize(&mut self, width: i64, height: i64) -> Result<(), EditorError> {
        if width <= 0 || height <= 0 {
            return Err(EditorError::InvalidSize(format!(
                "dimensions must be positive, got {}x{}",
                width, height
            )));
        }
        if width > MAX_CANVAS_SIDE || height > MAX_CANVAS_SIDE {
            return Err(EditorError::InvalidSize(format!(
                "dimensions may not exceed {}, got {}x{}",
                MAX_CANVAS_SIDE, width, height
            )));
        }
        let (w, h) = (width as u32, height as u32);

        match self.canvas.as_mut() {
            None => {
                self.canvas = Some(RasterCanvas::new(w, h)?);
            }
            Some(_) => {
                self.begin_edit();
                if let Some(canvas) = self.canvas.as_mut() {
                    canvas.resize(w, h)?;
                }
                self.history_event();
            }
        }
        log::info!("canvas resized to {}x{}", w, h);
        self.touch();
        Ok(())
    }

    /// Resize from raw text fields, as typed by a user.
    pub fn resize_from_input(&mut self, width: &str, height: &str) -> Result<(), EditorError> {
        let parse = |s: &str| {
            s.trim()
                .parse::<i64>()
                .map_err(|_| EditorError::InvalidSize(format!("'{}' is not a whole number", s.trim())))
        };
        let w = parse(width)?;
        let h = parse(height)?;
        self.resize(w, h)
    }

    /// Fill with background. Undoable.
    pub fn clear(&mut self) {
        if self.canvas.is_none() {
            return;
        }
        self.begin_edit();
        if let Some(canvas) = self.canvas.as_mut() {
            canvas.clear();
        }
        self.history_event();
        self.touch();
    }

    /// Rotate the selection, or the whole canvas when nothing is selected.
    /// Returns whether anything changed; multiples of 360 are a no-op.
    pub fn rotate(&mut self, degrees: i64) -> Result<bool, EditorError> {
        let Some(turn) = QuarterTurn::from_degrees(degrees)? else {
            return Ok(false);
        };
        let Some(canvas) = self.canvas.as_ref() else {
            return Ok(false);
        };
        let selected = self.selection.selection().map(|s| s.region());
        let Some(target) = transform::resolve_target(canvas, selected) else {
            return Ok(false);
        };

        self.begin_edit();
        if let Some(canvas) = self.canvas.as_mut() {
            transform::rotate(canvas, target, turn)?;
        }
        log::debug!("rotated {:?} by {}", target, turn.degrees());
        self.history_event();
        self.touch();
        Ok(true)
    }

    /// Mirror the selection, or the whole canvas when nothing is selected.
    pub fn flip(&mut self, axis: FlipAxis) -> Result<bool, EditorError> {
        let Some(canvas) = self.canvas.as_ref() else {
            return Ok(false);
        };
        let selected = self.selection.selection().map(|s| s.region());
        let Some(target) = transform::resolve_target(canvas, selected) else {
            return Ok(false);
        };

        self.begin_edit();
        if let Some(canvas) = self.canvas.as_mut() {
            transform::flip(canvas, target, axis)?;
        }
        self.history_event();
        self.touch();
        Ok(true)
    }

    // ------------------------------------------------------------------------
    //  Selection & clipboard
    // ------------------------------------------------------------------------

    /// Replace the selection with a rectangle spanning two corners.
    pub fn select(&mut self, from: Point, to: Point) {
        self.selection.start_selection(from);
        self.selection.update_selection(to);
        self.selection.finish_selection();
        self.emit(EditorEvent::SelectionChanged(self.selection.selection()));
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear_selection();
        self.emit(EditorEvent::SelectionChanged(None));
    }

    /// Copy the selection into the clipboard. `false` when nothing was copied.
    pub fn copy_selection(&mut self) -> bool {
        let Some(canvas) = self.canvas.as_ref() else {
            return false;
        };
        let copied = self.selection.copy(canvas);
        if copied {
            self.emit(EditorEvent::ClipboardChanged);
        }
        copied
    }

    /// Composite the clipboard at `at`. Undoable; `false` when the clipboard is empty.
    pub fn paste_at(&mut self, at: Point) -> bool {
        if !self.selection.has_clipboard() || self.canvas.is_none() {
            return false;
        }
        self.begin_edit();
        if let Some(canvas) = self.canvas.as_mut() {
            self.selection.paste(canvas, at);
        }
        self.history_event();
        self.touch();
        true
    }

    /// Draw a segment with the current options, as one undoable edit.
    pub fn stroke(&mut self, from: Point, to: Point) {
        let (w, h) = self.default_size;
        self.canvas.get_or_insert_with(|| RasterCanvas::blank(w, h));
        self.begin_edit();
        if let Some(canvas) = self.canvas.as_mut() {
            canvas.draw_segment(
                from,
                to,
                self.options.color(),
                self.options.stroke_width() as f32,
                self.options.dashed(),
            );
        }
        self.history_event();
        self.touch();
    }

    // ------------------------------------------------------------------------
    //  Bitmap exchange
    // ------------------------------------------------------------------------

    /// Replace the canvas with a loaded bitmap. History restarts with one
    /// snapshot of the new image and the selection is dropped; the clipboard
    /// is kept.
    pub fn set_image(&mut self, image: RgbaImage) -> Result<(), CanvasError> {
        let canvas = RasterCanvas::from_image(image)?;
        self.history.clear();
        self.history.push(canvas.image());
        self.canvas = Some(canvas);
        self.selection.clear_selection();
        self.engine.cancel_gesture();
        self.dirty = false;
        self.history_event();
        self.emit(EditorEvent::CanvasChanged);
        Ok(())
    }

    /// Owned copy of the current bitmap.
    pub fn snapshot_image(&self) -> Option<RgbaImage> {
        self.image().cloned()
    }
}
