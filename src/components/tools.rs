use image::Rgba;

use crate::canvas::{BACKGROUND, Point, RasterCanvas};
use crate::components::history::HistoryStack;
use crate::ops::clipboard::SelectionClipboard;
use crate::ops::shapes::{ShapeKind, draw_shape};
use crate::ops::text::TextRenderer;

// ============================================================================
// TOOL IDENTITY
// ============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Tool {
    #[default]
    Pencil,
    Eraser,
    Shape,
    Text,
    Eyedropper,
    Select,
    Copy,
    Paste,
}

impl Tool {
    pub fn label(&self) -> &'static str {
        match self {
            Tool::Pencil => "Pencil",
            Tool::Eraser => "Eraser",
            Tool::Shape => "Shape",
            Tool::Text => "Text",
            Tool::Eyedropper => "Eyedropper",
            Tool::Select => "Select",
            Tool::Copy => "Copy",
            Tool::Paste => "Paste",
        }
    }

    pub fn all() -> &'static [Tool] {
        &[
            Tool::Pencil,
            Tool::Eraser,
            Tool::Shape,
            Tool::Text,
            Tool::Eyedropper,
            Tool::Select,
            Tool::Copy,
            Tool::Paste,
        ]
    }

    /// Lenient name lookup used by scripts.
    pub fn from_name(name: &str) -> Option<Tool> {
        match name.trim().to_lowercase().as_str() {
            "pencil" | "draw" | "brush" => Some(Tool::Pencil),
            "eraser" => Some(Tool::Eraser),
            "shape" => Some(Tool::Shape),
            "text" => Some(Tool::Text),
            "eyedropper" | "picker" => Some(Tool::Eyedropper),
            "select" => Some(Tool::Select),
            "copy" => Some(Tool::Copy),
            "paste" => Some(Tool::Paste),
            _ => None,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

// ============================================================================
// TOOL OPTIONS
// ============================================================================

pub const DEFAULT_STROKE_WIDTH: u32 = 3;
pub const DEFAULT_POLYGON_SIDES: u32 = 5;
pub const DEFAULT_TEXT_SIZE: u32 = 24;

/// Settings every tool reads at the moment of each gesture event.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolOptions {
    color: Rgba<u8>,
    stroke_width: u32,
    dashed: bool,
    shape: ShapeKind,
    polygon_sides: u32,
    text: String,
    text_size: u32,
}

impl Default for ToolOptions {
    fn default() -> Self {
        Self {
            color: Rgba([0, 0, 0, 255]),
            stroke_width: DEFAULT_STROKE_WIDTH,
            dashed: false,
            shape: ShapeKind::Rectangle,
            polygon_sides: DEFAULT_POLYGON_SIDES,
            text: String::new(),
            text_size: DEFAULT_TEXT_SIZE,
        }
    }
}

impl ToolOptions {
    pub fn color(&self) -> Rgba<u8> {
        self.color
    }

    pub fn set_color(&mut self, color: Rgba<u8>) {
        self.color = color;
    }

    pub fn stroke_width(&self) -> u32 {
        self.stroke_width
    }

    /// Clamped to at least 1.
    pub fn set_stroke_width(&mut self, width: u32) {
        self.stroke_width = width.max(1);
    }

    pub fn dashed(&self) -> bool {
        self.dashed
    }

    pub fn set_dashed(&mut self, dashed: bool) {
        self.dashed = dashed;
    }

    pub fn shape(&self) -> ShapeKind {
        self.shape
    }

    pub fn set_shape(&mut self, shape: ShapeKind) {
        self.shape = shape;
    }

    pub fn polygon_sides(&self) -> u32 {
        self.polygon_sides
    }

    /// Clamped to at least 3.
    pub fn set_polygon_sides(&mut self, sides: u32) {
        self.polygon_sides = sides.max(3);
    }

    /// Stars need at least four points.
    pub fn star_points(&self) -> u32 {
        self.polygon_sides.max(4)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn text_size(&self) -> u32 {
        self.text_size
    }

    /// Clamped to at least 1.
    pub fn set_text_size(&mut self, size: u32) {
        self.text_size = size.max(1);
    }
}

// ============================================================================
// HANDLERS
// ============================================================================

/// Mutable view of the editor state a tool may touch during one event.
pub struct ToolContext<'a> {
    pub canvas: &'a mut RasterCanvas,
    pub history: &'a mut HistoryStack,
    pub selection: &'a mut SelectionClipboard,
    pub options: &'a mut ToolOptions,
    pub text: &'a TextRenderer,
}

impl ToolContext<'_> {
    /// Record the current buffer and invalidate redo; the start of any edit.
    fn snapshot(&mut self) {
        self.history.push(self.canvas.image());
        self.history.clear_redo();
    }
}

/// Points of the gesture in progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Gesture {
    pub tool: Tool,
    pub start: Point,
    pub last: Point,
}

/// What one event changed, for the editor's notifications.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ToolOutcome {
    pub canvas_changed: bool,
    pub history_changed: bool,
    pub selection_changed: bool,
    pub clipboard_changed: bool,
    pub color_picked: Option<Rgba<u8>>,
}

impl ToolOutcome {
    fn canvas() -> Self {
        Self { canvas_changed: true, ..Self::default() }
    }

    fn selection() -> Self {
        Self { selection_changed: true, ..Self::default() }
    }

    fn merge(mut self, other: ToolOutcome) -> Self {
        self.canvas_changed |= other.canvas_changed;
        self.history_changed |= other.history_changed;
        self.selection_changed |= other.selection_changed;
        self.clipboard_changed |= other.clipboard_changed;
        self.color_picked = other.color_picked.or(self.color_picked);
        self
    }
}

/// Per-tool press/drag/release callbacks.
pub trait ToolHandler: Send + Sync {
    /// Mutating tools get a history snapshot (and a cleared redo stack) on press.
    fn is_mutating(&self) -> bool;

    fn on_press(&self, _ctx: &mut ToolContext<'_>, _gesture: &Gesture) -> ToolOutcome {
        ToolOutcome::default()
    }

    fn on_drag(&self, _ctx: &mut ToolContext<'_>, _gesture: &Gesture, _to: Point) -> ToolOutcome {
        ToolOutcome::default()
    }

    fn on_release(&self, _ctx: &mut ToolContext<'_>, _gesture: &Gesture, _at: Point) -> ToolOutcome {
        ToolOutcome::default()
    }
}

struct PencilTool;
struct EraserTool;
struct ShapeTool;
struct TextTool;
struct EyedropperTool;
struct SelectTool;
struct CopyTool;
struct PasteTool;

fn stroke_to(ctx: &mut ToolContext<'_>, from: Point, to: Point, color: Rgba<u8>) -> ToolOutcome {
    let width = ctx.options.stroke_width() as f32;
    let dashed = ctx.options.dashed();
    ctx.canvas.draw_segment(from, to, color, width, dashed);
    ToolOutcome::canvas()
}

impl ToolHandler for PencilTool {
    fn is_mutating(&self) -> bool {
        true
    }

    fn on_drag(&self, ctx: &mut ToolContext<'_>, gesture: &Gesture, to: Point) -> ToolOutcome {
        let color = ctx.options.color();
        stroke_to(ctx, gesture.last, to, color)
    }
}

impl ToolHandler for EraserTool {
    fn is_mutating(&self) -> bool {
        true
    }

    fn on_drag(&self, ctx: &mut ToolContext<'_>, gesture: &Gesture, to: Point) -> ToolOutcome {
        stroke_to(ctx, gesture.last, to, BACKGROUND)
    }
}

impl ToolHandler for ShapeTool {
    fn is_mutating(&self) -> bool {
        true
    }

    fn on_release(&self, ctx: &mut ToolContext<'_>, gesture: &Gesture, at: Point) -> ToolOutcome {
        let opts = &ctx.options;
        draw_shape(
            ctx.canvas,
            opts.shape(),
            gesture.start,
            at,
            opts.polygon_sides(),
            opts.color(),
            opts.stroke_width() as f32,
            opts.dashed(),
        );
        ToolOutcome::canvas()
    }
}

impl ToolHandler for TextTool {
    fn is_mutating(&self) -> bool {
        true
    }

    /// Rendering is a separate snapshot-then-mutate step on top of the press snapshot.
    fn on_release(&self, ctx: &mut ToolContext<'_>, _gesture: &Gesture, at: Point) -> ToolOutcome {
        if ctx.options.text().is_empty() || !ctx.text.has_font() {
            log::debug!("text tool released with nothing to render");
            return ToolOutcome::default();
        }
        ctx.snapshot();
        let rendered = ctx.text.render(
            ctx.canvas,
            ctx.options.text(),
            ctx.options.text_size() as f32,
            at,
            ctx.options.color(),
        );
        ToolOutcome {
            canvas_changed: rendered,
            history_changed: true,
            ..ToolOutcome::default()
        }
    }
}

impl ToolHandler for EyedropperTool {
    fn is_mutating(&self) -> bool {
        false
    }

    fn on_press(&self, ctx: &mut ToolContext<'_>, gesture: &Gesture) -> ToolOutcome {
        match ctx.canvas.pixel(gesture.start.x, gesture.start.y) {
            Some(color) => {
                ctx.options.set_color(color);
                ToolOutcome { color_picked: Some(color), ..ToolOutcome::default() }
            }
            None => ToolOutcome::default(),
        }
    }
}

impl ToolHandler for SelectTool {
    fn is_mutating(&self) -> bool {
        false
    }

    fn on_press(&self, ctx: &mut ToolContext<'_>, gesture: &Gesture) -> ToolOutcome {
        ctx.selection.start_selection(gesture.start);
        ToolOutcome::selection()
    }

    fn on_drag(&self, ctx: &mut ToolContext<'_>, _gesture: &Gesture, to: Point) -> ToolOutcome {
        ctx.selection.update_selection(to);
        ToolOutcome::selection()
    }

    fn on_release(&self, ctx: &mut ToolContext<'_>, _gesture: &Gesture, at: Point) -> ToolOutcome {
        ctx.selection.update_selection(at);
        ctx.selection.finish_selection();
        ToolOutcome::selection()
    }
}

impl ToolHandler for CopyTool {
    fn is_mutating(&self) -> bool {
        false
    }

    fn on_press(&self, ctx: &mut ToolContext<'_>, _gesture: &Gesture) -> ToolOutcome {
        let copied = ctx.selection.copy(ctx.canvas);
        ToolOutcome { clipboard_changed: copied, ..ToolOutcome::default() }
    }
}

impl ToolHandler for PasteTool {
    fn is_mutating(&self) -> bool {
        true
    }

    fn on_press(&self, ctx: &mut ToolContext<'_>, gesture: &Gesture) -> ToolOutcome {
        if ctx.selection.paste(ctx.canvas, gesture.start) {
            ToolOutcome::canvas()
        } else {
            ToolOutcome::default()
        }
    }
}

/// Dispatch table, indexed by `Tool` discriminant.
static HANDLERS: [&dyn ToolHandler; 8] = [
    &PencilTool,
    &EraserTool,
    &ShapeTool,
    &TextTool,
    &EyedropperTool,
    &SelectTool,
    &CopyTool,
    &PasteTool,
];

pub fn handler_for(tool: Tool) -> &'static dyn ToolHandler {
    HANDLERS[tool.index()]
}

// ============================================================================
// TOOL ENGINE - pointer gesture state machine
// ============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GestureState {
    #[default]
    Idle,
    Pressed(Gesture),
    Dragging(Gesture),
}

/// Interprets press/drag/release events against the active tool.
#[derive(Debug, Default)]
pub struct ToolEngine {
    active: Tool,
    state: GestureState,
}

impl ToolEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_tool(&self) -> Tool {
        self.active
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    /// Switch tools. Any gesture in progress is abandoned.
    pub fn set_tool(&mut self, tool: Tool) {
        self.active = tool;
        self.state = GestureState::Idle;
    }

    /// Drop any gesture in progress without calling its handler.
    pub fn cancel_gesture(&mut self) {
        self.state = GestureState::Idle;
    }

    pub fn press(&mut self, ctx: &mut ToolContext<'_>, p: Point) -> ToolOutcome {
        let tool = self.active;
        let handler = handler_for(tool);
        let mut outcome = ToolOutcome::default();
        if handler.is_mutating() {
            ctx.snapshot();
            outcome.history_changed = true;
        }
        let gesture = Gesture { tool, start: p, last: p };
        outcome = outcome.merge(handler.on_press(ctx, &gesture));
        self.state = GestureState::Pressed(gesture);
        outcome
    }

    pub fn drag(&mut self, ctx: &mut ToolContext<'_>, p: Point) -> ToolOutcome {
        let mut gesture = match self.state {
            GestureState::Idle => return ToolOutcome::default(),
            GestureState::Pressed(g) | GestureState::Dragging(g) => g,
        };
        let outcome = handler_for(gesture.tool).on_drag(ctx, &gesture, p);
        gesture.last = p;
        self.state = GestureState::Dragging(gesture);
        outcome
    }

    pub fn release(&mut self, ctx: &mut ToolContext<'_>, p: Point) -> ToolOutcome {
        let gesture = match self.state {
            GestureState::Idle => return ToolOutcome::default(),
            GestureState::Pressed(g) | GestureState::Dragging(g) => g,
        };
        self.state = GestureState::Idle;
        handler_for(gesture.tool).on_release(ctx, &gesture, p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_table_matches_tool_order() {
        assert_eq!(Tool::all().len(), HANDLERS.len());
        let mutating: Vec<Tool> = Tool::all()
            .iter()
            .copied()
            .filter(|t| handler_for(*t).is_mutating())
            .collect();
        assert_eq!(
            mutating,
            vec![Tool::Pencil, Tool::Eraser, Tool::Shape, Tool::Text, Tool::Paste]
        );
    }

    #[test]
    fn options_clamp() {
        let mut o = ToolOptions::default();
        o.set_stroke_width(0);
        o.set_polygon_sides(1);
        assert_eq!(o.stroke_width(), 1);
        assert_eq!(o.polygon_sides(), 3);
        assert_eq!(o.star_points(), 4);
    }
}
