use std::sync::{Arc, Mutex};

use image::Rgba;
use rhai::{AST, Array, Dynamic, Engine, EvalAltResult, Position, Scope};
use thiserror::Error;

use crate::canvas::Point;
use crate::components::tools::Tool;
use crate::editor::Editor;
use crate::ops::shapes::ShapeKind;
use crate::ops::transform::FlipAxis;

// ============================================================================
// Error type
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}{}", location(.line, .column), .message)]
pub struct ScriptError {
    pub message: String,
    pub line: Option<usize>,
    pub column: Option<usize>,
}

fn location(line: &Option<usize>, column: &Option<usize>) -> String {
    match (line, column) {
        (Some(line), Some(col)) => format!("Line {}, Col {}: ", line, col),
        (Some(line), None) => format!("Line {}: ", line),
        _ => String::new(),
    }
}

impl ScriptError {
    fn at(message: String, pos: Position) -> Self {
        Self {
            message,
            line: pos.line().filter(|l| *l > 0),
            column: pos.position().filter(|c| *c > 0),
        }
    }
}

type ScriptResult<T> = Result<T, Box<EvalAltResult>>;

// ============================================================================
// Script context: the editor under script control plus captured output
// ============================================================================

struct ScriptContext {
    editor: Editor,
    console_output: Vec<String>,
}

type SharedContext = Arc<Mutex<ScriptContext>>;

/// Run `f` against the editor with the context locked.
fn with_editor<T>(ctx: &SharedContext, f: impl FnOnce(&mut Editor) -> T) -> T {
    let mut lock = ctx.lock().unwrap_or_else(|e| e.into_inner());
    f(&mut lock.editor)
}

fn to_point(x: i64, y: i64) -> Point {
    Point::new(
        x.clamp(i32::MIN as i64, i32::MAX as i64) as i32,
        y.clamp(i32::MIN as i64, i32::MAX as i64) as i32,
    )
}

fn channel(v: i64) -> u8 {
    v.clamp(0, 255) as u8
}

fn positive(v: i64) -> u32 {
    v.clamp(1, u32::MAX as i64) as u32
}

// ============================================================================
// Engine construction with sandbox + API registration
// ============================================================================

fn create_engine(ctx: SharedContext) -> Engine {
    let mut engine = Engine::new();

    // Sandbox limits
    engine.set_max_operations(50_000_000);
    engine.set_max_call_levels(64);
    engine.set_max_expr_depths(64, 64);
    engine.set_max_string_size(10_000);
    engine.set_max_array_size(10_000);
    engine.set_max_map_size(1_000);

    register_option_api(&mut engine, ctx.clone());
    register_gesture_api(&mut engine, ctx.clone());
    register_edit_api(&mut engine, ctx.clone());
    register_query_api(&mut engine, ctx.clone());

    let c = ctx;
    engine.on_print(move |msg| {
        let mut lock = c.lock().unwrap_or_else(|e| e.into_inner());
        log::debug!("script: {}", msg);
        lock.console_output.push(msg.to_string());
    });

    engine
}

// ============================================================================
// Tool & option setters
// ============================================================================

fn register_option_api(engine: &mut Engine, ctx: SharedContext) {
    let c = ctx.clone();
    engine.register_fn("set_tool", move |name: &str| -> ScriptResult<()> {
        let tool = Tool::from_name(name).ok_or_else(|| format!("Unknown tool '{}'", name))?;
        with_editor(&c, |e| e.set_tool(tool));
        Ok(())
    });

    let c = ctx.clone();
    engine.register_fn("tool", move || -> String {
        with_editor(&c, |e| e.tool().label().to_string())
    });

    let c = ctx.clone();
    engine.register_fn("set_color", move |r: i64, g: i64, b: i64| {
        with_editor(&c, |e| {
            e.options_mut()
                .set_color(Rgba([channel(r), channel(g), channel(b), 255]))
        });
    });

    let c = ctx.clone();
    engine.register_fn("set_color", move |r: i64, g: i64, b: i64, a: i64| {
        with_editor(&c, |e| {
            e.options_mut()
                .set_color(Rgba([channel(r), channel(g), channel(b), channel(a)]))
        });
    });

    let c = ctx.clone();
    engine.register_fn("set_stroke_width", move |w: i64| {
        with_editor(&c, |e| e.options_mut().set_stroke_width(positive(w)));
    });

    let c = ctx.clone();
    engine.register_fn("set_dashed", move |dashed: bool| {
        with_editor(&c, |e| e.options_mut().set_dashed(dashed));
    });

    let c = ctx.clone();
    engine.register_fn("set_shape", move |name: &str| -> ScriptResult<()> {
        let shape = ShapeKind::from_name(name).ok_or_else(|| format!("Unknown shape '{}'", name))?;
        with_editor(&c, |e| e.options_mut().set_shape(shape));
        Ok(())
    });

    let c = ctx.clone();
    engine.register_fn("set_sides", move |n: i64| {
        with_editor(&c, |e| e.options_mut().set_polygon_sides(positive(n)));
    });

    let c = ctx.clone();
    engine.register_fn("set_text", move |text: &str| {
        with_editor(&c, |e| e.options_mut().set_text(text));
    });

    let c = ctx;
    engine.register_fn("set_text_size", move |size: i64| {
        with_editor(&c, |e| e.options_mut().set_text_size(positive(size)));
    });
}

// ============================================================================
// Pointer gestures
// ============================================================================

fn register_gesture_api(engine: &mut Engine, ctx: SharedContext) {
    let c = ctx.clone();
    engine.register_fn("press", move |x: i64, y: i64| {
        with_editor(&c, |e| e.pointer_pressed(to_point(x, y)));
    });

    let c = ctx.clone();
    engine.register_fn("drag", move |x: i64, y: i64| {
        with_editor(&c, |e| e.pointer_dragged(to_point(x, y)));
    });

    let c = ctx.clone();
    engine.register_fn("release", move |x: i64, y: i64| {
        with_editor(&c, |e| e.pointer_released(to_point(x, y)));
    });

    // stroke(x1, y1, x2, y2): one undoable segment with the current options
    let c = ctx;
    engine.register_fn("stroke", move |x1: i64, y1: i64, x2: i64, y2: i64| {
        with_editor(&c, |e| e.stroke(to_point(x1, y1), to_point(x2, y2)));
    });
}

// ============================================================================
// Edits: selection, clipboard, history, whole-canvas operations
// ============================================================================

fn register_edit_api(engine: &mut Engine, ctx: SharedContext) {
    let c = ctx.clone();
    engine.register_fn("select", move |x1: i64, y1: i64, x2: i64, y2: i64| {
        with_editor(&c, |e| e.select(to_point(x1, y1), to_point(x2, y2)));
    });

    let c = ctx.clone();
    engine.register_fn("clear_selection", move || {
        with_editor(&c, |e| e.clear_selection());
    });

    let c = ctx.clone();
    engine.register_fn("copy", move || -> bool { with_editor(&c, |e| e.copy_selection()) });

    let c = ctx.clone();
    engine.register_fn("paste", move |x: i64, y: i64| -> bool {
        with_editor(&c, |e| e.paste_at(to_point(x, y)))
    });

    let c = ctx.clone();
    engine.register_fn("undo", move || -> bool { with_editor(&c, |e| e.undo()) });

    let c = ctx.clone();
    engine.register_fn("redo", move || -> bool { with_editor(&c, |e| e.redo()) });

    let c = ctx.clone();
    engine.register_fn("clear", move || {
        with_editor(&c, |e| e.clear());
    });

    let c = ctx.clone();
    engine.register_fn("resize", move |w: i64, h: i64| -> ScriptResult<()> {
        with_editor(&c, |e| e.resize(w, h)).map_err(|err| err.to_string().into())
    });

    let c = ctx.clone();
    engine.register_fn("rotate", move |degrees: i64| -> ScriptResult<bool> {
        with_editor(&c, |e| e.rotate(degrees)).map_err(|err| err.to_string().into())
    });

    let c = ctx.clone();
    engine.register_fn("flip_horizontal", move || -> ScriptResult<bool> {
        with_editor(&c, |e| e.flip(FlipAxis::Horizontal)).map_err(|err| err.to_string().into())
    });

    let c = ctx;
    engine.register_fn("flip_vertical", move || -> ScriptResult<bool> {
        with_editor(&c, |e| e.flip(FlipAxis::Vertical)).map_err(|err| err.to_string().into())
    });
}

// ============================================================================
// Queries
// ============================================================================

fn register_query_api(engine: &mut Engine, ctx: SharedContext) {
    let c = ctx.clone();
    engine.register_fn("width", move || -> i64 {
        with_editor(&c, |e| e.dimensions().map_or(0, |(w, _)| w as i64))
    });

    let c = ctx.clone();
    engine.register_fn("height", move || -> i64 {
        with_editor(&c, |e| e.dimensions().map_or(0, |(_, h)| h as i64))
    });

    // get_pixel(x, y) -> [r, g, b, a], or [] outside the canvas
    let c = ctx;
    engine.register_fn("get_pixel", move |x: i64, y: i64| -> Array {
        let p = to_point(x, y);
        match with_editor(&c, |e| e.pixel(p.x, p.y)) {
            Some(Rgba(px)) => px.iter().map(|v| Dynamic::from(*v as i64)).collect(),
            None => Array::new(),
        }
    });
}

// ============================================================================
// Public execution API
// ============================================================================

/// Compile without running, to reject broken scripts before any file is touched.
pub fn compile_script(source: &str) -> Result<AST, ScriptError> {
    Engine::new()
        .compile(source)
        .map_err(|e| ScriptError::at(e.to_string(), e.position()))
}

/// Run `source` against `editor` on the calling thread and return the lines
/// the script printed. Edits made before a runtime error are kept.
pub fn run_script(source: &str, editor: &mut Editor) -> Result<Vec<String>, ScriptError> {
    let ctx = Arc::new(Mutex::new(ScriptContext {
        editor: std::mem::take(editor),
        console_output: Vec::new(),
    }));

    let result = {
        let engine = create_engine(ctx.clone());
        let mut scope = Scope::new();
        engine
            .compile(source)
            .map_err(|e| ScriptError::at(e.to_string(), e.position()))
            .and_then(|ast| {
                engine
                    .run_ast_with_scope(&mut scope, &ast)
                    .map_err(|e| ScriptError::at(e.to_string(), e.position()))
            })
    };

    let mut lock = ctx.lock().unwrap_or_else(|e| e.into_inner());
    *editor = std::mem::take(&mut lock.editor);
    let output = std::mem::take(&mut lock.console_output);
    match result {
        Ok(()) => {
            log::info!("script finished ({} line(s) of output)", output.len());
            Ok(output)
        }
        Err(e) => {
            log::warn!("script failed: {}", e);
            Err(e)
        }
    }
}
