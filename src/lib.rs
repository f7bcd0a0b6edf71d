//! rasterpad: a single-layer raster editor core.
//!
//! The [`editor::Editor`] owns one RGBA canvas and routes pointer gestures to
//! the active tool, keeping undo/redo snapshots, a rectangular selection and
//! an internal clipboard. Around it sit bitmap I/O, an autosave scheduler,
//! an HTTP export server, a Rhai scripting driver and the batch CLI.

pub mod autosave;
pub mod canvas;
pub mod cli;
pub mod components;
pub mod editor;
pub mod error;
pub mod export;
pub mod io;
pub mod logger;
pub mod ops;
pub mod settings;

pub use canvas::{Point, RasterCanvas, Region};
pub use editor::{Editor, EditorConfig, EditorEvent};
