// ============================================================================
// ERROR TYPES - one enum per module boundary
// ============================================================================

use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by the pixel buffer itself.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CanvasError {
    #[error("canvas dimensions must be positive, got {width}x{height}")]
    InvalidDimensions { width: i64, height: i64 },
}

/// Failures surfaced by the editor controller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EditorError {
    /// Resize input that is not a positive integer pair.
    #[error("Invalid size input: {0}")]
    InvalidSize(String),

    #[error("rotation of {0} degrees is not supported (multiples of 90 only)")]
    UnsupportedAngle(i64),

    #[error(transparent)]
    Canvas(#[from] CanvasError),
}

/// Bitmap load/save failures. These never touch the editor state.
#[derive(Debug, Error)]
pub enum BitmapIoError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("no canvas to save")]
    NothingToSave,
}

/// Export server start-up or runtime failures.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("could not bind export server to port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("export server stopped: {0}")]
    Serve(#[source] std::io::Error),
}
