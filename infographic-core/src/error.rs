//! Error types shared by the compositor and its helpers.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for compositor operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// A drawing operation ran before `create_canvas`.
    #[error("Canvas not created: call create_canvas before drawing")]
    CanvasNotInitialized,

    #[error("Invalid canvas size {width}x{height}: both dimensions must be positive")]
    InvalidCanvasSize { width: u32, height: u32 },

    /// A font file could not be read or parsed.
    #[error("Failed to load font {}: {reason}", path.display())]
    FontLoad { path: PathBuf, reason: String },

    /// Fallback policy was requested but the system has no usable face.
    #[error("No system fallback font available")]
    NoFallbackFont,

    #[error("Failed to read image {}: {source}", path.display())]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Invalid color: {0:?}")]
    InvalidColor(String),

    #[error("Invalid grid: {0}")]
    InvalidGrid(String),

    /// Fewer eligible images than a grid needs. Never padded with placeholders.
    #[error("Not enough images to sample: {available} available, {requested} required")]
    InsufficientSamples { available: usize, requested: usize },

    #[error("Rendering failed: {0}")]
    Render(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Failure reported by an external collaborator (storage, publishing).
    #[error("Collaborator error: {0}")]
    Collaborator(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    PngEncoding(#[from] png::EncodingError),
}
