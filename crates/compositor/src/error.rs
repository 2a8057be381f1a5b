//! Compositor / display error types

use contracts::CameraPosition;
use thiserror::Error;

/// Composite and display errors
#[derive(Debug, Error)]
pub enum DisplayError {
    /// Nothing to compose
    #[error("no frames to compose")]
    EmptyFrameSet,

    /// Frames cannot be concatenated horizontally
    #[error("{camera} frame height {actual} differs from {expected}")]
    HeightMismatch {
        camera: CameraPosition,
        expected: u32,
        actual: u32,
    },

    /// Frame buffer does not match its dimensions
    #[error("{camera} frame buffer is malformed: {message}")]
    BadFrame {
        camera: CameraPosition,
        message: String,
    },

    /// Window backend failure
    #[error("window error: {message}")]
    Window { message: String },

    /// Image encode error
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DisplayError {
    pub fn window(message: impl Into<String>) -> Self {
        Self::Window {
            message: message.into(),
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, DisplayError>;
