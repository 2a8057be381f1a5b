//! Input error types

use thiserror::Error;

/// Input device / mapping error
#[derive(Debug, Error)]
pub enum InputError {
    /// No joystick at the requested index
    #[error("no joystick found at index {index} ({connected} connected)")]
    NoDevice { index: usize, connected: usize },

    /// Joystick went away mid-session
    #[error("joystick '{name}' disconnected")]
    Disconnected { name: String },

    /// Backend initialisation or read failure
    #[error("input backend error: {message}")]
    Backend { message: String },

    /// Mapping refers to an axis the snapshot does not have
    #[error("axis {index} not available, device exposes {available} axes")]
    AxisOutOfRange { index: usize, available: usize },

    /// Mapping refers to a button the snapshot does not have
    #[error("button {index} not available, device exposes {available} buttons")]
    ButtonOutOfRange { index: usize, available: usize },
}

/// Result alias
pub type Result<T> = std::result::Result<T, InputError>;
