//! Session error types

use actor_factory::ActorFactoryError;
use compositor::DisplayError;
use controls::InputError;
use ingestion::IngestionError;
use thiserror::Error;

/// Errors that end a drive session
#[derive(Debug, Error)]
pub enum SessionError {
    /// Joystick read or mapping failure
    #[error("input error: {0}")]
    Input(#[from] InputError),

    /// Simulator failure (control application, actor lookup)
    #[error("simulator error: {0}")]
    Simulator(#[from] ActorFactoryError),

    /// Camera registration failure
    #[error("ingestion error: {0}")]
    Ingestion(#[from] IngestionError),

    /// Composite or window failure
    #[error("display error: {0}")]
    Display(#[from] DisplayError),

    /// The loop panicked; teardown still ran
    #[error("drive loop panicked: {message}")]
    Panicked { message: String },
}

/// Result alias
pub type Result<T> = std::result::Result<T, SessionError>;
