//! Actor Factory error types

use contracts::{ActorId, CameraPosition, ContractError};
use thiserror::Error;

/// Actor Factory specific error
#[derive(Debug, Error)]
pub enum ActorFactoryError {
    /// CARLA connection error
    #[error("failed to connect to CARLA: {message}")]
    ConnectionFailed { message: String },

    /// No vehicle blueprint matches the filter
    #[error("no vehicle blueprint matches '{filter}'")]
    BlueprintNotFound { filter: String },

    /// Every spawn point was tried and rejected
    #[error("no free spawn location after {attempts} attempts")]
    NoSpawnLocation { attempts: usize },

    /// Engine rejected a single spawn request
    #[error("failed to spawn '{blueprint}': {message}")]
    SpawnFailed { blueprint: String, message: String },

    /// Camera spawn error
    #[error("failed to spawn {position} camera on vehicle {vehicle_id}: {message}")]
    SensorSpawnFailed {
        position: CameraPosition,
        vehicle_id: ActorId,
        message: String,
    },

    /// Control could not be applied to the vehicle
    #[error("failed to apply control to vehicle {actor_id}: {message}")]
    ControlFailed { actor_id: ActorId, message: String },

    /// Actor handle unknown to the client
    #[error("actor {actor_id} not found")]
    ActorNotFound { actor_id: ActorId },

    /// Destroy error
    #[error("failed to destroy actor {actor_id}: {message}")]
    DestroyFailed { actor_id: ActorId, message: String },

    /// Wrapped ContractError
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl ActorFactoryError {
    /// Create spawn error
    pub fn spawn_failed(blueprint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SpawnFailed {
            blueprint: blueprint.into(),
            message: message.into(),
        }
    }

    /// Create camera spawn error
    pub fn sensor_spawn(
        position: CameraPosition,
        vehicle_id: ActorId,
        message: impl Into<String>,
    ) -> Self {
        Self::SensorSpawnFailed {
            position,
            vehicle_id,
            message: message.into(),
        }
    }

    #[cfg(feature = "real-carla")]
    pub(crate) fn not_connected() -> Self {
        Self::ConnectionFailed {
            message: "not connected to CARLA server".into(),
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, ActorFactoryError>;
