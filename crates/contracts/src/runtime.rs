//! SessionActors - Actor Factory output
//!
//! Runtime actor handles of one drive session.

use crate::CameraPosition;

/// CARLA actor handle type
pub type ActorId = u32;

/// Vehicle spawned by the bootstrap
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnedVehicle {
    /// Actor handle
    pub actor_id: ActorId,

    /// Blueprint the vehicle was spawned from
    pub blueprint: String,

    /// Index of the spawn point that accepted the vehicle
    pub spawn_index: usize,

    /// Spawn attempts made, including the successful one
    pub attempts: usize,
}

/// Actors owned by a drive session
///
/// Created once at startup and destroyed together at shutdown.
#[derive(Debug, Clone)]
pub struct SessionActors {
    /// Ego vehicle
    pub vehicle: SpawnedVehicle,

    /// Camera actors in rig order
    pub cameras: Vec<(CameraPosition, ActorId)>,
}

impl SessionActors {
    /// Create with no cameras attached yet
    pub fn new(vehicle: SpawnedVehicle) -> Self {
        Self {
            vehicle,
            cameras: Vec::with_capacity(CameraPosition::ALL.len()),
        }
    }

    /// Vehicle actor handle
    pub fn vehicle_id(&self) -> ActorId {
        self.vehicle.actor_id
    }

    /// Register camera
    pub fn register_camera(&mut self, position: CameraPosition, actor_id: ActorId) {
        self.cameras.push((position, actor_id));
    }

    /// Camera actor at a mount position
    pub fn camera(&self, position: CameraPosition) -> Option<ActorId> {
        self.cameras
            .iter()
            .find(|(p, _)| *p == position)
            .map(|(_, id)| *id)
    }

    /// Get all actor handles (cameras first, then the vehicle)
    pub fn all_actor_ids(&self) -> Vec<ActorId> {
        self.cameras
            .iter()
            .map(|(_, id)| *id)
            .chain(std::iter::once(self.vehicle.actor_id))
            .collect()
    }
}
