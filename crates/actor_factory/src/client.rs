//! Simulator client abstraction
//!
//! Defines the operations a drive session needs from CARLA, so the real client and
//! the mock client can be swapped behind the same interface.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use contracts::{ActorId, CameraPosition, CameraSource, ControlCommand, Transform};

use crate::error::Result;

/// Simulator client trait
///
/// Spawn operations act on a single candidate and report failure; iterating spawn
/// points and rolling back is the job of [`ActorFactory`](crate::ActorFactory).
pub trait SimClient: Send + Sync {
    /// Connect to CARLA server with a bounded RPC timeout
    fn connect(
        &mut self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> impl Future<Output = Result<()>> + Send;

    /// First vehicle blueprint id matching `filter` (e.g. "vehicle.*")
    fn find_vehicle_blueprint(&self, filter: &str) -> impl Future<Output = Result<String>> + Send;

    /// Recommended spawn points of the current map, in map order
    fn spawn_points(&self) -> impl Future<Output = Result<Vec<Transform>>> + Send;

    /// Try to spawn a vehicle at one spawn point
    ///
    /// Fails when the point is occupied or the engine rejects the request.
    fn try_spawn_vehicle(
        &self,
        blueprint: &str,
        transform: Transform,
    ) -> impl Future<Output = Result<ActorId>> + Send;

    /// Enable or disable the engine autopilot of a vehicle
    fn set_autopilot(
        &self,
        vehicle_id: ActorId,
        enabled: bool,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Spawn a sensor rigidly attached to `parent_id`
    ///
    /// # Arguments
    /// * `blueprint` - Blueprint name, e.g., "sensor.camera.rgb"
    /// * `transform` - Pose relative to parent actor
    /// * `parent_id` - Parent actor ID
    /// * `attributes` - Blueprint attributes (image size, fov, sensor tick)
    fn spawn_sensor(
        &self,
        blueprint: &str,
        transform: Transform,
        parent_id: ActorId,
        attributes: &HashMap<String, String>,
    ) -> impl Future<Output = Result<ActorId>> + Send;

    /// Send one control command to a vehicle
    fn apply_control(
        &self,
        vehicle_id: ActorId,
        command: &ControlCommand,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Destroy actor
    ///
    /// Idempotent operation: returns Ok if actor doesn't exist
    fn destroy_actor(&self, actor_id: ActorId) -> impl Future<Output = Result<()>> + Send;

    /// Get the image source of a spawned camera
    ///
    /// Returns None if the actor doesn't exist or is not a sensor.
    fn camera_source(
        &self,
        actor_id: ActorId,
        position: CameraPosition,
    ) -> Option<Box<dyn CameraSource>>;
}
