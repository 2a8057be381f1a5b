//! Real CARLA client implementation
//!
//! Connects to CARLA server using carla-rust crate.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use carla::client::{ActorBase, Client, Sensor, Vehicle, World};
use carla::geom::{Location, Rotation, Transform as CarlaTransform};
use carla::rpc::VehicleControl;
use contracts::{ActorId, CameraPosition, CameraSource, ControlCommand, Transform};
use tracing::{debug, info, instrument, trace, warn};

use crate::carla_camera_source::CarlaCameraSource;
use crate::client::SimClient;
use crate::error::{ActorFactoryError, Result};

/// Real CARLA client
///
/// Wraps carla-rust's Client, implements SimClient trait.
/// Uses Mutex for interior mutability, allowing `&self` methods to modify World.
#[derive(Default, Clone)]
pub struct RealCarlaClient {
    /// CARLA client
    client: Arc<Mutex<Option<Client>>>,
    /// World reference (uses Mutex for interior mutability)
    world: Arc<Mutex<Option<World>>>,
    /// Created actors (for control and teardown)
    actors: Arc<Mutex<HashMap<ActorId, ActorType>>>,
}

/// Actor type enumeration
#[derive(Clone)]
enum ActorType {
    Vehicle(Vehicle),
    Sensor(Sensor),
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RealCarlaClient {
    /// Create new client (disconnected state)
    pub fn new() -> Self {
        Self::default()
    }

    /// Access World with mutable reference, ensuring connected
    fn with_world_mut<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut World) -> Result<R>,
    {
        let mut world_guard = lock(&self.world);
        let world = world_guard
            .as_mut()
            .ok_or_else(ActorFactoryError::not_connected)?;
        f(world)
    }

    /// Save actor to registry for teardown
    fn store_actor(&self, actor_id: ActorId, actor: ActorType) {
        lock(&self.actors).insert(actor_id, actor);
    }

    fn vehicle(&self, actor_id: ActorId) -> Result<Vehicle> {
        match lock(&self.actors).get(&actor_id) {
            Some(ActorType::Vehicle(v)) => Ok(v.clone()),
            _ => Err(ActorFactoryError::ActorNotFound { actor_id }),
        }
    }

    fn sensor(&self, actor_id: ActorId) -> Option<Sensor> {
        match lock(&self.actors).get(&actor_id) {
            Some(ActorType::Sensor(sensor)) => Some(sensor.clone()),
            _ => None,
        }
    }

    fn create_vehicle(world: &mut World, blueprint: &str, transform: &Transform) -> Result<Vehicle> {
        let vehicle_bp = world
            .blueprint_library()
            .find(blueprint)
            .ok_or_else(|| {
                ActorFactoryError::spawn_failed(blueprint, format!("blueprint '{blueprint}' not found"))
            })?;

        let actor = world
            .spawn_actor(&vehicle_bp, &to_carla_transform(transform))
            .map_err(|e| ActorFactoryError::spawn_failed(blueprint, e.to_string()))?;

        Vehicle::try_from(actor)
            .map_err(|_| ActorFactoryError::spawn_failed(blueprint, "spawned actor is not a vehicle"))
    }

    fn create_sensor(
        world: &mut World,
        blueprint: &str,
        transform: &Transform,
        parent: &Vehicle,
        attributes: &HashMap<String, String>,
    ) -> std::result::Result<Sensor, String> {
        let mut sensor_bp = world
            .blueprint_library()
            .find(blueprint)
            .ok_or_else(|| format!("blueprint '{blueprint}' not found"))?;

        for (key, value) in attributes {
            if !sensor_bp.set_attribute(key, value) {
                warn!(key, value, "failed to set sensor attribute");
            }
        }

        let actor = world
            .spawn_actor_attached(&sensor_bp, &to_carla_transform(transform), parent, None)
            .map_err(|e| e.to_string())?;

        Sensor::try_from(actor).map_err(|_| "spawned actor is not a sensor".to_string())
    }

    fn destroy_vehicle_actor(vehicle: Vehicle, actor_id: ActorId) -> Result<()> {
        if vehicle.destroy() {
            Ok(())
        } else {
            Err(ActorFactoryError::DestroyFailed {
                actor_id,
                message: "destroy vehicle returned false".into(),
            })
        }
    }

    fn destroy_sensor_actor(sensor: Sensor, actor_id: ActorId) -> Result<()> {
        if sensor.is_listening() {
            sensor.stop();
        }
        if sensor.destroy() {
            Ok(())
        } else {
            Err(ActorFactoryError::DestroyFailed {
                actor_id,
                message: "destroy sensor returned false".into(),
            })
        }
    }
}

/// Convert internal Transform to CARLA Transform
fn to_carla_transform(transform: &Transform) -> CarlaTransform {
    CarlaTransform {
        location: Location {
            x: transform.location.x as f32,
            y: transform.location.y as f32,
            z: transform.location.z as f32,
        },
        rotation: Rotation {
            pitch: transform.rotation.pitch as f32,
            yaw: transform.rotation.yaw as f32,
            roll: transform.rotation.roll as f32,
        },
    }
}

fn from_carla_transform(transform: &CarlaTransform) -> Transform {
    Transform {
        location: contracts::Location {
            x: transform.location.x as f64,
            y: transform.location.y as f64,
            z: transform.location.z as f64,
        },
        rotation: contracts::Rotation {
            pitch: transform.rotation.pitch as f64,
            yaw: transform.rotation.yaw as f64,
            roll: transform.rotation.roll as f64,
        },
    }
}

fn to_vehicle_control(command: &ControlCommand) -> VehicleControl {
    VehicleControl {
        throttle: command.throttle,
        steer: command.steer,
        brake: command.brake,
        hand_brake: command.hand_brake,
        ..Default::default()
    }
}

impl SimClient for RealCarlaClient {
    #[instrument(name = "real_carla_connect", skip(self), fields(host = %host, port))]
    async fn connect(&mut self, host: &str, port: u16, timeout: Duration) -> Result<()> {
        let mut client = Client::connect(host, port, None);
        client.set_timeout(timeout);
        let world = client.world();

        info!(
            map = %world.map().name(),
            timeout_secs = timeout.as_secs_f64(),
            "connected to CARLA server"
        );

        *lock(&self.client) = Some(client);
        *lock(&self.world) = Some(world);

        Ok(())
    }

    #[instrument(name = "real_carla_find_blueprint", skip(self), fields(filter = %filter))]
    async fn find_vehicle_blueprint(&self, filter: &str) -> Result<String> {
        self.with_world_mut(|world| {
            world
                .blueprint_library()
                .filter(filter)
                .iter()
                .next()
                .map(|bp| bp.id())
                .ok_or_else(|| ActorFactoryError::BlueprintNotFound {
                    filter: filter.to_string(),
                })
        })
    }

    #[instrument(name = "real_carla_spawn_points", skip(self))]
    async fn spawn_points(&self) -> Result<Vec<Transform>> {
        self.with_world_mut(|world| {
            Ok(world
                .map()
                .recommended_spawn_points()
                .iter()
                .map(from_carla_transform)
                .collect())
        })
    }

    #[instrument(
        name = "real_carla_spawn_vehicle",
        skip(self, transform),
        fields(blueprint = %blueprint)
    )]
    async fn try_spawn_vehicle(&self, blueprint: &str, transform: Transform) -> Result<ActorId> {
        let vehicle =
            self.with_world_mut(|world| Self::create_vehicle(world, blueprint, &transform))?;
        let actor_id = vehicle.id();

        debug!(actor_id, blueprint, "vehicle spawned");
        self.store_actor(actor_id, ActorType::Vehicle(vehicle));

        Ok(actor_id)
    }

    #[instrument(name = "real_carla_set_autopilot", skip(self), fields(vehicle_id, enabled))]
    async fn set_autopilot(&self, vehicle_id: ActorId, enabled: bool) -> Result<()> {
        self.vehicle(vehicle_id)?.set_autopilot(enabled);
        Ok(())
    }

    #[instrument(
        name = "real_carla_spawn_sensor",
        skip(self, transform, attributes),
        fields(blueprint = %blueprint, parent_id)
    )]
    async fn spawn_sensor(
        &self,
        blueprint: &str,
        transform: Transform,
        parent_id: ActorId,
        attributes: &HashMap<String, String>,
    ) -> Result<ActorId> {
        let parent = self.vehicle(parent_id)?;
        let sensor = self
            .with_world_mut(|world| {
                Ok(Self::create_sensor(world, blueprint, &transform, &parent, attributes))
            })?
            .map_err(|message| ActorFactoryError::spawn_failed(blueprint, message))?;

        let actor_id = sensor.id();

        debug!(actor_id, blueprint, parent_id, "sensor spawned and attached");
        self.store_actor(actor_id, ActorType::Sensor(sensor));

        Ok(actor_id)
    }

    async fn apply_control(&self, vehicle_id: ActorId, command: &ControlCommand) -> Result<()> {
        let vehicle = self.vehicle(vehicle_id).map_err(|e| ActorFactoryError::ControlFailed {
            actor_id: vehicle_id,
            message: e.to_string(),
        })?;
        vehicle.apply_control(&to_vehicle_control(command));
        trace!(vehicle_id, %command, "control applied");
        Ok(())
    }

    #[instrument(name = "real_carla_destroy_actor", skip(self), fields(actor_id))]
    async fn destroy_actor(&self, actor_id: ActorId) -> Result<()> {
        let removed = lock(&self.actors).remove(&actor_id);

        // Idempotent: unknown actors are already gone
        match removed {
            Some(ActorType::Vehicle(v)) => Self::destroy_vehicle_actor(v, actor_id)?,
            Some(ActorType::Sensor(s)) => Self::destroy_sensor_actor(s, actor_id)?,
            None => return Ok(()),
        }
        debug!(actor_id, "actor destroyed");
        Ok(())
    }

    fn camera_source(
        &self,
        actor_id: ActorId,
        position: CameraPosition,
    ) -> Option<Box<dyn CameraSource>> {
        let sensor = self.sensor(actor_id)?;
        Some(Box::new(CarlaCameraSource::new(position, sensor)))
    }
}

#[cfg(test)]
mod tests {
    // Real client tests require CARLA server running
    // These tests are marked as ignore, only run when server is available

    use super::*;

    #[test]
    fn test_control_conversion() {
        let command = ControlCommand {
            throttle: 0.75,
            steer: -0.2,
            brake: 0.0,
            hand_brake: true,
        };
        let control = to_vehicle_control(&command);
        assert_eq!(control.throttle, 0.75);
        assert_eq!(control.steer, -0.2);
        assert!(control.hand_brake);
        assert!(!control.reverse);
    }

    #[tokio::test]
    #[ignore = "requires CARLA server"]
    async fn test_real_client_spawn_points() {
        let mut client = RealCarlaClient::new();
        client
            .connect("localhost", 2000, Duration::from_secs(20))
            .await
            .unwrap();
        assert!(!client.spawn_points().await.unwrap().is_empty());
    }
}
