//! # Actor Factory
//!
//! CARLA asset factory module.
//!
//! Responsibilities:
//! - Bootstrap the ego vehicle by trying spawn points in map order
//! - Attach the four-camera rig and roll back on failure
//! - Forward control commands to the vehicle
//! - Tear down every session actor
//! - Provide unified `CameraSource` abstraction over real and mock cameras
//!
//! ## Feature Flags
//!
//! - `real-carla`: Enable real CARLA client (requires carla crate)

pub mod client;
pub mod error;
pub mod factory;
pub mod mock_camera;
pub mod mock_client;

#[cfg(feature = "real-carla")]
pub mod carla_camera_source;
#[cfg(feature = "real-carla")]
pub mod carla_client;

pub use client::SimClient;
pub use contracts::{ActorId, CameraSource, SessionActors, SpawnedVehicle};
pub use error::{ActorFactoryError, Result};
pub use factory::ActorFactory;
pub use mock_camera::{MockCamera, MockCameraConfig};
pub use mock_client::{MockCarlaClient, MockConfig};

#[cfg(feature = "real-carla")]
pub use carla_camera_source::CarlaCameraSource;
#[cfg(feature = "real-carla")]
pub use carla_client::RealCarlaClient;
