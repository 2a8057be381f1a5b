//! # Contracts
//!
//! Shared interface contracts between the drive crates: geometry, camera
//! sources, frames, control commands, configuration and errors.
//! Business crates depend on this crate only, never on each other's internals.
//!
//! ## Threading Model
//! - Camera sources deliver images on engine-owned threads
//! - Frames and control commands are plain owned values that cross those threads

mod camera;
mod config;
mod control;
mod error;
mod frame;
mod geometry;
mod runtime;

pub use camera::{CameraPosition, CameraSource, ImageCallback, RawImage};
pub use config::*;
pub use control::ControlCommand;
pub use error::*;
pub use frame::Frame;
pub use geometry::{Location, Rotation, Transform};
pub use runtime::*;
