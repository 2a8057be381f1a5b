//! # Controls
//!
//! Joystick input and the mapping from raw axes to vehicle actuation.
//!
//! - [`InputDevice`]: polled once per loop iteration
//! - [`map_controls`]: stateless snapshot → [`ControlInput`] mapping
//!
//! ## Feature Flags
//!
//! - `gamepad`: Enable the gilrs joystick backend

mod device;
mod error;
mod mapping;

#[cfg(feature = "gamepad")]
mod gilrs_device;

pub use device::{IdleInput, InputDevice, ScriptedInput};
pub use error::{InputError, Result};
pub use mapping::{map_controls, pedal, ControlInput, InputSnapshot};

#[cfg(feature = "gamepad")]
pub use gilrs_device::GilrsJoystick;
