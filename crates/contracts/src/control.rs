//! Vehicle control command

use std::fmt;

use serde::{Deserialize, Serialize};

/// Normalized vehicle actuation, recomputed every loop iteration
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlCommand {
    /// [0, 1]
    pub throttle: f32,
    /// [-1, 1]
    pub steer: f32,
    /// [0, 1]
    pub brake: f32,
    pub hand_brake: bool,
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "VehicleControl(throttle={:.2}, steer={:.2}, brake={:.2}, hand_brake={})",
            self.throttle, self.steer, self.brake, self.hand_brake
        )
    }
}
