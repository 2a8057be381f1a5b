//! CameraSource trait - camera image source abstraction
//!
//! Decouples ingestion from the concrete camera implementation, so real CARLA
//! cameras and mock cameras are handled through the same interface.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::Transform;

/// Mount position of a camera on the vehicle rig
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraPosition {
    Front,
    Rear,
    Left,
    Right,
}

impl CameraPosition {
    /// Rig order; composites are laid out left to right in this order
    pub const ALL: [CameraPosition; 4] = [
        CameraPosition::Front,
        CameraPosition::Rear,
        CameraPosition::Left,
        CameraPosition::Right,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CameraPosition::Front => "front",
            CameraPosition::Rear => "rear",
            CameraPosition::Left => "left",
            CameraPosition::Right => "right",
        }
    }

    /// Index of this position in [`CameraPosition::ALL`]
    pub fn index(self) -> usize {
        match self {
            CameraPosition::Front => 0,
            CameraPosition::Rear => 1,
            CameraPosition::Left => 2,
            CameraPosition::Right => 3,
        }
    }

    /// Relative mount transform: front +x, rear -x, left +y, right -y
    pub fn mount_transform(self, distance: f64, height: f64) -> Transform {
        match self {
            CameraPosition::Front => Transform::at(distance, 0.0, height),
            CameraPosition::Rear => Transform::at(-distance, 0.0, height),
            CameraPosition::Left => Transform::at(0.0, distance, height),
            CameraPosition::Right => Transform::at(0.0, -distance, height),
        }
    }
}

impl fmt::Display for CameraPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw camera image as delivered by the engine
///
/// `bgra` is interleaved BGRA and is only valid for the duration of the callback.
#[derive(Debug, Clone, Copy)]
pub struct RawImage<'a> {
    /// Simulator frame number
    pub frame_id: u64,
    /// Simulation timestamp (seconds)
    pub timestamp: f64,
    pub width: u32,
    pub height: u32,
    pub bgra: &'a [u8],
}

/// Image callback type
///
/// Invoked on the producer's thread once per captured image.
pub type ImageCallback = Arc<dyn Fn(RawImage<'_>) + Send + Sync>;

/// Camera image source trait
///
/// # Example
///
/// ```ignore
/// let camera: Box<dyn CameraSource> = client.camera_source(actor_id, CameraPosition::Front)?;
/// camera.listen(Arc::new(|image| {
///     println!("frame {} ({}x{})", image.frame_id, image.width, image.height);
/// }));
/// // ...
/// camera.stop();
/// ```
pub trait CameraSource: Send + Sync {
    /// Where the camera is mounted
    fn position(&self) -> CameraPosition;

    /// Register the image callback
    ///
    /// Repeated calls while already listening are ignored.
    fn listen(&self, callback: ImageCallback);

    /// Stop listening; no callback fires after this returns
    fn stop(&self);

    /// Check if currently listening
    fn is_listening(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mount_offsets() {
        let front = CameraPosition::Front.mount_transform(2.5, 0.7);
        assert_eq!(front.location.x, 2.5);
        assert_eq!(front.location.z, 0.7);

        let right = CameraPosition::Right.mount_transform(2.5, 0.7);
        assert_eq!(right.location.x, 0.0);
        assert_eq!(right.location.y, -2.5);
    }

    #[test]
    fn test_rig_order_matches_index() {
        for (i, position) in CameraPosition::ALL.iter().enumerate() {
            assert_eq!(position.index(), i);
        }
    }

    #[test]
    fn test_position_serde_snake_case() {
        let json = serde_json::to_string(&CameraPosition::Rear).unwrap();
        assert_eq!(json, "\"rear\"");
    }
}
