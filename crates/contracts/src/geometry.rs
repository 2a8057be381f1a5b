//! 3D 变换：位置 + 旋转

use serde::{Deserialize, Serialize};

/// 3D 变换：位置 + 旋转
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// 位置 (x, y, z) 单位：米
    pub location: Location,

    /// 旋转 (pitch, yaw, roll) 单位：度
    #[serde(default)]
    pub rotation: Rotation,
}

impl Transform {
    /// 只有位置、默认朝向的变换
    pub fn at(x: f64, y: f64, z: f64) -> Self {
        Self {
            location: Location { x, y, z },
            rotation: Rotation::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    pub pitch: f64,
    pub yaw: f64,
    pub roll: f64,
}
