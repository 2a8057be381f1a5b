//! 手柄状态 → 车辆控制量

use contracts::{ControlCommand, InputConfig};

use crate::error::{InputError, Result};

/// 一次轮询得到的手柄状态
///
/// 轴值为原生范围 [-1, 1]，顺序由 `InputConfig::axis_order` 决定。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSnapshot {
    pub axes: Vec<f32>,
    pub buttons: Vec<bool>,
}

impl InputSnapshot {
    pub fn new(axes: Vec<f32>, buttons: Vec<bool>) -> Self {
        Self { axes, buttons }
    }

    /// 松开所有输入：摇杆居中，踏板轴在 -1 (映射后为 0)
    pub fn neutral(config: &InputConfig) -> Self {
        let mut axes = vec![0.0; config.axis_order.len()];
        for index in [config.throttle_axis, config.brake_axis] {
            if let Some(axis) = axes.get_mut(index) {
                *axis = -1.0;
            }
        }
        Self {
            axes,
            buttons: vec![false; config.button_order.len()],
        }
    }

    pub fn axis(&self, index: usize) -> Result<f32> {
        self.axes
            .get(index)
            .copied()
            .ok_or(InputError::AxisOutOfRange {
                index,
                available: self.axes.len(),
            })
    }

    pub fn button(&self, index: usize) -> Result<bool> {
        self.buttons
            .get(index)
            .copied()
            .ok_or(InputError::ButtonOutOfRange {
                index,
                available: self.buttons.len(),
            })
    }
}

/// 映射结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlInput {
    pub command: ControlCommand,
    /// 退出键按下；应在下发控制量之前检查
    pub exit_requested: bool,
}

/// 踏板轴 [-1, 1] → [0, 1]
pub fn pedal(value: f32) -> f32 {
    ((value + 1.0) / 2.0).clamp(0.0, 1.0)
}

/// 将手柄状态映射为控制量
///
/// 无状态：每次迭代独立计算。方向直接透传，不做死区或反向。
pub fn map_controls(snapshot: &InputSnapshot, config: &InputConfig) -> Result<ControlInput> {
    let command = ControlCommand {
        steer: snapshot.axis(config.steer_axis)?,
        throttle: pedal(snapshot.axis(config.throttle_axis)?),
        brake: pedal(snapshot.axis(config.brake_axis)?),
        hand_brake: snapshot.button(config.handbrake_button)?,
    };
    Ok(ControlInput {
        command,
        exit_requested: snapshot.button(config.exit_button)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_with(axis: usize, value: f32) -> InputSnapshot {
        let config = InputConfig::default();
        let mut snapshot = InputSnapshot::neutral(&config);
        snapshot.axes[axis] = value;
        snapshot
    }

    #[test]
    fn test_throttle_mapping() {
        let config = InputConfig::default();
        for (raw, expected) in [(-1.0, 0.0), (0.0, 0.5), (1.0, 1.0)] {
            let input = map_controls(&snapshot_with(5, raw), &config).unwrap();
            assert_eq!(input.command.throttle, expected, "raw {raw}");
        }
    }

    #[test]
    fn test_brake_uses_axis_four() {
        let config = InputConfig::default();
        let input = map_controls(&snapshot_with(4, 0.0), &config).unwrap();
        assert_eq!(input.command.brake, 0.5);
        assert_eq!(input.command.throttle, 0.0);
    }

    #[test]
    fn test_steer_passthrough() {
        let config = InputConfig::default();
        let input = map_controls(&snapshot_with(0, 0.37), &config).unwrap();
        assert_eq!(input.command.steer, 0.37);

        let input = map_controls(&snapshot_with(0, -1.0), &config).unwrap();
        assert_eq!(input.command.steer, -1.0);
    }

    #[test]
    fn test_out_of_range_pedal_clamped() {
        assert_eq!(pedal(-1.2), 0.0);
        assert_eq!(pedal(1.3), 1.0);
    }

    #[test]
    fn test_buttons() {
        let config = InputConfig::default();
        let mut snapshot = InputSnapshot::neutral(&config);
        snapshot.buttons[1] = true;

        let input = map_controls(&snapshot, &config).unwrap();
        assert!(input.command.hand_brake);
        assert!(!input.exit_requested);

        snapshot.buttons[0] = true;
        let input = map_controls(&snapshot, &config).unwrap();
        assert!(input.exit_requested);
    }

    #[test]
    fn test_neutral_is_idle() {
        let config = InputConfig::default();
        let input = map_controls(&InputSnapshot::neutral(&config), &config).unwrap();
        assert_eq!(input.command, ControlCommand::default());
        assert!(!input.exit_requested);
    }

    #[test]
    fn test_missing_axis_is_error() {
        let config = InputConfig::default();
        let snapshot = InputSnapshot::new(vec![0.0; 4], vec![false; 2]);
        let err = map_controls(&snapshot, &config).unwrap_err();
        assert!(matches!(
            err,
            InputError::AxisOutOfRange {
                index: 5,
                available: 4
            }
        ));
    }
}
