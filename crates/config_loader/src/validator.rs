//! 配置校验模块
//!
//! 校验规则：
//! - 字段范围 (端口、图像尺寸、队列容量等，由 `validator` derive 规则检查)
//! - 浮点字段必须是有限值 (derive 的 range 规则放过 NaN)
//! - 手柄映射索引落在 axis_order / button_order 范围内
//! - 油门与刹车不共用一个轴，退出与手刹不共用一个键
//! - axis_order 中没有重复的轴
//! - 退出键是 ASCII 字母

use std::collections::HashSet;

use contracts::{ContractError, DisplayConfig, DriveConfig, InputConfig};
use validator::Validate;

/// 校验 DriveConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &DriveConfig) -> Result<(), ContractError> {
    validate_finite(config)?;
    validate_fields(config)?;
    validate_axis_indices(&config.input)?;
    validate_button_indices(&config.input)?;
    validate_axis_order(&config.input)?;
    validate_quit_key(&config.display)?;
    Ok(())
}

/// 浮点字段拒绝 NaN / inf
fn validate_finite(config: &DriveConfig) -> Result<(), ContractError> {
    for (field, value) in [
        ("simulator.timeout_secs", config.simulator.timeout_secs),
        ("cameras.fov", f64::from(config.cameras.fov)),
        ("cameras.sensor_tick", config.cameras.sensor_tick),
        ("cameras.mount_distance", config.cameras.mount_distance),
        ("cameras.mount_height", config.cameras.mount_height),
    ] {
        if !value.is_finite() {
            return Err(ContractError::config_validation(
                field,
                format!("{value} is not a finite number"),
            ));
        }
    }
    Ok(())
}

/// 字段级规则
fn validate_fields(config: &DriveConfig) -> Result<(), ContractError> {
    config
        .validate()
        .map_err(|e| ContractError::config_validation("drive_config", e.to_string()))
}

/// 校验轴索引
fn validate_axis_indices(input: &InputConfig) -> Result<(), ContractError> {
    let available = input.axis_order.len();
    for (field, index) in [
        ("input.steer_axis", input.steer_axis),
        ("input.throttle_axis", input.throttle_axis),
        ("input.brake_axis", input.brake_axis),
    ] {
        if index >= available {
            return Err(ContractError::config_validation(
                field,
                format!("axis {index} out of range, axis_order has {available} entries"),
            ));
        }
    }

    if input.throttle_axis == input.brake_axis {
        return Err(ContractError::config_validation(
            "input.throttle_axis / input.brake_axis",
            format!(
                "throttle and brake must use different axes, both are {}",
                input.throttle_axis
            ),
        ));
    }
    Ok(())
}

/// 校验按键索引
fn validate_button_indices(input: &InputConfig) -> Result<(), ContractError> {
    let available = input.button_order.len();
    for (field, index) in [
        ("input.handbrake_button", input.handbrake_button),
        ("input.exit_button", input.exit_button),
    ] {
        if index >= available {
            return Err(ContractError::config_validation(
                field,
                format!("button {index} out of range, button_order has {available} entries"),
            ));
        }
    }

    if input.handbrake_button == input.exit_button {
        return Err(ContractError::config_validation(
            "input.handbrake_button / input.exit_button",
            "handbrake and exit must use different buttons",
        ));
    }
    Ok(())
}

/// 校验 axis_order 无重复
fn validate_axis_order(input: &InputConfig) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for axis in &input.axis_order {
        if !seen.insert(axis) {
            return Err(ContractError::config_validation(
                "input.axis_order",
                format!("duplicate axis {axis:?}"),
            ));
        }
    }
    Ok(())
}

/// 校验退出键
fn validate_quit_key(display: &DisplayConfig) -> Result<(), ContractError> {
    if display.quit_key.is_ascii_alphabetic() {
        Ok(())
    } else {
        Err(ContractError::config_validation(
            "display.quit_key",
            format!("{:?} is not an ASCII letter", display.quit_key),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::AxisName;

    #[test]
    fn test_valid_config() {
        assert!(validate(&DriveConfig::default()).is_ok());
    }

    #[test]
    fn test_zero_image_size() {
        let mut config = DriveConfig::default();
        config.cameras.image_width = 0;
        let result = validate(&config);
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("image_width"), "got: {err}");
    }

    #[test]
    fn test_zero_port() {
        let mut config = DriveConfig::default();
        config.simulator.port = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_throttle_axis_out_of_range() {
        let mut config = DriveConfig::default();
        config.input.throttle_axis = 9;
        let result = validate(&config);
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("out of range"), "got: {err}");
    }

    #[test]
    fn test_shared_pedal_axis() {
        let mut config = DriveConfig::default();
        config.input.brake_axis = config.input.throttle_axis;
        let result = validate(&config);
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("different axes"), "got: {err}");
    }

    #[test]
    fn test_shared_exit_button() {
        let mut config = DriveConfig::default();
        config.input.exit_button = config.input.handbrake_button;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_duplicate_axis() {
        let mut config = DriveConfig::default();
        config.input.axis_order.push(AxisName::LeftStickX);
        let result = validate(&config);
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("duplicate axis"), "got: {err}");
    }

    #[test]
    fn test_huge_timeout_rejected() {
        let mut config = DriveConfig::default();
        config.simulator.timeout_secs = 1e30;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("timeout_secs"), "got: {err}");
    }

    #[test]
    fn test_non_finite_floats_rejected() {
        let mut config = DriveConfig::default();
        config.simulator.timeout_secs = f64::NAN;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("simulator.timeout_secs"), "got: {err}");

        let mut config = DriveConfig::default();
        config.cameras.fov = f32::NAN;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("cameras.fov"), "got: {err}");

        let mut config = DriveConfig::default();
        config.cameras.sensor_tick = f64::INFINITY;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("cameras.sensor_tick"), "got: {err}");
    }

    #[test]
    fn test_quit_key_must_be_letter() {
        let mut config = DriveConfig::default();
        config.display.quit_key = '1';
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("quit_key"), "got: {err}");

        config.display.quit_key = 'X';
        assert!(validate(&config).is_ok());
    }
}
