//! DriveConfig - Config Loader 输出
//!
//! 描述一次驾驶会话的完整配置：仿真器连接、相机组、输入映射、显示。
//! 所有字段都有默认值，因此配置文件是可选的。

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{CameraPosition, ContractError, Transform};

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的驾驶会话配置
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct DriveConfig {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// 仿真器连接
    #[serde(default)]
    #[validate(nested)]
    pub simulator: SimulatorConfig,

    /// 四相机组
    #[serde(default)]
    #[validate(nested)]
    pub cameras: CameraRigConfig,

    /// 手柄映射
    #[serde(default)]
    #[validate(nested)]
    pub input: InputConfig,

    /// 显示窗口
    #[serde(default)]
    #[validate(nested)]
    pub display: DisplayConfig,
}

/// 仿真器连接配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SimulatorConfig {
    /// CARLA 服务器地址
    #[serde(default = "default_host")]
    #[validate(length(min = 1))]
    pub host: String,

    /// CARLA 服务器端口
    #[serde(default = "default_port")]
    #[validate(range(min = 1))]
    pub port: u16,

    /// 连接超时 (秒)
    #[serde(default = "default_timeout_secs")]
    #[validate(range(exclusive_min = 0.0, max = 3600.0))]
    pub timeout_secs: f64,

    /// 车辆蓝图过滤器，选第一个匹配项
    #[serde(default = "default_vehicle_filter")]
    #[validate(length(min = 1))]
    pub vehicle_filter: String,
}

impl SimulatorConfig {
    /// 连接超时；非有限值或超出 `Duration` 范围时返回错误
    pub fn timeout(&self) -> Result<Duration, ContractError> {
        Duration::try_from_secs_f64(self.timeout_secs).map_err(|e| {
            ContractError::config_validation(
                "simulator.timeout_secs",
                format!("{} is not a usable timeout: {e}", self.timeout_secs),
            )
        })
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            vehicle_filter: default_vehicle_filter(),
        }
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    2000
}

fn default_timeout_secs() -> f64 {
    20.0
}

fn default_vehicle_filter() -> String {
    "vehicle.*".to_string()
}

/// 相机组配置 (四个相机共享)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CameraRigConfig {
    /// 相机蓝图
    #[serde(default = "default_camera_blueprint")]
    #[validate(length(min = 1))]
    pub blueprint: String,

    /// 图像宽度 (像素)
    #[serde(default = "default_image_width")]
    #[validate(range(min = 1))]
    pub image_width: u32,

    /// 图像高度 (像素)
    #[serde(default = "default_image_height")]
    #[validate(range(min = 1))]
    pub image_height: u32,

    /// 水平视场角 (度)
    #[serde(default = "default_fov")]
    #[validate(range(exclusive_min = 0.0, max = 180.0))]
    pub fov: f32,

    /// 采集间隔 (秒)，0.1 约 10 FPS
    #[serde(default = "default_sensor_tick")]
    #[validate(range(min = 0.0, max = 60.0))]
    pub sensor_tick: f64,

    /// 相机距车辆中心的水平距离 (米)
    #[serde(default = "default_mount_distance")]
    pub mount_distance: f64,

    /// 相机挂载高度 (米)
    #[serde(default = "default_mount_height")]
    pub mount_height: f64,

    /// 每相机队列容量，满时丢弃最旧帧
    #[serde(default = "default_queue_capacity")]
    #[validate(range(min = 1))]
    pub queue_capacity: usize,
}

impl CameraRigConfig {
    /// CARLA 蓝图属性
    pub fn attributes(&self) -> HashMap<String, String> {
        HashMap::from([
            ("image_size_x".to_string(), self.image_width.to_string()),
            ("image_size_y".to_string(), self.image_height.to_string()),
            ("fov".to_string(), self.fov.to_string()),
            ("sensor_tick".to_string(), self.sensor_tick.to_string()),
        ])
    }

    /// 指定位置相机的相对挂载位姿
    pub fn mount_transform(&self, position: CameraPosition) -> Transform {
        position.mount_transform(self.mount_distance, self.mount_height)
    }
}

impl Default for CameraRigConfig {
    fn default() -> Self {
        Self {
            blueprint: default_camera_blueprint(),
            image_width: default_image_width(),
            image_height: default_image_height(),
            fov: default_fov(),
            sensor_tick: default_sensor_tick(),
            mount_distance: default_mount_distance(),
            mount_height: default_mount_height(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

fn default_camera_blueprint() -> String {
    "sensor.camera.rgb".to_string()
}

fn default_image_width() -> u32 {
    800
}

fn default_image_height() -> u32 {
    600
}

fn default_fov() -> f32 {
    90.0
}

fn default_sensor_tick() -> f64 {
    0.1
}

fn default_mount_distance() -> f64 {
    2.5
}

fn default_mount_height() -> f64 {
    0.7
}

fn default_queue_capacity() -> usize {
    4
}

/// 手柄轴名称
///
/// `LeftTrigger2` / `RightTrigger2` 是模拟按键，读取时从 [0,1] 映射到 [-1,1]。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisName {
    LeftStickX,
    LeftStickY,
    RightStickX,
    RightStickY,
    LeftZ,
    RightZ,
    DPadX,
    DPadY,
    LeftTrigger2,
    RightTrigger2,
}

/// 手柄按键名称
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonName {
    South,
    East,
    North,
    West,
    LeftTrigger,
    RightTrigger,
    LeftTrigger2,
    RightTrigger2,
    Select,
    Start,
    Mode,
    LeftThumb,
    RightThumb,
    DPadUp,
    DPadDown,
    DPadLeft,
    DPadRight,
}

/// 手柄映射配置
///
/// 索引指向 `axis_order` / `button_order` 中的位置。
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct InputConfig {
    /// 使用第几个已连接的手柄
    #[serde(default)]
    pub device_index: usize,

    /// 方向轴
    #[serde(default = "default_steer_axis")]
    pub steer_axis: usize,

    /// 油门轴
    #[serde(default = "default_throttle_axis")]
    pub throttle_axis: usize,

    /// 刹车轴
    #[serde(default = "default_brake_axis")]
    pub brake_axis: usize,

    /// 手刹按键
    #[serde(default = "default_handbrake_button")]
    pub handbrake_button: usize,

    /// 退出按键
    #[serde(default)]
    pub exit_button: usize,

    /// 轴顺序
    #[serde(default = "default_axis_order")]
    #[validate(length(min = 1))]
    pub axis_order: Vec<AxisName>,

    /// 按键顺序
    #[serde(default = "default_button_order")]
    #[validate(length(min = 1))]
    pub button_order: Vec<ButtonName>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            device_index: 0,
            steer_axis: default_steer_axis(),
            throttle_axis: default_throttle_axis(),
            brake_axis: default_brake_axis(),
            handbrake_button: default_handbrake_button(),
            exit_button: 0,
            axis_order: default_axis_order(),
            button_order: default_button_order(),
        }
    }
}

fn default_steer_axis() -> usize {
    0
}

fn default_throttle_axis() -> usize {
    5
}

fn default_brake_axis() -> usize {
    4
}

fn default_handbrake_button() -> usize {
    1
}

/// SDL game controller 轴顺序
fn default_axis_order() -> Vec<AxisName> {
    vec![
        AxisName::LeftStickX,
        AxisName::LeftStickY,
        AxisName::RightStickX,
        AxisName::RightStickY,
        AxisName::LeftTrigger2,
        AxisName::RightTrigger2,
    ]
}

/// Xbox 手柄常见按键顺序
fn default_button_order() -> Vec<ButtonName> {
    vec![
        ButtonName::South,
        ButtonName::East,
        ButtonName::West,
        ButtonName::North,
        ButtonName::LeftTrigger,
        ButtonName::RightTrigger,
        ButtonName::Select,
        ButtonName::Start,
        ButtonName::Mode,
        ButtonName::LeftThumb,
        ButtonName::RightThumb,
    ]
}

/// 显示配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DisplayConfig {
    /// 窗口标题
    #[serde(default = "default_window_title")]
    #[validate(length(min = 1))]
    pub window_title: String,

    /// 主循环轮询间隔 (毫秒)
    #[serde(default = "default_poll_interval_ms")]
    #[validate(range(min = 1))]
    pub poll_interval_ms: u64,

    /// 退出键
    #[serde(default = "default_quit_key")]
    pub quit_key: char,

    /// 是否叠加控制量读数
    #[serde(default = "default_show_readouts")]
    pub show_readouts: bool,

    /// 读数文字放大倍数
    #[serde(default = "default_text_scale")]
    #[validate(range(min = 1, max = 8))]
    pub text_scale: u32,
}

impl DisplayConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            window_title: default_window_title(),
            poll_interval_ms: default_poll_interval_ms(),
            quit_key: default_quit_key(),
            show_readouts: default_show_readouts(),
            text_scale: default_text_scale(),
        }
    }
}

fn default_window_title() -> String {
    "CARLA Cameras".to_string()
}

fn default_poll_interval_ms() -> u64 {
    1
}

fn default_quit_key() -> char {
    'q'
}

fn default_show_readouts() -> bool {
    true
}

fn default_text_scale() -> u32 {
    3
}
