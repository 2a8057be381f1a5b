//! Mock CARLA 客户端
//!
//! 用于单元测试和无 CARLA 环境运行的 mock 实现，支持注入失败场景。
//! 克隆共享同一份状态，测试可以在 session 结束后检查记录。

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use contracts::{ActorId, CameraPosition, CameraSource, ControlCommand, Transform};
use tracing::{debug, instrument};

use crate::client::SimClient;
use crate::error::{ActorFactoryError, Result};
use crate::mock_camera::{MockCamera, MockCameraConfig};

/// Mock 客户端配置
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// 地图上的 spawn point 数量
    pub spawn_points: usize,
    /// 已被占用的 spawn point 下标 (spawn 会失败)
    pub occupied_spawn_points: Vec<usize>,
    /// 蓝图库中的车辆蓝图
    pub vehicle_blueprints: Vec<String>,
    /// 第 N 次 (从 0 开始) sensor spawn 失败
    pub fail_sensor_spawn: Option<usize>,
    /// 成功 apply_control N 次之后失败
    pub fail_control_after: Option<usize>,
    /// 应该失败的 destroy actor IDs
    pub fail_destroy: Vec<ActorId>,
    /// mock 相机发送频率 (Hz)
    pub camera_frequency_hz: f64,
    /// 不产生图像的相机位置
    pub silent_cameras: Vec<CameraPosition>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            spawn_points: 8,
            occupied_spawn_points: Vec::new(),
            vehicle_blueprints: vec![
                "vehicle.audi.tt".to_string(),
                "vehicle.tesla.model3".to_string(),
            ],
            fail_sensor_spawn: None,
            fail_control_after: None,
            fail_destroy: Vec::new(),
            camera_frequency_hz: 20.0,
            silent_cameras: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
enum MockActor {
    Vehicle { blueprint: String, autopilot: bool },
    Sensor { attributes: HashMap<String, String> },
}

#[derive(Default)]
struct MockState {
    /// 已创建的 actors
    actors: HashMap<ActorId, MockActor>,
    /// 连接状态
    connected: bool,
    /// 尝试过的 spawn point 下标
    spawn_attempts: Vec<usize>,
    /// sensor spawn 次数
    sensor_spawns: usize,
    /// 已应用的控制量
    applied_controls: Vec<ControlCommand>,
    /// 已销毁的 actors (按销毁顺序)
    destroyed: Vec<ActorId>,
}

/// Mock CARLA 客户端
#[derive(Clone)]
pub struct MockCarlaClient {
    /// 配置（可注入失败场景）
    config: Arc<MockConfig>,
    /// Actor ID 计数器
    next_actor_id: Arc<AtomicU32>,
    state: Arc<Mutex<MockState>>,
}

impl MockCarlaClient {
    /// 创建默认 mock 客户端
    pub fn new() -> Self {
        Self::with_config(MockConfig::default())
    }

    /// 使用配置创建 mock 客户端
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            config: Arc::new(config),
            next_actor_id: Arc::new(AtomicU32::new(1000)), // 从 1000 开始，便于识别
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// 获取当前存活的 actor 数量
    pub fn actor_count(&self) -> usize {
        self.state().actors.len()
    }

    /// 存活的车辆数量
    pub fn vehicle_count(&self) -> usize {
        self.state()
            .actors
            .values()
            .filter(|a| matches!(a, MockActor::Vehicle { .. }))
            .count()
    }

    /// 尝试过的 spawn point 下标 (按尝试顺序)
    pub fn spawn_attempts(&self) -> Vec<usize> {
        self.state().spawn_attempts.clone()
    }

    /// 已应用的控制量 (按应用顺序)
    pub fn applied_controls(&self) -> Vec<ControlCommand> {
        self.state().applied_controls.clone()
    }

    /// 已销毁的 actor IDs (按销毁顺序)
    pub fn destroyed_actors(&self) -> Vec<ActorId> {
        self.state().destroyed.clone()
    }

    /// 车辆的 autopilot 状态
    pub fn autopilot(&self, vehicle_id: ActorId) -> Option<bool> {
        match self.state().actors.get(&vehicle_id) {
            Some(MockActor::Vehicle { autopilot, .. }) => Some(*autopilot),
            _ => None,
        }
    }

    /// 车辆的蓝图
    pub fn vehicle_blueprint(&self, vehicle_id: ActorId) -> Option<String> {
        match self.state().actors.get(&vehicle_id) {
            Some(MockActor::Vehicle { blueprint, .. }) => Some(blueprint.clone()),
            _ => None,
        }
    }

    /// sensor 的蓝图属性
    pub fn sensor_attributes(&self, sensor_id: ActorId) -> Option<HashMap<String, String>> {
        match self.state().actors.get(&sensor_id) {
            Some(MockActor::Sensor { attributes }) => Some(attributes.clone()),
            _ => None,
        }
    }

    /// 第 `index` 个 spawn point 的位姿
    pub fn spawn_point(index: usize) -> Transform {
        Transform::at(index as f64 * 10.0, 0.0, 0.5)
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn allocate_actor_id(&self) -> ActorId {
        self.next_actor_id.fetch_add(1, Ordering::SeqCst)
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.state().connected {
            Ok(())
        } else {
            Err(ActorFactoryError::ConnectionFailed {
                message: "not connected".into(),
            })
        }
    }

    fn spawn_index(&self, transform: &Transform) -> Option<usize> {
        (0..self.config.spawn_points).find(|&i| Self::spawn_point(i) == *transform)
    }
}

impl Default for MockCarlaClient {
    fn default() -> Self {
        Self::new()
    }
}

/// 蓝图过滤：支持 `*` 通配符，例如 "vehicle.*"
fn matches_filter(pattern: &str, id: &str) -> bool {
    let mut parts = pattern.split('*');
    let Some(first) = parts.next() else {
        return true;
    };
    let Some(mut rest) = id.strip_prefix(first) else {
        return false;
    };
    let parts: Vec<&str> = parts.collect();
    let Some((last, middle)) = parts.split_last() else {
        // no wildcard
        return rest.is_empty();
    };
    for part in middle {
        match rest.find(part) {
            Some(at) => rest = &rest[at + part.len()..],
            None => return false,
        }
    }
    rest.ends_with(last)
}

impl SimClient for MockCarlaClient {
    #[instrument(name = "mock_carla_connect", skip(self, timeout), fields(host = %host, port = port))]
    async fn connect(&mut self, host: &str, port: u16, timeout: Duration) -> Result<()> {
        let _ = (host, port, timeout);
        self.state().connected = true;
        Ok(())
    }

    async fn find_vehicle_blueprint(&self, filter: &str) -> Result<String> {
        self.ensure_connected()?;
        self.config
            .vehicle_blueprints
            .iter()
            .find(|bp| matches_filter(filter, bp))
            .cloned()
            .ok_or_else(|| ActorFactoryError::BlueprintNotFound {
                filter: filter.to_string(),
            })
    }

    async fn spawn_points(&self) -> Result<Vec<Transform>> {
        self.ensure_connected()?;
        Ok((0..self.config.spawn_points).map(Self::spawn_point).collect())
    }

    #[instrument(
        name = "mock_carla_spawn_vehicle",
        skip(self, transform),
        fields(blueprint = %blueprint)
    )]
    async fn try_spawn_vehicle(&self, blueprint: &str, transform: Transform) -> Result<ActorId> {
        self.ensure_connected()?;

        let index = self
            .spawn_index(&transform)
            .ok_or_else(|| ActorFactoryError::spawn_failed(blueprint, "not a spawn point"))?;
        self.state().spawn_attempts.push(index);

        if self.config.occupied_spawn_points.contains(&index) {
            return Err(ActorFactoryError::spawn_failed(
                blueprint,
                format!("spawn point {index} is occupied"),
            ));
        }

        let actor_id = self.allocate_actor_id();
        self.state().actors.insert(
            actor_id,
            MockActor::Vehicle {
                blueprint: blueprint.to_string(),
                autopilot: true,
            },
        );
        Ok(actor_id)
    }

    async fn set_autopilot(&self, vehicle_id: ActorId, enabled: bool) -> Result<()> {
        match self.state().actors.get_mut(&vehicle_id) {
            Some(MockActor::Vehicle { autopilot, .. }) => {
                *autopilot = enabled;
                Ok(())
            }
            _ => Err(ActorFactoryError::ActorNotFound {
                actor_id: vehicle_id,
            }),
        }
    }

    #[instrument(
        name = "mock_carla_spawn_sensor",
        skip(self, _transform, attributes),
        fields(blueprint = %blueprint, parent_id)
    )]
    async fn spawn_sensor(
        &self,
        blueprint: &str,
        _transform: Transform,
        parent_id: ActorId,
        attributes: &HashMap<String, String>,
    ) -> Result<ActorId> {
        self.ensure_connected()?;

        let mut state = self.state();
        // 验证 parent 存在
        if !state.actors.contains_key(&parent_id) {
            return Err(ActorFactoryError::spawn_failed(
                blueprint,
                format!("parent actor {parent_id} not found"),
            ));
        }

        let spawn_number = state.sensor_spawns;
        state.sensor_spawns += 1;
        if self.config.fail_sensor_spawn == Some(spawn_number) {
            return Err(ActorFactoryError::spawn_failed(blueprint, "mock failure"));
        }

        let actor_id = self.allocate_actor_id();
        state.actors.insert(
            actor_id,
            MockActor::Sensor {
                attributes: attributes.clone(),
            },
        );
        Ok(actor_id)
    }

    async fn apply_control(&self, vehicle_id: ActorId, command: &ControlCommand) -> Result<()> {
        let mut state = self.state();
        if !matches!(state.actors.get(&vehicle_id), Some(MockActor::Vehicle { .. })) {
            return Err(ActorFactoryError::ControlFailed {
                actor_id: vehicle_id,
                message: "vehicle not found".into(),
            });
        }
        if let Some(limit) = self.config.fail_control_after {
            if state.applied_controls.len() >= limit {
                return Err(ActorFactoryError::ControlFailed {
                    actor_id: vehicle_id,
                    message: "mock failure".into(),
                });
            }
        }
        state.applied_controls.push(*command);
        Ok(())
    }

    #[instrument(name = "mock_carla_destroy_actor", skip(self), fields(actor_id))]
    async fn destroy_actor(&self, actor_id: ActorId) -> Result<()> {
        if self.config.fail_destroy.contains(&actor_id) {
            return Err(ActorFactoryError::DestroyFailed {
                actor_id,
                message: "mock failure".into(),
            });
        }

        // 幂等：即使不存在也返回 Ok
        let mut state = self.state();
        if state.actors.remove(&actor_id).is_some() {
            state.destroyed.push(actor_id);
        }
        Ok(())
    }

    fn camera_source(
        &self,
        actor_id: ActorId,
        position: CameraPosition,
    ) -> Option<Box<dyn CameraSource>> {
        let attributes = self.sensor_attributes(actor_id)?;
        let dimension = |key: &str, default: u32| {
            attributes
                .get(key)
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        };
        let silent = self.config.silent_cameras.contains(&position);
        debug!(actor_id, camera = %position, silent, "mock camera source created");

        let config = MockCameraConfig {
            frequency_hz: self.config.camera_frequency_hz,
            image_width: dimension("image_size_x", 800),
            image_height: dimension("image_size_y", 600),
            silent,
        };
        Some(Box::new(MockCamera::new(position, config)))
    }
}
