//! ActorFactory 核心实现
//!
//! 车辆 bootstrap (逐个尝试 spawn point)、相机组挂载、控制下发和 teardown。

use contracts::{
    ActorId, CameraPosition, CameraRigConfig, CameraSource, ControlCommand, SessionActors,
    SimulatorConfig, SpawnedVehicle,
};
use tracing::{error, info, instrument, warn};

use crate::client::SimClient;
use crate::error::{ActorFactoryError, Result};

/// Actor Factory
///
/// 负责 spawn 车辆与四个相机，并提供 teardown 和回滚能力。
pub struct ActorFactory<C: SimClient> {
    client: C,
}

impl<C: SimClient> ActorFactory<C> {
    /// 创建新的 ActorFactory
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// 底层客户端
    pub fn client(&self) -> &C {
        &self.client
    }

    /// 连接仿真器
    #[instrument(
        name = "actor_factory_connect",
        skip(self, config),
        fields(host = %config.host, port = config.port)
    )]
    pub async fn connect(&mut self, config: &SimulatorConfig) -> Result<()> {
        self.client
            .connect(&config.host, config.port, config.timeout()?)
            .await?;
        info!("connected to simulator");
        Ok(())
    }

    /// 完整 bootstrap：spawn 车辆并挂载相机组
    ///
    /// # 原子性保证
    /// 失败时不会留下任何 actor。
    pub async fn bootstrap(
        &self,
        simulator: &SimulatorConfig,
        rig: &CameraRigConfig,
    ) -> Result<SessionActors> {
        let vehicle = self.spawn_vehicle(&simulator.vehicle_filter).await?;
        self.attach_camera_rig(vehicle, rig).await
    }

    /// 按地图顺序尝试 spawn point，返回第一个成功的车辆
    ///
    /// 单个 spawn point 失败只记录 warn 并继续；全部失败返回
    /// [`ActorFactoryError::NoSpawnLocation`]，此时没有创建任何车辆。
    #[instrument(name = "actor_factory_spawn_vehicle", skip(self), fields(filter = %filter))]
    pub async fn spawn_vehicle(&self, filter: &str) -> Result<SpawnedVehicle> {
        let blueprint = self.client.find_vehicle_blueprint(filter).await?;
        let spawn_points = self.client.spawn_points().await?;
        info!(
            blueprint = %blueprint,
            candidates = spawn_points.len(),
            "spawning vehicle"
        );

        let mut attempts = 0;
        for (spawn_index, transform) in spawn_points.into_iter().enumerate() {
            attempts += 1;
            match self.client.try_spawn_vehicle(&blueprint, transform).await {
                Ok(actor_id) => {
                    let vehicle = SpawnedVehicle {
                        actor_id,
                        blueprint,
                        spawn_index,
                        attempts,
                    };
                    self.disable_autopilot(&vehicle).await?;
                    info!(actor_id, spawn_index, attempts, "vehicle spawned successfully");
                    return Ok(vehicle);
                }
                Err(e) => {
                    warn!(spawn_index, error = %e, "spawn point rejected, trying next");
                }
            }
        }

        error!(attempts, "no free spawn location");
        Err(ActorFactoryError::NoSpawnLocation { attempts })
    }

    async fn disable_autopilot(&self, vehicle: &SpawnedVehicle) -> Result<()> {
        if let Err(e) = self.client.set_autopilot(vehicle.actor_id, false).await {
            warn!(actor_id = vehicle.actor_id, error = %e, "autopilot disable failed, destroying vehicle");
            self.destroy_actor_safe(vehicle.actor_id, "vehicle").await;
            return Err(e);
        }
        Ok(())
    }

    /// 挂载前/后/左/右四个相机
    ///
    /// 任一相机失败时，回滚已挂载的相机和车辆。
    #[instrument(
        name = "actor_factory_attach_camera_rig",
        skip(self, vehicle, rig),
        fields(vehicle_id = vehicle.actor_id)
    )]
    pub async fn attach_camera_rig(
        &self,
        vehicle: SpawnedVehicle,
        rig: &CameraRigConfig,
    ) -> Result<SessionActors> {
        let mut actors = SessionActors::new(vehicle);

        for position in CameraPosition::ALL {
            match self.attach_camera(actors.vehicle_id(), position, rig).await {
                Ok(camera_id) => actors.register_camera(position, camera_id),
                Err(e) => {
                    warn!(
                        camera = %position,
                        error = %e,
                        "camera attach failed, rolling back session actors"
                    );
                    self.rollback(&actors).await;
                    return Err(e);
                }
            }
        }

        info!(cameras = actors.cameras.len(), "camera rig attached");
        Ok(actors)
    }

    /// Spawn 单个相机并挂到车辆上
    #[instrument(
        name = "actor_factory_attach_camera",
        skip(self, rig),
        fields(camera = %position)
    )]
    pub async fn attach_camera(
        &self,
        vehicle_id: ActorId,
        position: CameraPosition,
        rig: &CameraRigConfig,
    ) -> Result<ActorId> {
        let transform = rig.mount_transform(position);
        self.client
            .spawn_sensor(&rig.blueprint, transform, vehicle_id, &rig.attributes())
            .await
            .map_err(|e| ActorFactoryError::sensor_spawn(position, vehicle_id, e.to_string()))
            .inspect(|&actor_id| {
                info!(actor_id, "camera spawned and attached successfully");
            })
    }

    /// 四个相机的图像源，按 rig 顺序
    pub fn camera_sources(
        &self,
        actors: &SessionActors,
    ) -> Result<Vec<Box<dyn CameraSource>>> {
        actors
            .cameras
            .iter()
            .map(|&(position, actor_id)| {
                self.client
                    .camera_source(actor_id, position)
                    .ok_or(ActorFactoryError::ActorNotFound { actor_id })
            })
            .collect()
    }

    /// 下发一次控制量
    pub async fn apply_control(&self, vehicle_id: ActorId, command: &ControlCommand) -> Result<()> {
        self.client.apply_control(vehicle_id, command).await
    }

    /// 销毁 session 的所有 actors：先相机，后车辆
    ///
    /// # 幂等性
    /// 多次调用安全，不存在的 actor 会被忽略。
    /// 单个 actor 销毁失败不会中断其余 actor 的销毁，返回第一个错误。
    #[instrument(
        name = "actor_factory_teardown",
        skip(self, actors),
        fields(vehicle_id = actors.vehicle_id(), camera_count = actors.cameras.len())
    )]
    pub async fn teardown(&self, actors: &SessionActors) -> Result<()> {
        info!("starting teardown");

        let mut first_error = None;
        for (position, actor_id) in &actors.cameras {
            if let Err(e) = self.destroy_actor(*actor_id, position.as_str()).await {
                first_error.get_or_insert(e);
            }
        }
        if let Err(e) = self.destroy_actor(actors.vehicle_id(), "vehicle").await {
            first_error.get_or_insert(e);
        }

        match first_error {
            None => {
                info!("teardown completed");
                Ok(())
            }
            Some(e) => Err(e),
        }
    }

    /// 回滚：销毁所有已创建的 actors
    async fn rollback(&self, actors: &SessionActors) {
        warn!("performing rollback");
        for (position, actor_id) in &actors.cameras {
            self.destroy_actor_safe(*actor_id, position.as_str()).await;
        }
        self.destroy_actor_safe(actors.vehicle_id(), "vehicle").await;
    }

    #[instrument(name = "actor_factory_destroy_actor", skip(self, role), fields(actor_id, role = %role))]
    async fn destroy_actor(&self, actor_id: ActorId, role: &str) -> Result<()> {
        info!("destroying actor");
        self.client.destroy_actor(actor_id).await.inspect_err(|e| {
            error!(actor_id, role, error = %e, "failed to destroy actor");
        })
    }

    /// 安全销毁 actor（忽略错误，仅记录日志）
    async fn destroy_actor_safe(&self, actor_id: ActorId, role: &str) {
        let _ = self.destroy_actor(actor_id, role).await;
    }
}
