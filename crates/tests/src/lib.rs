//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 配置文件到会话配置的贯通
//! - 模拟 e2e 测试（无需 CARLA、手柄和窗口）：
//!   mock 客户端 + mock 相机 + 脚本输入 + 无窗口显示

#[cfg(test)]
mod contract_tests {
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{CameraPosition, Transform};
    use session::SessionConfig;

    #[test]
    fn test_default_rig_geometry() {
        let config = ConfigLoader::load_or_default(None).unwrap();
        let rig = &config.cameras;

        assert_eq!(
            rig.mount_transform(CameraPosition::Front),
            Transform::at(2.5, 0.0, 0.7)
        );
        assert_eq!(
            rig.mount_transform(CameraPosition::Rear),
            Transform::at(-2.5, 0.0, 0.7)
        );
        assert_eq!(
            rig.mount_transform(CameraPosition::Left),
            Transform::at(0.0, 2.5, 0.7)
        );
        assert_eq!(
            rig.mount_transform(CameraPosition::Right),
            Transform::at(0.0, -2.5, 0.7)
        );
    }

    #[test]
    fn test_file_feeds_session_config() {
        let content = r#"
[display]
poll_interval_ms = 5
quit_key = "x"
"#;
        let config = ConfigLoader::load_from_str(content, ConfigFormat::Toml).unwrap();
        let session = SessionConfig::from_drive_config(&config, Some(10));

        assert_eq!(session.poll_interval, Duration::from_millis(5));
        assert_eq!(session.display.quit_key, 'x');
        assert_eq!(session.input.exit_button, 0);
        assert_eq!(session.max_iterations, Some(10));
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use actor_factory::{ActorFactory, ActorFactoryError, MockCarlaClient, MockConfig};
    use compositor::{HeadlessConfig, HeadlessDisplay};
    use contracts::{CameraPosition, DriveConfig, InputConfig};
    use controls::{InputSnapshot, ScriptedInput};
    use session::{
        attach_ingestion, DriveSession, ExitReason, SessionConfig, SessionError, SessionReport,
    };

    const CAMERA_COUNT: usize = 4;

    /// Observers that outlive the session
    struct Handles {
        client: MockCarlaClient,
        vehicle_id: u32,
        input_releases: Arc<AtomicUsize>,
        display_closes: Arc<AtomicUsize>,
    }

    impl Handles {
        /// Each session actor destroyed once, input and display released once
        fn assert_torn_down_once(&self) {
            let destroyed = self.client.destroyed_actors();
            assert_eq!(destroyed.len(), CAMERA_COUNT + 1, "{destroyed:?}");
            assert_eq!(destroyed.last(), Some(&self.vehicle_id));
            assert_eq!(self.client.actor_count(), 0);
            assert_eq!(self.input_releases.load(Ordering::SeqCst), 1);
            assert_eq!(self.display_closes.load(Ordering::SeqCst), 1);
        }
    }

    fn small_config() -> DriveConfig {
        let mut config = DriveConfig::default();
        config.cameras.image_width = 32;
        config.cameras.image_height = 24;
        config
    }

    fn idle() -> InputSnapshot {
        InputSnapshot::neutral(&InputConfig::default())
    }

    fn driving(steer: f32, throttle_axis: f32) -> InputSnapshot {
        let mut snapshot = idle();
        snapshot.axes[0] = steer;
        snapshot.axes[5] = throttle_axis;
        snapshot
    }

    fn exit_pressed() -> InputSnapshot {
        let mut snapshot = idle();
        snapshot.buttons[0] = true;
        snapshot
    }

    async fn start(
        mock: MockConfig,
        script: Vec<InputSnapshot>,
        display: HeadlessConfig,
        config: &DriveConfig,
        max_iterations: Option<u64>,
    ) -> (
        DriveSession<MockCarlaClient, ScriptedInput, HeadlessDisplay>,
        Handles,
    ) {
        let client = MockCarlaClient::with_config(mock);
        let mut factory = ActorFactory::new(client.clone());
        factory.connect(&config.simulator).await.unwrap();
        let actors = factory
            .bootstrap(&config.simulator, &config.cameras)
            .await
            .unwrap();
        let ingestion =
            attach_ingestion(&factory, &actors, config.cameras.queue_capacity).unwrap();

        let input = ScriptedInput::new(script);
        let display = HeadlessDisplay::new(display).unwrap();
        let handles = Handles {
            client,
            vehicle_id: actors.vehicle_id(),
            input_releases: input.release_counter(),
            display_closes: display.close_counter(),
        };

        let session = DriveSession::new(
            factory,
            actors,
            ingestion,
            input,
            display,
            SessionConfig::from_drive_config(config, max_iterations),
        );
        (session, handles)
    }

    async fn run_bounded(
        session: DriveSession<MockCarlaClient, ScriptedInput, HeadlessDisplay>,
    ) -> Result<SessionReport, SessionError> {
        tokio::time::timeout(Duration::from_secs(20), session.run(std::future::pending()))
            .await
            .expect("session did not stop")
    }

    #[tokio::test]
    async fn test_exit_button_tears_down_once() {
        let config = small_config();
        let script = vec![driving(0.1, 0.0), driving(0.2, 0.0), exit_pressed()];
        let (session, handles) = start(
            MockConfig::default(),
            script,
            HeadlessConfig::default(),
            &config,
            None,
        )
        .await;

        let report = run_bounded(session).await.unwrap();

        assert_eq!(report.exit_reason, ExitReason::ExitButton);
        // exit is checked before control: only the two driving snapshots were applied
        let applied = handles.client.applied_controls();
        assert_eq!(applied.len(), 2);
        assert!((applied[1].steer - 0.2).abs() < 1e-6);
        assert!((report.last_command.throttle - 0.5).abs() < 1e-6);
        handles.assert_torn_down_once();
    }

    #[tokio::test]
    async fn test_quit_key_after_composites() {
        let config = small_config();
        let (session, handles) = start(
            MockConfig {
                camera_frequency_hz: 100.0,
                ..Default::default()
            },
            vec![idle()],
            HeadlessConfig {
                output_dir: None,
                quit_after: Some(3),
            },
            &config,
            None,
        )
        .await;

        let report = run_bounded(session).await.unwrap();

        assert_eq!(report.exit_reason, ExitReason::QuitKey);
        assert_eq!(report.composites_shown(), 3);
        handles.assert_torn_down_once();
    }

    #[tokio::test]
    async fn test_interrupt_tears_down_once() {
        let config = small_config();
        let (session, handles) = start(
            MockConfig::default(),
            vec![idle()],
            HeadlessConfig::default(),
            &config,
            None,
        )
        .await;

        let report = session
            .run(tokio::time::sleep(Duration::from_millis(50)))
            .await
            .unwrap();

        assert_eq!(report.exit_reason, ExitReason::Interrupt);
        assert!(report.iterations() > 0);
        handles.assert_torn_down_once();
    }

    #[tokio::test]
    async fn test_control_failure_mid_loop() {
        let config = small_config();
        let (session, handles) = start(
            MockConfig {
                fail_control_after: Some(5),
                ..Default::default()
            },
            vec![idle()],
            HeadlessConfig::default(),
            &config,
            None,
        )
        .await;

        let err = run_bounded(session).await.unwrap_err();

        assert!(matches!(
            err,
            SessionError::Simulator(ActorFactoryError::ControlFailed { .. })
        ));
        assert_eq!(handles.client.applied_controls().len(), 5);
        handles.assert_torn_down_once();
    }

    #[tokio::test]
    async fn test_silent_camera_blocks_composites() {
        let mut config = small_config();
        config.cameras.queue_capacity = 2;
        let (session, handles) = start(
            MockConfig {
                camera_frequency_hz: 200.0,
                silent_cameras: vec![CameraPosition::Left],
                ..Default::default()
            },
            vec![idle()],
            HeadlessConfig::default(),
            &config,
            None,
        )
        .await;

        let report = session
            .run(tokio::time::sleep(Duration::from_millis(200)))
            .await
            .unwrap();

        assert_eq!(report.composites_shown(), 0);
        assert_eq!(report.composites_skipped(), report.iterations());
        let left = &report.cameras[CameraPosition::Left.index()];
        assert_eq!(left.frames_received, 0);
        let front = &report.cameras[CameraPosition::Front.index()];
        assert!(front.frames_received > 2);
        assert!(front.frames_dropped > 0, "{front:?}");
        handles.assert_torn_down_once();
    }

    #[tokio::test]
    async fn test_iteration_limit_and_saved_composites() {
        let dir = tempfile::tempdir().unwrap();
        let config = small_config();
        let (session, handles) = start(
            MockConfig {
                camera_frequency_hz: 100.0,
                ..Default::default()
            },
            vec![driving(-0.5, 1.0)],
            HeadlessConfig {
                output_dir: Some(dir.path().to_path_buf()),
                quit_after: None,
            },
            &config,
            Some(300),
        )
        .await;

        let report = run_bounded(session).await.unwrap();

        assert_eq!(report.exit_reason, ExitReason::IterationLimit);
        assert_eq!(report.iterations(), 300);
        assert!(report.composites_shown() > 0);

        let first = image::open(dir.path().join("000000.png")).unwrap().to_rgb8();
        assert_eq!(first.dimensions(), (4 * 32, 24));
        // mock colours per camera: front red, rear green, left blue, right white
        assert_eq!(first.get_pixel(31, 23).0, [255, 0, 0]);
        assert_eq!(first.get_pixel(63, 23).0, [0, 255, 0]);
        assert_eq!(first.get_pixel(95, 23).0, [0, 0, 255]);
        assert_eq!(first.get_pixel(127, 23).0, [255, 255, 255]);
        handles.assert_torn_down_once();
    }

    #[tokio::test]
    async fn test_no_spawn_location_creates_nothing() {
        let config = small_config();
        let client = MockCarlaClient::with_config(MockConfig {
            spawn_points: 3,
            occupied_spawn_points: vec![0, 1, 2],
            ..Default::default()
        });
        let mut factory = ActorFactory::new(client.clone());
        factory.connect(&config.simulator).await.unwrap();

        let err = factory
            .bootstrap(&config.simulator, &config.cameras)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ActorFactoryError::NoSpawnLocation { attempts: 3 }
        ));
        assert_eq!(client.vehicle_count(), 0);
        assert_eq!(client.spawn_attempts(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_camera_failure_rolls_back() {
        let config = small_config();
        let client = MockCarlaClient::with_config(MockConfig {
            fail_sensor_spawn: Some(2),
            ..Default::default()
        });
        let mut factory = ActorFactory::new(client.clone());
        factory.connect(&config.simulator).await.unwrap();

        let result = factory.bootstrap(&config.simulator, &config.cameras).await;

        assert!(matches!(
            result,
            Err(ActorFactoryError::SensorSpawnFailed {
                position: CameraPosition::Left,
                ..
            })
        ));
        assert_eq!(client.actor_count(), 0);
    }
}
