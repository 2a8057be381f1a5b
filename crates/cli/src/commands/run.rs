//! `run` command implementation.

use anyhow::{Context, Result};
use tracing::{info, warn};

use actor_factory::{ActorFactory, SimClient};
use compositor::DisplaySurface;
use config_loader::ConfigLoader;
use contracts::{DisplayConfig, DriveConfig, InputConfig};
use controls::InputDevice;
use session::{abort_startup, attach_ingestion, DriveSession, SessionConfig, SessionReport};

use crate::cli::RunArgs;

/// Execute the `run` command
pub async fn run_drive(args: &RunArgs) -> Result<()> {
    let config = load_config(args)?;

    info!(
        host = %config.simulator.host,
        port = config.simulator.port,
        vehicle_filter = %config.simulator.vehicle_filter,
        resolution = format!("{}x{}", config.cameras.image_width, config.cameras.image_height),
        queue_capacity = config.cameras.queue_capacity,
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&config);
        return Ok(());
    }

    // Startup order: input, simulator, cameras, display
    let input = open_input(&config.input)?;

    let report = drive(new_client(&config), input, &config, args.max_iterations()).await?;

    info!(
        reason = %report.exit_reason,
        composites = report.composites_shown(),
        duration_secs = report.duration.as_secs_f64(),
        "Drive finished"
    );
    println!("\n{report}");
    Ok(())
}

/// Load the config file (or defaults), apply CLI/env overrides and validate
fn load_config(args: &RunArgs) -> Result<DriveConfig> {
    let mut config = match &args.config {
        Some(path) => {
            info!(config = %path.display(), "Loading configuration");
            ConfigLoader::load_from_path(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?
        }
        None => {
            info!("No configuration file given, using defaults");
            DriveConfig::default()
        }
    };

    if let Some(ref host) = args.host {
        info!(host = %host, "Overriding CARLA host from CLI");
        config.simulator.host = host.clone();
    }
    if let Some(port) = args.port {
        info!(port, "Overriding CARLA port from CLI");
        config.simulator.port = port;
    }
    if let Some(timeout) = args.timeout {
        info!(timeout, "Overriding connection timeout from CLI");
        config.simulator.timeout_secs = timeout;
    }
    if let Some(ref filter) = args.vehicle_filter {
        info!(filter = %filter, "Overriding vehicle filter from CLI");
        config.simulator.vehicle_filter = filter.clone();
    }
    if let Some(capacity) = args.queue_capacity {
        info!(capacity, "Overriding queue capacity from CLI");
        config.cameras.queue_capacity = capacity;
    }

    ConfigLoader::validate(&config).context("Invalid configuration")?;
    Ok(config)
}

#[cfg(feature = "gamepad")]
fn open_input(config: &InputConfig) -> Result<Box<dyn InputDevice>> {
    let joystick = controls::GilrsJoystick::open(config).context("No usable joystick")?;
    info!(device = %joystick.name(), "Joystick opened");
    Ok(Box::new(joystick))
}

#[cfg(not(feature = "gamepad"))]
fn open_input(config: &InputConfig) -> Result<Box<dyn InputDevice>> {
    warn!("Built without joystick support, input stays neutral");
    Ok(Box::new(controls::IdleInput::new(config)))
}

#[cfg(feature = "window")]
fn open_display(config: &DisplayConfig) -> Result<Box<dyn DisplaySurface>> {
    let window = compositor::ShowImageWindow::open(config).context("Failed to open window")?;
    Ok(Box::new(window))
}

#[cfg(not(feature = "window"))]
fn open_display(config: &DisplayConfig) -> Result<Box<dyn DisplaySurface>> {
    warn!(title = %config.window_title, "Built without window support, composites are not shown");
    let display = compositor::HeadlessDisplay::new(compositor::HeadlessConfig::default())
        .context("Failed to create headless display")?;
    Ok(Box::new(display))
}

#[cfg(feature = "real-carla")]
fn new_client(_config: &DriveConfig) -> actor_factory::RealCarlaClient {
    actor_factory::RealCarlaClient::new()
}

#[cfg(not(feature = "real-carla"))]
fn new_client(config: &DriveConfig) -> actor_factory::MockCarlaClient {
    info!("Running in MOCK mode (no CARLA server required)");
    let tick = config.cameras.sensor_tick;
    actor_factory::MockCarlaClient::with_config(actor_factory::MockConfig {
        camera_frequency_hz: if tick > 0.0 { 1.0 / tick } else { 20.0 },
        ..Default::default()
    })
}

/// Connect, spawn, attach cameras, open the display and run the session
async fn drive<C: SimClient>(
    client: C,
    input: Box<dyn InputDevice>,
    config: &DriveConfig,
    max_iterations: Option<u64>,
) -> Result<SessionReport> {
    let mut factory = ActorFactory::new(client);
    factory
        .connect(&config.simulator)
        .await
        .with_context(|| {
            format!(
                "Failed to connect to CARLA at {}:{}",
                config.simulator.host, config.simulator.port
            )
        })?;

    let actors = factory
        .bootstrap(&config.simulator, &config.cameras)
        .await
        .context("Failed to spawn vehicle and cameras")?;
    info!(
        vehicle_id = actors.vehicle_id(),
        blueprint = %actors.vehicle.blueprint,
        spawn_index = actors.vehicle.spawn_index,
        cameras = actors.cameras.len(),
        "Actors spawned successfully"
    );

    let ingestion = match attach_ingestion(&factory, &actors, config.cameras.queue_capacity) {
        Ok(ingestion) => ingestion,
        Err(e) => {
            abort_startup(&factory, &actors).await;
            return Err(e).context("Failed to set up camera ingestion");
        }
    };

    let display = match open_display(&config.display) {
        Ok(display) => display,
        Err(e) => {
            drop(ingestion);
            abort_startup(&factory, &actors).await;
            return Err(e);
        }
    };

    let session = DriveSession::new(
        factory,
        actors,
        ingestion,
        input,
        display,
        SessionConfig::from_drive_config(config, max_iterations),
    );

    info!("Starting drive loop...");
    session
        .run(shutdown_signal())
        .await
        .context("Drive session failed")
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(config: &DriveConfig) {
    println!("\n=== Configuration Summary ===\n");
    println!("Simulator:");
    println!("  CARLA: {}:{}", config.simulator.host, config.simulator.port);
    println!("  Timeout: {}s", config.simulator.timeout_secs);
    println!("  Vehicle filter: {}", config.simulator.vehicle_filter);

    let cameras = &config.cameras;
    println!("\nCameras (front, rear, left, right):");
    println!(
        "  {} {}x{} fov={} tick={}s",
        cameras.blueprint, cameras.image_width, cameras.image_height, cameras.fov, cameras.sensor_tick
    );
    println!(
        "  Mount: {} m out, {} m up, queue capacity {}",
        cameras.mount_distance, cameras.mount_height, cameras.queue_capacity
    );

    let input = &config.input;
    println!("\nInput (device #{}):", input.device_index);
    println!(
        "  Steer axis {}, throttle axis {}, brake axis {}",
        input.steer_axis, input.throttle_axis, input.brake_axis
    );
    println!(
        "  Handbrake button {}, exit button {}",
        input.handbrake_button, input.exit_button
    );

    println!("\nDisplay:");
    println!("  Title: {}", config.display.window_title);
    println!("  Quit key: '{}'", config.display.quit_key);
    println!();
}
