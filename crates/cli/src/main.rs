//! # CARLA Drive CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 配置加载、覆盖与验证
//! - 手柄驾驶会话编排
//! - 优雅关闭处理 (退出键、退出按键、Ctrl+C)

mod cli;
mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_drive, run_validate};

// show-image 需要主线程运行窗口事件循环，业务逻辑在它创建的线程上执行
#[cfg_attr(feature = "window", show_image::main)]
fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_observability(&cli)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "CARLA Drive CLI starting"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    let result = runtime.block_on(async {
        match &cli.command {
            Commands::Run(args) => run_drive(args).await,
            Commands::Validate(args) => run_validate(args),
        }
    });

    if let Err(ref e) = result {
        tracing::error!(error = format!("{e:#}"), "Command failed");
    }

    result
}

/// Initialize tracing and, for `run`, the optional Prometheus endpoint
fn init_observability(cli: &Cli) -> Result<()> {
    let metrics_port = match &cli.command {
        Commands::Run(args) if !args.dry_run => args.metrics_port(),
        _ => None,
    };

    observability::init_with_config(ObservabilityConfig {
        log_format: cli.log_format.into(),
        metrics_port,
        default_log_level: cli.log_level().to_string(),
    })
}
