//! # Observability
//!
//! 驾驶会话的日志与指标。
//!
//! - `tracing` 订阅器：JSON / Pretty / Compact，`RUST_LOG` 优先
//! - 可选 Prometheus 端点，导出 `carla_drive_*` 指标
//! - 主循环统计 ([`LoopMetricsAggregator`])
//!
//! ```ignore
//! observability::init_with_config(ObservabilityConfig {
//!     log_format: LogFormat::Compact,
//!     metrics_port: Some(9000),
//!     ..Default::default()
//! })?;
//! ```

pub mod metrics;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub use crate::metrics::{
    record_composite_shown, record_composite_skipped, record_control, record_exit,
    record_loop_latency_ms, record_queue_depths, LoopMetricsAggregator, LoopSummary,
    RunningStats, StatsSummary,
};

/// 窗口和手柄后端每帧都会打日志，默认压到 warn
const QUIET_TARGETS: &[&str] = &["winit=warn", "wgpu=warn", "naga=warn", "gilrs=warn"];

/// 可观测性配置
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// 日志格式
    pub log_format: LogFormat,
    /// Prometheus 端口 (None 或 0 = 禁用)
    pub metrics_port: Option<u16>,
    /// 未设置 RUST_LOG 时的日志级别
    pub default_log_level: String,
}

impl ObservabilityConfig {
    /// 实际监听的指标端口
    pub fn metrics_listen_port(&self) -> Option<u16> {
        self.metrics_port.filter(|&port| port != 0)
    }

    /// 未设置 RUST_LOG 时使用的过滤指令
    fn default_directives(&self) -> String {
        std::iter::once(self.default_log_level.as_str())
            .chain(QUIET_TARGETS.iter().copied())
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Json,
            metrics_port: None,
            default_log_level: "info".to_string(),
        }
    }
}

/// 日志格式
#[derive(Debug, Clone, Copy, Default)]
pub enum LogFormat {
    /// JSON 结构化日志
    #[default]
    Json,
    /// 人类可读格式
    Pretty,
    /// 紧凑单行格式
    Compact,
}

/// 初始化日志订阅器和 (可选的) Prometheus 导出器
///
/// 只能调用一次，重复调用返回错误。
pub fn init_with_config(config: ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.default_directives()))
        .context("invalid log filter")?;

    let fmt_layer = match config.log_format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(false).boxed(),
    };

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(filter))
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    if let Some(port) = config.metrics_listen_port() {
        PrometheusBuilder::new()
            .with_http_listener(([0, 0, 0, 0], port))
            .install()
            .with_context(|| format!("Failed to serve drive metrics on port {port}"))?;
        tracing::info!(port, "Prometheus metrics endpoint initialized");
    }

    tracing::debug!(log_format = ?config.log_format, "logging initialized");
    Ok(())
}
