//! 主循环指标收集模块
//!
//! 记录合成帧显示/跳过、队列深度、控制量和循环耗时。
//! 每相机接收/丢弃/解析错误计数由 ingestion 记录。

use contracts::{CameraPosition, ControlCommand};
use metrics::{counter, gauge, histogram};

/// 记录一次成功显示的合成帧
pub fn record_composite_shown() {
    counter!("carla_drive_composites_shown_total").increment(1);
}

/// 记录一次因队列不全而跳过的显示
pub fn record_composite_skipped() {
    counter!("carla_drive_composites_skipped_total").increment(1);
}

/// 记录各相机队列深度 (rig 顺序)
pub fn record_queue_depths(depths: &[usize; 4]) {
    for (position, depth) in CameraPosition::ALL.iter().zip(depths) {
        gauge!("carla_drive_queue_depth", "camera" => position.as_str()).set(*depth as f64);
    }
}

/// 记录本次循环下发的控制量
pub fn record_control(command: &ControlCommand) {
    gauge!("carla_drive_control_throttle").set(f64::from(command.throttle));
    gauge!("carla_drive_control_steer").set(f64::from(command.steer));
    gauge!("carla_drive_control_brake").set(f64::from(command.brake));
    gauge!("carla_drive_control_hand_brake").set(if command.hand_brake { 1.0 } else { 0.0 });
}

/// 记录单次循环耗时
pub fn record_loop_latency_ms(latency_ms: f64) {
    histogram!("carla_drive_loop_latency_ms").record(latency_ms);
}

/// 记录会话退出原因
pub fn record_exit(reason: &'static str) {
    counter!("carla_drive_session_exits_total", "reason" => reason).increment(1);
}

/// 主循环指标聚合器
///
/// 在内存中聚合指标，便于会话结束时输出摘要。
#[derive(Debug, Clone, Default)]
pub struct LoopMetricsAggregator {
    /// 循环次数
    pub iterations: u64,

    /// 显示的合成帧数
    pub composites_shown: u64,

    /// 跳过的显示次数
    pub composites_skipped: u64,

    /// 循环耗时统计 (毫秒)
    pub latency_ms: RunningStats,
}

impl LoopMetricsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一次循环
    pub fn record_iteration(&mut self, latency_ms: f64, shown: bool) {
        self.iterations += 1;
        if shown {
            self.composites_shown += 1;
        } else {
            self.composites_skipped += 1;
        }
        self.latency_ms.push(latency_ms);
        record_loop_latency_ms(latency_ms);
    }

    /// 生成摘要
    pub fn summary(&self) -> LoopSummary {
        LoopSummary {
            iterations: self.iterations,
            composites_shown: self.composites_shown,
            composites_skipped: self.composites_skipped,
            show_rate: if self.iterations > 0 {
                self.composites_shown as f64 / self.iterations as f64 * 100.0
            } else {
                0.0
            },
            latency_ms: StatsSummary::from(&self.latency_ms),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 主循环指标摘要
#[derive(Debug, Clone, Default)]
pub struct LoopSummary {
    pub iterations: u64,
    pub composites_shown: u64,
    pub composites_skipped: u64,
    pub show_rate: f64,
    pub latency_ms: StatsSummary,
}

impl std::fmt::Display for LoopSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Drive Loop Summary ===")?;
        writeln!(f, "Iterations: {}", self.iterations)?;
        writeln!(
            f,
            "Composites shown: {} ({:.2}%)",
            self.composites_shown, self.show_rate
        )?;
        writeln!(f, "Composites skipped: {}", self.composites_skipped)?;
        writeln!(f, "Loop latency (ms): {}", self.latency_ms)?;
        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// 样本数量
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 均值
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// 标准差
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// 最小值
    pub fn min(&self) -> f64 {
        self.min
    }

    /// 最大值
    pub fn max(&self) -> f64 {
        self.max
    }
}
