//! Session statistics.

use std::fmt;
use std::time::Duration;

use ingestion::MetricsSnapshot;
use observability::LoopSummary;

use crate::session::ExitReason;

/// Statistics from one drive session
#[derive(Debug, Clone)]
pub struct SessionReport {
    /// What ended the loop
    pub exit_reason: ExitReason,

    /// Total wall time from start to teardown
    pub duration: Duration,

    /// Loop counters and latency
    pub loop_summary: LoopSummary,

    /// Per-camera ingestion counters in rig order
    pub cameras: Vec<MetricsSnapshot>,

    /// Last control command applied to the vehicle
    pub last_command: contracts::ControlCommand,
}

impl SessionReport {
    /// Loop iterations run
    pub fn iterations(&self) -> u64 {
        self.loop_summary.iterations
    }

    /// Composites displayed
    pub fn composites_shown(&self) -> u64 {
        self.loop_summary.composites_shown
    }

    /// Iterations that skipped display because a queue was empty
    pub fn composites_skipped(&self) -> u64 {
        self.loop_summary.composites_skipped
    }

    /// Frames received across all cameras
    pub fn frames_received(&self) -> u64 {
        self.cameras.iter().map(|c| c.frames_received).sum()
    }

    /// Frames evicted from full queues across all cameras
    pub fn frames_dropped(&self) -> u64 {
        self.cameras.iter().map(|c| c.frames_dropped).sum()
    }

    /// Displayed composites per second
    pub fn fps(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.composites_shown() as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }
}

impl fmt::Display for SessionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Session ended: {}", self.exit_reason)?;
        writeln!(f, "  Duration: {:.2}s", self.duration.as_secs_f64())?;
        writeln!(f, "  FPS: {:.2}", self.fps())?;
        writeln!(f, "  Last control: {}", self.last_command)?;
        write!(f, "{}", self.loop_summary)?;
        writeln!(f, "Cameras:")?;
        for camera in &self.cameras {
            writeln!(
                f,
                "  {:<5} received={} dropped={} parse_errors={}",
                camera.camera.as_str(),
                camera.frames_received,
                camera.frames_dropped,
                camera.parse_errors
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::CameraPosition;

    fn report() -> SessionReport {
        SessionReport {
            exit_reason: ExitReason::QuitKey,
            duration: Duration::from_secs(2),
            loop_summary: LoopSummary {
                iterations: 10,
                composites_shown: 4,
                composites_skipped: 6,
                show_rate: 40.0,
                ..Default::default()
            },
            cameras: CameraPosition::ALL
                .iter()
                .map(|&camera| MetricsSnapshot {
                    camera,
                    frames_received: 5,
                    frames_dropped: 1,
                    parse_errors: 0,
                })
                .collect(),
            last_command: Default::default(),
        }
    }

    #[test]
    fn test_totals_and_fps() {
        let report = report();
        assert_eq!(report.frames_received(), 20);
        assert_eq!(report.frames_dropped(), 4);
        assert!((report.fps() - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_display_lists_cameras() {
        let output = report().to_string();
        assert!(output.contains("quit key"));
        assert!(output.contains("front"));
        assert!(output.contains("right"));
    }
}
