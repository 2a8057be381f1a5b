//! Per-camera ingestion metrics

use std::sync::atomic::{AtomicU64, Ordering};

use contracts::CameraPosition;
use metrics::counter;

/// Ingestion metrics of one camera
///
/// Updated from the camera's callback thread, read from the render loop.
#[derive(Debug)]
pub struct IngestionMetrics {
    camera: CameraPosition,

    /// Total images received
    pub frames_received: AtomicU64,

    /// Frames evicted from a full queue
    pub frames_dropped: AtomicU64,

    /// Parse error count
    pub parse_errors: AtomicU64,
}

impl IngestionMetrics {
    /// Create new metrics instance
    pub fn new(camera: CameraPosition) -> Self {
        Self {
            camera,
            frames_received: AtomicU64::new(0),
            frames_dropped: AtomicU64::new(0),
            parse_errors: AtomicU64::new(0),
        }
    }

    /// Record image received
    pub fn record_received(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
        counter!("carla_drive_frames_received_total", "camera" => self.camera.as_str())
            .increment(1);
    }

    /// Record frame dropped
    pub fn record_dropped(&self) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
        counter!("carla_drive_frames_dropped_total", "camera" => self.camera.as_str())
            .increment(1);
    }

    /// Record parse error
    pub fn record_parse_error(&self) {
        self.parse_errors.fetch_add(1, Ordering::Relaxed);
        counter!("carla_drive_parse_errors_total", "camera" => self.camera.as_str())
            .increment(1);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            camera: self.camera,
            frames_received: self.frames_received.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            parse_errors: self.parse_errors.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub camera: CameraPosition,

    /// Total images received
    pub frames_received: u64,

    /// Frames evicted from a full queue
    pub frames_dropped: u64,

    /// Parse error count
    pub parse_errors: u64,
}
