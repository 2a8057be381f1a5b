//! Ingestion Pipeline main entry

use std::sync::Arc;

use contracts::{CameraPosition, CameraSource, Frame, ImageCallback, RawImage};
use ringbuf::traits::{Consumer, Observer};
use tracing::{debug, info, instrument, trace, warn};

use crate::convert::bgra_to_rgb;
use crate::error::{IngestionError, Result};
use crate::metrics::{IngestionMetrics, MetricsSnapshot};
use crate::queue::FrameQueue;

/// A complete set of frames, one per camera in rig order
pub type FrameSet = [Frame; 4];

/// Ingestion Pipeline
///
/// Owns one bounded queue per camera position. Each registered camera converts
/// its images to RGB on the engine thread and pushes them onto its own queue;
/// the render loop takes complete sets with [`IngestionPipeline::try_take_all`].
pub struct IngestionPipeline {
    /// Registered camera sources
    sources: Vec<Box<dyn CameraSource>>,

    /// Queues in rig order
    queues: [Arc<FrameQueue>; 4],

    /// Metrics in rig order
    metrics: [Arc<IngestionMetrics>; 4],
}

impl IngestionPipeline {
    /// Create new Ingestion Pipeline
    ///
    /// # Arguments
    /// * `queue_capacity` - Frames held per camera before the oldest is dropped
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            sources: Vec::with_capacity(CameraPosition::ALL.len()),
            queues: CameraPosition::ALL.map(|_| Arc::new(FrameQueue::new(queue_capacity))),
            metrics: CameraPosition::ALL.map(|p| Arc::new(IngestionMetrics::new(p))),
        }
    }

    /// Register camera source
    ///
    /// The source's own position selects its queue.
    #[instrument(
        name = "ingestion_register_camera",
        skip(self, source),
        fields(camera = %source.position())
    )]
    pub fn register(&mut self, source: Box<dyn CameraSource>) -> Result<()> {
        let camera = source.position();
        if self.sources.iter().any(|s| s.position() == camera) {
            return Err(IngestionError::DuplicateCamera { camera });
        }
        debug!("registered camera source");
        self.sources.push(source);
        Ok(())
    }

    /// Register every source in `sources`
    pub fn register_all(
        &mut self,
        sources: impl IntoIterator<Item = Box<dyn CameraSource>>,
    ) -> Result<()> {
        sources.into_iter().try_for_each(|s| self.register(s))
    }

    /// Check that all four positions have a source
    pub fn ensure_complete(&self) -> Result<()> {
        for camera in CameraPosition::ALL {
            if !self.sources.iter().any(|s| s.position() == camera) {
                return Err(IngestionError::MissingCamera { camera });
            }
        }
        Ok(())
    }

    /// Start all registered cameras
    #[instrument(name = "ingestion_start_all", skip(self))]
    pub fn start_all(&self) {
        info!(count = self.sources.len(), "starting all cameras");
        for source in &self.sources {
            if !source.is_listening() {
                let camera = source.position();
                debug!(camera = %camera, "starting camera");
                source.listen(self.make_callback(camera));
            }
        }
    }

    /// Stop all cameras and discard queued frames
    ///
    /// No callback fires after this returns.
    #[instrument(name = "ingestion_stop_all", skip(self))]
    pub fn stop_all(&self) {
        info!(count = self.sources.len(), "stopping all cameras");
        for source in &self.sources {
            if source.is_listening() {
                debug!(camera = %source.position(), "stopping camera");
                source.stop();
            }
        }
        let discarded: usize = self.queues.iter().map(|q| q.clear()).sum();
        if discarded > 0 {
            debug!(discarded, "discarded queued frames");
        }
    }

    fn make_callback(&self, camera: CameraPosition) -> ImageCallback {
        let queue = self.queues[camera.index()].clone();
        let metrics = self.metrics[camera.index()].clone();

        Arc::new(move |raw: RawImage<'_>| {
            metrics.record_received();
            match bgra_to_rgb(camera, raw) {
                Ok(frame) => {
                    trace!(camera = %camera, frame_id = frame.frame_id, "frame queued");
                    if queue.push(frame) {
                        metrics.record_dropped();
                    }
                }
                Err(e) => {
                    metrics.record_parse_error();
                    warn!(camera = %camera, error = %e, "dropping unparseable image");
                }
            }
        })
    }

    /// Take one frame from every queue, or nothing
    ///
    /// Returns `None` without touching any queue unless all four are non-empty.
    /// The four queues are locked in rig order for the check and the pops, so a
    /// producer cannot interleave between them.
    pub fn try_take_all(&self) -> Option<FrameSet> {
        let mut guards: Vec<_> = self.queues.iter().map(|q| q.lock()).collect();
        if guards.iter().any(|rb| rb.is_empty()) {
            return None;
        }
        let frames: Vec<Frame> = guards.iter_mut().filter_map(|rb| rb.try_pop()).collect();
        frames.try_into().ok()
    }

    /// Queue depths in rig order
    pub fn depths(&self) -> [usize; 4] {
        self.queues.each_ref().map(|q| q.len())
    }

    /// Queue of one camera
    pub fn queue(&self, camera: CameraPosition) -> &Arc<FrameQueue> {
        &self.queues[camera.index()]
    }

    /// Metrics snapshots in rig order
    pub fn metrics(&self) -> Vec<MetricsSnapshot> {
        self.metrics.iter().map(|m| m.snapshot()).collect()
    }

    /// Get registered camera count
    pub fn camera_count(&self) -> usize {
        self.sources.len()
    }

    /// Check if the camera at `camera` is listening
    pub fn is_camera_listening(&self, camera: CameraPosition) -> bool {
        self.sources
            .iter()
            .find(|s| s.position() == camera)
            .map(|s| s.is_listening())
            .unwrap_or(false)
    }
}

impl Drop for IngestionPipeline {
    fn drop(&mut self) {
        self.stop_all();
    }
}
