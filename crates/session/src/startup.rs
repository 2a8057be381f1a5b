//! Startup helpers shared by the binary and the end-to-end tests

use actor_factory::{ActorFactory, SimClient};
use contracts::SessionActors;
use ingestion::IngestionPipeline;
use tracing::{info, warn};

use crate::error::Result;

/// Register the four camera sources of `actors` with a new ingestion pipeline
///
/// Cameras are not started; [`crate::DriveSession::run`] starts them.
pub fn attach_ingestion<C: SimClient>(
    factory: &ActorFactory<C>,
    actors: &SessionActors,
    queue_capacity: usize,
) -> Result<IngestionPipeline> {
    let mut pipeline = IngestionPipeline::new(queue_capacity);
    pipeline.register_all(factory.camera_sources(actors)?)?;
    pipeline.ensure_complete()?;
    info!(
        cameras = pipeline.camera_count(),
        queue_capacity, "ingestion pipeline configured"
    );
    Ok(pipeline)
}

/// Destroy actors when startup fails after the bootstrap
pub async fn abort_startup<C: SimClient>(factory: &ActorFactory<C>, actors: &SessionActors) {
    warn!("startup failed, destroying spawned actors");
    if let Err(e) = factory.teardown(actors).await {
        warn!(error = %e, "error during actor teardown");
    }
}
