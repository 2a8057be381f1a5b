//! # Ingestion Pipeline
//!
//! Camera image ingestion module.
//!
//! Responsibilities:
//! - Register camera sources (supports Mock and Real)
//! - Convert engine BGRA images into owned RGB `Frame`s
//! - One bounded drop-oldest queue per camera
//! - Hand complete four-camera sets to the render loop
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::IngestionPipeline;
//!
//! let mut pipeline = IngestionPipeline::new(4);
//! pipeline.register_all(factory.camera_sources(&actors)?)?;
//! pipeline.start_all();
//!
//! if let Some([front, rear, left, right]) = pipeline.try_take_all() {
//!     // compose and display
//! }
//! pipeline.stop_all();
//! ```

mod convert;
mod error;
mod metrics;
mod pipeline;
mod queue;

// Re-exports
pub use convert::{bgra_to_rgb, BGRA_CHANNELS};
pub use error::{IngestionError, Result};
pub use metrics::{IngestionMetrics, MetricsSnapshot};
pub use pipeline::{FrameSet, IngestionPipeline};
pub use queue::FrameQueue;
