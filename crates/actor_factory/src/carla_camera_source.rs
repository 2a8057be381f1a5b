//! CARLA camera wrapper
//!
//! Wraps a CARLA native RGB camera `Sensor` as a type implementing `CameraSource`.
//! Only compiled when `real-carla` feature is enabled.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use carla::client::Sensor;
use carla::sensor::data::Image;
use carla::sensor::SensorDataBase;
use contracts::{CameraPosition, CameraSource, ImageCallback, RawImage};
use tracing::{debug, trace, warn};

/// CARLA camera wrapper
///
/// The engine calls back on its own thread; the BGRA buffer is borrowed from the
/// engine's image for the duration of the callback only.
pub struct CarlaCameraSource {
    position: CameraPosition,
    sensor: Sensor,
    listening: Arc<AtomicBool>,
}

impl CarlaCameraSource {
    pub fn new(position: CameraPosition, sensor: Sensor) -> Self {
        Self {
            position,
            sensor,
            listening: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl CameraSource for CarlaCameraSource {
    fn position(&self) -> CameraPosition {
        self.position
    }

    fn listen(&self, callback: ImageCallback) {
        // Idempotent: if already listening, don't register again
        if self.listening.swap(true, Ordering::SeqCst) {
            warn!(camera = %self.position, "camera already listening");
            return;
        }

        let position = self.position;
        let listening = self.listening.clone();

        debug!(camera = %position, "starting CARLA camera");

        self.sensor.listen(move |sensor_data| {
            if !listening.load(Ordering::Relaxed) {
                return;
            }

            let frame_id = sensor_data.frame() as u64;
            let timestamp = sensor_data.timestamp();
            match Image::try_from(sensor_data) {
                Ok(image) => {
                    trace!(camera = %position, frame_id, "CARLA image received");
                    callback(RawImage {
                        frame_id,
                        timestamp,
                        width: image.width() as u32,
                        height: image.height() as u32,
                        bgra: image.as_raw_bytes(),
                    });
                }
                Err(_) => {
                    trace!(camera = %position, frame_id, "sensor data is not an image");
                }
            }
        });
    }

    fn stop(&self) {
        if self.listening.swap(false, Ordering::SeqCst) {
            debug!(camera = %self.position, "stopping CARLA camera");
            self.sensor.stop();
        }
    }

    fn is_listening(&self) -> bool {
        self.listening.load(Ordering::Relaxed)
    }
}
