//! Mock camera implementation
//!
//! Implements `CameraSource`, generates solid-colour BGRA images on a background
//! thread. Used for testing and for running without a CARLA server.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use contracts::{CameraPosition, CameraSource, ImageCallback, RawImage};
use tracing::{debug, trace};

/// Mock camera configuration
#[derive(Debug, Clone)]
pub struct MockCameraConfig {
    /// Send frequency (Hz)
    pub frequency_hz: f64,
    pub image_width: u32,
    pub image_height: u32,
    /// Accept `listen` but never deliver an image
    pub silent: bool,
}

impl Default for MockCameraConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 20.0,
            image_width: 800,
            image_height: 600,
            silent: false,
        }
    }
}

/// Mock camera
///
/// Each position paints a distinct colour so composites can be checked by pixel.
pub struct MockCamera {
    position: CameraPosition,
    config: MockCameraConfig,
    listening: Arc<AtomicBool>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl MockCamera {
    pub fn new(position: CameraPosition, config: MockCameraConfig) -> Self {
        Self {
            position,
            config,
            listening: Arc::new(AtomicBool::new(false)),
            worker: Mutex::new(None),
        }
    }

    /// Create Mock camera with default configuration
    pub fn with_defaults(position: CameraPosition) -> Self {
        Self::new(position, MockCameraConfig::default())
    }

    /// RGB colour painted by a camera at `position`
    pub fn colour(position: CameraPosition) -> [u8; 3] {
        match position {
            CameraPosition::Front => [255, 0, 0],
            CameraPosition::Rear => [0, 255, 0],
            CameraPosition::Left => [0, 0, 255],
            CameraPosition::Right => [255, 255, 255],
        }
    }

    /// Interleaved BGRA buffer of one solid-colour image
    fn generate_bgra(position: CameraPosition, width: u32, height: u32) -> Vec<u8> {
        let [r, g, b] = Self::colour(position);
        [b, g, r, 255].repeat(width as usize * height as usize)
    }
}

impl CameraSource for MockCamera {
    fn position(&self) -> CameraPosition {
        self.position
    }

    fn listen(&self, callback: ImageCallback) {
        // Idempotent: if already listening, don't start again
        if self.listening.swap(true, Ordering::SeqCst) {
            return;
        }
        if self.config.silent {
            debug!(camera = %self.position, "silent mock camera listening");
            return;
        }

        let position = self.position;
        let config = self.config.clone();
        let listening = self.listening.clone();
        let interval = Duration::from_secs_f64(1.0 / config.frequency_hz);

        let handle = thread::spawn(move || {
            let mut frame_id: u64 = 0;
            let start_time = Instant::now();
            let bgra = Self::generate_bgra(position, config.image_width, config.image_height);

            debug!(
                camera = %position,
                frequency_hz = config.frequency_hz,
                "mock camera started"
            );

            while listening.load(Ordering::Relaxed) {
                frame_id += 1;
                let timestamp = start_time.elapsed().as_secs_f64();

                callback(RawImage {
                    frame_id,
                    timestamp,
                    width: config.image_width,
                    height: config.image_height,
                    bgra: &bgra,
                });

                trace!(camera = %position, frame_id, timestamp, "mock image sent");

                thread::sleep(interval);
            }

            debug!(camera = %position, "mock camera stopped");
        });

        *self.worker.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
    }

    fn stop(&self) {
        self.listening.store(false, Ordering::SeqCst);
        let handle = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            // The worker exits after at most one interval
            let _ = handle.join();
        }
    }

    fn is_listening(&self) -> bool {
        self.listening.load(Ordering::Relaxed)
    }
}

impl Drop for MockCamera {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;

    fn fast_config() -> MockCameraConfig {
        MockCameraConfig {
            frequency_hz: 100.0,
            image_width: 4,
            image_height: 2,
            silent: false,
        }
    }

    #[test]
    fn test_mock_camera_sends_bgra() {
        let camera = MockCamera::new(CameraPosition::Front, fast_config());

        let count = Arc::new(AtomicU64::new(0));
        let count_clone = count.clone();

        camera.listen(Arc::new(move |image| {
            assert_eq!(image.bgra.len(), 4 * 2 * 4);
            // front paints red: B=0, G=0, R=255
            assert_eq!(&image.bgra[..4], &[0, 0, 255, 255]);
            count_clone.fetch_add(1, Ordering::Relaxed);
        }));

        thread::sleep(Duration::from_millis(50));
        camera.stop();

        assert!(count.load(Ordering::Relaxed) > 0);
        assert!(!camera.is_listening());
    }

    #[test]
    fn test_no_callback_after_stop() {
        let camera = MockCamera::new(CameraPosition::Rear, fast_config());
        let count = Arc::new(AtomicU64::new(0));
        let count_clone = count.clone();

        camera.listen(Arc::new(move |_| {
            count_clone.fetch_add(1, Ordering::Relaxed);
        }));
        thread::sleep(Duration::from_millis(30));
        camera.stop();

        let after_stop = count.load(Ordering::Relaxed);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(count.load(Ordering::Relaxed), after_stop);
    }

    #[test]
    fn test_silent_camera_never_delivers() {
        let camera = MockCamera::new(
            CameraPosition::Right,
            MockCameraConfig {
                silent: true,
                ..fast_config()
            },
        );
        let count = Arc::new(AtomicU64::new(0));
        let count_clone = count.clone();

        camera.listen(Arc::new(move |_| {
            count_clone.fetch_add(1, Ordering::Relaxed);
        }));
        assert!(camera.is_listening());
        thread::sleep(Duration::from_millis(30));
        camera.stop();

        assert_eq!(count.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_mock_camera_idempotent_listen() {
        let camera = MockCamera::with_defaults(CameraPosition::Left);

        let count = Arc::new(AtomicU64::new(0));
        let count1 = count.clone();
        let count2 = count.clone();

        // First call
        camera.listen(Arc::new(move |_| {
            count1.fetch_add(1, Ordering::Relaxed);
        }));

        // Second call should be ignored
        camera.listen(Arc::new(move |_| {
            count2.fetch_add(100, Ordering::Relaxed);
        }));

        thread::sleep(Duration::from_millis(100));
        camera.stop();

        // Should only have count from first callback
        let final_count = count.load(Ordering::Relaxed);
        assert!(final_count > 0);
        assert!(final_count < 50); // 100ms max ~3 images (default 20Hz)
    }
}
