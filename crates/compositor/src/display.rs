//! 显示面抽象
//!
//! `DisplaySurface` 是主循环看到的唯一显示接口：展示合成图、查询退出键、关闭。
//! `HeadlessDisplay` 用于测试和无窗口环境，可选地将每帧写成 PNG。

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use image::RgbImage;
use tracing::{debug, info, instrument};

use crate::error::Result;

/// Display surface
pub trait DisplaySurface {
    /// Surface name for logs
    fn name(&self) -> &str;

    /// Show a composite image
    fn show(&mut self, image: &RgbImage) -> Result<()>;

    /// Whether the user asked to quit since the last poll
    fn poll_quit(&mut self) -> Result<bool>;

    /// Close the surface. Calling it more than once is harmless.
    fn close(&mut self);
}

impl<D: DisplaySurface + ?Sized> DisplaySurface for Box<D> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn show(&mut self, image: &RgbImage) -> Result<()> {
        (**self).show(image)
    }

    fn poll_quit(&mut self) -> Result<bool> {
        (**self).poll_quit()
    }

    fn close(&mut self) {
        (**self).close()
    }
}

/// Configuration for HeadlessDisplay
#[derive(Debug, Clone, Default)]
pub struct HeadlessConfig {
    /// Write every shown composite as `<n>.png` under this directory
    pub output_dir: Option<PathBuf>,

    /// Report quit after this many composites were shown
    pub quit_after: Option<u64>,
}

/// Display without a window
pub struct HeadlessDisplay {
    config: HeadlessConfig,
    shown: u64,
    last: Option<RgbImage>,
    quit: Arc<AtomicBool>,
    closes: Arc<AtomicUsize>,
    closed: bool,
}

impl HeadlessDisplay {
    /// Create a new headless display, creating `output_dir` if set
    pub fn new(config: HeadlessConfig) -> Result<Self> {
        if let Some(dir) = &config.output_dir {
            fs::create_dir_all(dir)?;
        }
        Ok(Self {
            config,
            shown: 0,
            last: None,
            quit: Arc::new(AtomicBool::new(false)),
            closes: Arc::new(AtomicUsize::new(0)),
            closed: false,
        })
    }

    /// Composites shown so far
    pub fn shown(&self) -> u64 {
        self.shown
    }

    /// Most recent composite
    pub fn last_image(&self) -> Option<&RgbImage> {
        self.last.as_ref()
    }

    /// Setting the flag makes the next `poll_quit` report a quit key
    pub fn quit_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.quit)
    }

    /// Number of effective `close` calls, shared across clones of the handle
    pub fn close_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.closes)
    }
}

impl DisplaySurface for HeadlessDisplay {
    fn name(&self) -> &str {
        "headless"
    }

    #[instrument(name = "headless_show", skip(self, image), fields(n = self.shown))]
    fn show(&mut self, image: &RgbImage) -> Result<()> {
        if let Some(dir) = &self.config.output_dir {
            let path = dir.join(format!("{:06}.png", self.shown));
            image.save(&path)?;
            debug!(path = %path.display(), "composite written");
        }
        self.shown += 1;
        self.last = Some(image.clone());
        Ok(())
    }

    fn poll_quit(&mut self) -> Result<bool> {
        if self.quit.load(Ordering::Acquire) {
            return Ok(true);
        }
        Ok(self.config.quit_after.is_some_and(|n| self.shown >= n))
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.closes.fetch_add(1, Ordering::SeqCst);
        info!(shown = self.shown, "headless display closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn image(rgb: [u8; 3]) -> RgbImage {
        RgbImage::from_pixel(8, 4, Rgb(rgb))
    }

    #[test]
    fn test_show_keeps_last_image() {
        let mut display = HeadlessDisplay::new(HeadlessConfig::default()).unwrap();
        display.show(&image([1, 2, 3])).unwrap();
        display.show(&image([9, 9, 9])).unwrap();

        assert_eq!(display.shown(), 2);
        assert_eq!(*display.last_image().unwrap().get_pixel(0, 0), Rgb([9, 9, 9]));
    }

    #[test]
    fn test_writes_png_per_composite() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("frames");
        let mut display = HeadlessDisplay::new(HeadlessConfig {
            output_dir: Some(output.clone()),
            quit_after: None,
        })
        .unwrap();

        display.show(&image([255, 0, 0])).unwrap();
        display.show(&image([0, 255, 0])).unwrap();

        let saved = image::open(output.join("000001.png")).unwrap().to_rgb8();
        assert_eq!(saved.dimensions(), (8, 4));
        assert_eq!(*saved.get_pixel(3, 3), Rgb([0, 255, 0]));
        assert!(output.join("000000.png").exists());
    }

    #[test]
    fn test_quit_after_count() {
        let mut display = HeadlessDisplay::new(HeadlessConfig {
            output_dir: None,
            quit_after: Some(2),
        })
        .unwrap();

        display.show(&image([0, 0, 0])).unwrap();
        assert!(!display.poll_quit().unwrap());
        display.show(&image([0, 0, 0])).unwrap();
        assert!(display.poll_quit().unwrap());
    }

    #[test]
    fn test_quit_handle() {
        let mut display = HeadlessDisplay::new(HeadlessConfig::default()).unwrap();
        let quit = display.quit_handle();
        assert!(!display.poll_quit().unwrap());
        quit.store(true, Ordering::Release);
        assert!(display.poll_quit().unwrap());
    }

    #[test]
    fn test_close_counted_once() {
        let mut display = HeadlessDisplay::new(HeadlessConfig::default()).unwrap();
        let closes = display.close_counter();
        display.close();
        display.close();
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }
}
