//! show-image 窗口
//!
//! 进程入口需要用 `#[show_image::main]` 包装，窗口由 show-image 的后台线程驱动，
//! 这里只持有 `WindowProxy` 和事件通道。

use std::sync::mpsc::{Receiver, TryRecvError};

use contracts::DisplayConfig;
use image::RgbImage;
use show_image::event::{VirtualKeyCode, WindowEvent};
use show_image::{create_window, ImageInfo, ImageView, WindowOptions, WindowProxy};
use tracing::{debug, info, warn};

use crate::display::DisplaySurface;
use crate::error::{DisplayError, Result};

const IMAGE_NAME: &str = "composite";

/// Desktop window backed by show-image
pub struct ShowImageWindow {
    title: String,
    quit_key: VirtualKeyCode,
    window: Option<WindowProxy>,
    events: Option<Receiver<WindowEvent>>,
}

impl ShowImageWindow {
    /// Open the window
    pub fn open(config: &DisplayConfig) -> Result<Self> {
        let quit_key = key_code(config.quit_key).ok_or_else(|| {
            DisplayError::window(format!("unsupported quit key {:?}", config.quit_key))
        })?;

        let window = create_window(&config.window_title, WindowOptions::default())
            .map_err(|e| DisplayError::window(format!("create window: {e}")))?;
        let events = window
            .event_channel()
            .map_err(|e| DisplayError::window(format!("event channel: {e}")))?;

        info!(title = %config.window_title, quit_key = %config.quit_key, "window opened");
        Ok(Self {
            title: config.window_title.clone(),
            quit_key,
            window: Some(window),
            events: Some(events),
        })
    }

    fn is_quit(&self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput(e) => {
                e.input.state.is_pressed() && e.input.key_code == Some(self.quit_key)
            }
            WindowEvent::CloseRequested(_) | WindowEvent::Destroyed(_) => true,
            _ => false,
        }
    }
}

impl DisplaySurface for ShowImageWindow {
    fn name(&self) -> &str {
        &self.title
    }

    fn show(&mut self, image: &RgbImage) -> Result<()> {
        let window = self
            .window
            .as_ref()
            .ok_or_else(|| DisplayError::window("window already closed"))?;

        let (width, height) = image.dimensions();
        let view = ImageView::new(ImageInfo::rgb8(width, height), image.as_raw());
        window
            .set_image(IMAGE_NAME, view)
            .map_err(|e| DisplayError::window(format!("set image: {e}")))
    }

    fn poll_quit(&mut self) -> Result<bool> {
        let Some(events) = &self.events else {
            return Ok(true);
        };
        loop {
            match events.try_recv() {
                Ok(event) => {
                    if self.is_quit(&event) {
                        debug!("quit event received");
                        return Ok(true);
                    }
                }
                Err(TryRecvError::Empty) => return Ok(false),
                Err(TryRecvError::Disconnected) => {
                    warn!("window event channel disconnected");
                    return Ok(true);
                }
            }
        }
    }

    fn close(&mut self) {
        if self.window.take().is_some() {
            self.events = None;
            info!(title = %self.title, "window released");
        }
    }
}

/// Map an ASCII letter to its key code
pub fn key_code(ch: char) -> Option<VirtualKeyCode> {
    use VirtualKeyCode::*;
    let code = match ch.to_ascii_lowercase() {
        'a' => A,
        'b' => B,
        'c' => C,
        'd' => D,
        'e' => E,
        'f' => F,
        'g' => G,
        'h' => H,
        'i' => I,
        'j' => J,
        'k' => K,
        'l' => L,
        'm' => M,
        'n' => N,
        'o' => O,
        'p' => P,
        'q' => Q,
        'r' => R,
        's' => S,
        't' => T,
        'u' => U,
        'v' => V,
        'w' => W,
        'x' => X,
        'y' => Y,
        'z' => Z,
        _ => return None,
    };
    Some(code)
}
