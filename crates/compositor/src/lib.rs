//! # Compositor
//!
//! 四路相机画面合成与显示。
//!
//! 职责：
//! - 按 front / rear / left / right 顺序水平拼接帧
//! - 叠加 Steer / Throttle / Brake 读数
//! - 通过 `DisplaySurface` 展示并检测退出键

mod compose;
mod display;
mod error;
mod overlay;
#[cfg(feature = "window")]
mod window;

pub use compose::{compose, to_image};
pub use display::{DisplaySurface, HeadlessConfig, HeadlessDisplay};
pub use error::{DisplayError, Result};
pub use overlay::{draw_text, overlay_readouts, readout_lines, BASELINES, TEXT_COLOUR, TEXT_X};
#[cfg(feature = "window")]
pub use window::{key_code, ShowImageWindow};

pub use image::RgbImage;

use contracts::{ControlCommand, DisplayConfig, Frame};

/// Build the composite for one frame set, optionally with readouts
pub fn render(
    frames: &[Frame],
    command: &ControlCommand,
    config: &DisplayConfig,
) -> Result<RgbImage> {
    let mut canvas = compose(frames)?;
    if config.show_readouts {
        overlay_readouts(&mut canvas, command, config.text_scale);
    }
    Ok(canvas)
}
