//! 多相机画面拼接

use contracts::Frame;
use image::{imageops, RgbImage};

use crate::error::{DisplayError, Result};

/// 按给定顺序水平拼接
///
/// 输出宽度为各帧宽度之和，高度为公共高度。
pub fn compose(frames: &[Frame]) -> Result<RgbImage> {
    let first = frames.first().ok_or(DisplayError::EmptyFrameSet)?;
    let height = first.height;

    let mut width = 0;
    for frame in frames {
        if frame.height != height {
            return Err(DisplayError::HeightMismatch {
                camera: frame.position,
                expected: height,
                actual: frame.height,
            });
        }
        width += frame.width;
    }

    let mut canvas = RgbImage::new(width, height);
    let mut x_offset = 0i64;
    for frame in frames {
        let tile = to_image(frame)?;
        imageops::replace(&mut canvas, &tile, x_offset, 0);
        x_offset += i64::from(frame.width);
    }
    Ok(canvas)
}

/// 将帧数据包装为 `RgbImage`
pub fn to_image(frame: &Frame) -> Result<RgbImage> {
    RgbImage::from_raw(frame.width, frame.height, frame.data.to_vec()).ok_or_else(|| {
        DisplayError::BadFrame {
            camera: frame.position,
            message: format!(
                "expected {} bytes for {}x{}, got {}",
                Frame::expected_len(frame.width, frame.height),
                frame.width,
                frame.height,
                frame.data.len()
            ),
        }
    })
}
