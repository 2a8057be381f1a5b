//! BGRA → RGB 转换

use bytes::Bytes;
use contracts::{CameraPosition, Frame, RawImage};

use crate::error::{IngestionError, Result};

/// 原始数据每像素字节数
pub const BGRA_CHANNELS: usize = 4;

/// 将引擎的 BGRA 图像转换为 RGB 帧
///
/// 去掉 alpha 并反转通道顺序，结果拷贝到新的缓冲区，
/// 因此调用返回后原始数据可以被引擎回收。
///
/// 长度与 `width * height * 4` 不一致时返回错误。
pub fn bgra_to_rgb(position: CameraPosition, raw: RawImage<'_>) -> Result<Frame> {
    let pixels = raw.width as usize * raw.height as usize;
    if raw.bgra.len() != pixels * BGRA_CHANNELS {
        return Err(IngestionError::ParseFailed {
            camera: position,
            message: format!(
                "expected {} bytes for {}x{} BGRA, got {}",
                pixels * BGRA_CHANNELS,
                raw.width,
                raw.height,
                raw.bgra.len()
            ),
        });
    }

    let bgra: &[[u8; BGRA_CHANNELS]] =
        bytemuck::try_cast_slice(raw.bgra).map_err(|e| IngestionError::ParseFailed {
            camera: position,
            message: e.to_string(),
        })?;

    let mut rgb = Vec::with_capacity(Frame::expected_len(raw.width, raw.height));
    for &[b, g, r, _a] in bgra {
        rgb.extend_from_slice(&[r, g, b]);
    }

    Ok(Frame {
        position,
        frame_id: raw.frame_id,
        timestamp: raw.timestamp,
        width: raw.width,
        height: raw.height,
        data: Bytes::from(rgb),
    })
}
