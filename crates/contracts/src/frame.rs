//! Frame - Ingestion 输出
//!
//! 已转换为 RGB 的相机帧。

use bytes::Bytes;

use crate::CameraPosition;

/// RGB 相机帧
///
/// 由 ingestion 回调从 BGRA 原始数据转换而来，之后只读。
#[derive(Debug, Clone)]
pub struct Frame {
    /// 来源相机
    pub position: CameraPosition,

    /// CARLA 帧序号
    pub frame_id: u64,

    /// CARLA 仿真时间戳 (seconds)
    pub timestamp: f64,

    /// 图像宽度
    pub width: u32,

    /// 图像高度
    pub height: u32,

    /// 交错 RGB 像素，长度 = width * height * 3
    pub data: Bytes,
}

impl Frame {
    /// 每像素字节数
    pub const CHANNELS: usize = 3;

    /// 期望的数据长度
    pub fn expected_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * Self::CHANNELS
    }

    /// 读取 (x, y) 处的像素
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * Self::CHANNELS;
        let px = self.data.get(offset..offset + Self::CHANNELS)?;
        Some([px[0], px[1], px[2]])
    }
}
