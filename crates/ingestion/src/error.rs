//! Ingestion 错误类型

use contracts::{CameraPosition, ContractError};
use thiserror::Error;

/// Ingestion 错误
#[derive(Debug, Error)]
pub enum IngestionError {
    /// 相机图像解析失败
    #[error("failed to parse {camera} camera image: {message}")]
    ParseFailed {
        /// 相机位置
        camera: CameraPosition,
        /// 错误消息
        message: String,
    },

    /// 同一位置重复注册
    #[error("{camera} camera is already registered")]
    DuplicateCamera { camera: CameraPosition },

    /// 相机组不完整
    #[error("{camera} camera is not registered")]
    MissingCamera { camera: CameraPosition },
}

impl From<IngestionError> for ContractError {
    fn from(e: IngestionError) -> Self {
        match e {
            IngestionError::ParseFailed { camera, message } => {
                ContractError::payload_parse(camera.as_str(), message)
            }
            other => ContractError::Other(other.to_string()),
        }
    }
}

/// Ingestion Result 类型别名
pub type Result<T> = std::result::Result<T, IngestionError>;
