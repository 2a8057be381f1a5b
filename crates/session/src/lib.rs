//! # Session
//!
//! 驾驶会话：手柄 → 控制量 → 车辆，四路相机 → 合成图 → 显示。
//!
//! 状态机 RUNNING → EXITING → STOPPED，退出按键、退出键、外部中断、
//! 迭代上限或循环内错误都会经过同一次 teardown。

mod error;
mod report;
mod session;
mod startup;

pub use error::{Result, SessionError};
pub use report::SessionReport;
pub use session::{DriveSession, ExitReason, SessionConfig, SessionState};
pub use startup::{abort_startup, attach_ingestion};
