//! # Hexy Tools - 共享数据结构
//!
//! **依赖原则**: 只依赖 `hexy-protocol`，避免依赖 `hexy-driver`
//!
//! ## 包含模块
//!
//! - `offsets` - 标定偏移文件（`{"舵机编号": 偏移}` JSON）
//! - `keys` - 按键字节流解码（方向键、回车、Tab、Ctrl-C）

use thiserror::Error;

pub mod keys;
pub mod offsets;

pub use keys::{Key, KeyDecoder};
pub use offsets::OffsetTable;

/// 工具层错误
#[derive(Error, Debug)]
pub enum ToolsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid offset file: {0}")]
    Json(#[from] serde_json::Error),
}
