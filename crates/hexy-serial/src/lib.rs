//! # Hexy Serial Transport Layer
//!
//! 串口硬件抽象层，提供统一的传输接口：
//!
//! - [`SerialPortTransport`]: 真实串口设备（`serialport` crate）
//! - [`MockTransport`]: 无硬件的惰性传输，接受写入并记录
//! - [`discovery`]: 端口枚举、匹配与解析（含 mock 回退）
//!
//! 本层只负责“把字节送出去”，不关心命令语义；是否允许发送由驱动层的
//! 连接状态决定。

use thiserror::Error;

pub mod discovery;
pub mod mock;
pub mod serial;

pub use discovery::{
    PortAttribute, PortDiscovery, PortEnumerator, PortInfo, PortMatcher, SystemPorts,
    TransportResolver,
};
pub use mock::{MockLog, MockResolver, MockTransport};
pub use serial::SerialPortTransport;

/// 传输层统一错误类型
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
    #[error("Transport not open: {0}")]
    NotOpen(String),
    #[error("Port enumeration failed: {0}")]
    Enumeration(String),
}

/// 舵机控制板传输抽象
///
/// 生命周期：`open` → 多次 `write_line` → `close`，可重复打开。
/// 实现者不得在未打开时静默丢弃写入。
pub trait Transport: Send {
    /// 打开传输（已打开时为空操作）
    fn open(&mut self) -> Result<(), TransportError>;

    /// 关闭传输（已关闭时为空操作）
    fn close(&mut self);

    fn is_open(&self) -> bool;

    /// 写入一行完整命令（含换行符），阻塞直到写完
    fn write_line(&mut self, line: &[u8]) -> Result<(), TransportError>;

    /// 是否需要真实的时间间隔
    ///
    /// 返回 `false` 的传输（如 mock）不会驱动真实电机，调用方应跳过节拍延时。
    fn supports_real_timing(&self) -> bool {
        true
    }

    /// 人类可读的描述（日志用）
    fn describe(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::NotOpen("mock".to_string());
        assert_eq!(format!("{}", err), "Transport not open: mock");

        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "unplugged");
        let err: TransportError = io.into();
        assert!(format!("{}", err).contains("unplugged"));
    }
}
