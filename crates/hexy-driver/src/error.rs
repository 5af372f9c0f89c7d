//! 驱动层错误类型定义

use hexy_protocol::{ProtocolError, ServoId};
use hexy_serial::TransportError;
use thiserror::Error;

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 连接未打开时发送了电机命令（命令未发出）
    #[error("Must connect to a hexy before moving")]
    NotConnected,

    /// 端口发现失败且未启用 mock 回退
    #[error("Unable to find usable serial device ({target})")]
    NoDeviceFound { target: String },

    /// 传输层错误（设备拔出等），不会自动重试
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// 协议编码错误
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 机器人上没有该舵机
    #[error("Unknown servo: {0}")]
    UnknownServo(ServoId),

    /// 机器人配置无效
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// 读取配置文件失败
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 功能未实现（运动学占位）
    #[error("Not implemented: {0}")]
    Unsupported(&'static str),
}
