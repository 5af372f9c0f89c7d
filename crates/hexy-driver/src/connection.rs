//! 连接生命周期
//!
//! ```text
//! Unresolved ──connect()──▶ (Resolving) ──▶ Open ⇄ Closed
//!     ▲                          │           disconnect()/connect()
//!     │                          └─ 无设备且无 mock 回退 → NoDeviceFound
//!     └──────────── reset() ─────────────────────┘
//! ```
//!
//! 所有电机命令都经由 [`Connection::send`]，它是唯一的连接检查点：
//! 未打开时返回 [`DriverError::NotConnected`]，不会写出任何字节。

use std::time::Duration;

use hexy_serial::{Transport, TransportResolver};
use tracing::{debug, info, trace};

use crate::DriverError;

/// 连接状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// 尚未解析出传输（或已被 reset 丢弃）
    Unresolved,
    /// 已解析但未打开
    Closed,
    /// 可以发送命令
    Open,
}

/// 与舵机控制板的连接
///
/// 由 [`Hexy`](crate::Hexy) 独占持有。
pub struct Connection {
    resolver: Box<dyn TransportResolver>,
    transport: Option<Box<dyn Transport>>,
}

impl Connection {
    pub fn new(resolver: Box<dyn TransportResolver>) -> Self {
        Self {
            resolver,
            transport: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        match &self.transport {
            None => ConnectionState::Unresolved,
            Some(t) if t.is_open() => ConnectionState::Open,
            Some(_) => ConnectionState::Closed,
        }
    }

    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// 打开连接（幂等）
    ///
    /// 已解析的传输会被直接重新打开，不会重新做端口发现。
    pub fn connect(&mut self) -> Result<(), DriverError> {
        if self.is_open() {
            return Ok(());
        }

        let transport = match self.transport.take() {
            Some(transport) => transport,
            None => {
                let resolved = self.resolver.resolve()?.ok_or_else(|| {
                    DriverError::NoDeviceFound {
                        target: self.resolver.target(),
                    }
                })?;
                info!("Resolved transport: {}", resolved.describe());
                resolved
            },
        };

        let transport = self.transport.insert(transport);
        transport.open()?;
        info!("Connected to {}", transport.describe());
        Ok(())
    }

    /// 关闭连接（幂等），保留已解析的传输
    pub fn disconnect(&mut self) {
        if let Some(transport) = &mut self.transport {
            if transport.is_open() {
                transport.close();
                info!("Disconnected from {}", transport.describe());
            }
        }
    }

    /// 先断开再连接，复用已解析的传输
    pub fn reconnect(&mut self) -> Result<(), DriverError> {
        self.disconnect();
        self.connect()
    }

    /// 断开、丢弃已解析的传输并重新发现
    pub fn reset(&mut self) -> Result<(), DriverError> {
        self.disconnect();
        self.transport = None;
        self.connect()
    }

    /// 发送一行命令
    pub fn send(&mut self, line: &[u8]) -> Result<(), DriverError> {
        match &mut self.transport {
            Some(transport) if transport.is_open() => {
                debug!("-> {:?}", String::from_utf8_lossy(line));
                transport.write_line(line)?;
                Ok(())
            },
            _ => Err(DriverError::NotConnected),
        }
    }

    /// 当前传输是否需要真实的时间间隔（未解析时按真实硬件处理）
    pub fn supports_real_timing(&self) -> bool {
        self.transport.as_ref().is_none_or(|t| t.supports_real_timing())
    }

    /// 阻塞休眠；mock 传输下直接跳过
    pub fn sleep(&self, duration: Duration) {
        if self.supports_real_timing() {
            spin_sleep::sleep(duration);
        } else {
            trace!("Mock sleeping for {:?}", duration);
        }
    }

    /// 当前传输的描述
    pub fn describe(&self) -> Option<String> {
        self.transport.as_ref().map(|t| t.describe())
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("state", &self.state())
            .field("transport", &self.describe())
            .finish()
    }
}
