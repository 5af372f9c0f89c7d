//! 真实串口传输
//!
//! 基于 `serialport` crate。`open()` 时才真正打开设备，`close()` 释放句柄，
//! 因此同一个 `SerialPortTransport` 可以反复开关而无需重新枚举。

use std::io::Write;
use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use tracing::{debug, info};

use crate::{Transport, TransportError};

/// 默认写超时
const WRITE_TIMEOUT: Duration = Duration::from_millis(1000);

pub struct SerialPortTransport {
    path: String,
    baud_rate: u32,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialPortTransport {
    /// 创建传输（不打开设备）
    pub fn new(path: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            path: path.into(),
            baud_rate,
            port: None,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }
}

impl Transport for SerialPortTransport {
    fn open(&mut self) -> Result<(), TransportError> {
        if self.port.is_some() {
            return Ok(());
        }
        let port = serialport::new(&self.path, self.baud_rate)
            .timeout(WRITE_TIMEOUT)
            .data_bits(DataBits::Eight)
            .stop_bits(StopBits::One)
            .parity(Parity::None)
            .flow_control(FlowControl::None)
            .open()?;

        info!("Serial port opened: {} @ {} baud", self.path, self.baud_rate);
        self.port = Some(port);
        Ok(())
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            info!("Serial port closed: {}", self.path);
        }
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn write_line(&mut self, line: &[u8]) -> Result<(), TransportError> {
        let port = self.port.as_mut().ok_or_else(|| TransportError::NotOpen(self.path.clone()))?;
        port.write_all(line)?;
        port.flush()?;
        debug!("-> {}: {:?}", self.path, String::from_utf8_lossy(line));
        Ok(())
    }

    fn describe(&self) -> String {
        format!("{} @ {} baud", self.path, self.baud_rate)
    }
}

impl std::fmt::Debug for SerialPortTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialPortTransport")
            .field("path", &self.path)
            .field("baud_rate", &self.baud_rate)
            .field("is_open", &self.port.is_some())
            .finish()
    }
}
