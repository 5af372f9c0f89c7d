//! Mock 传输
//!
//! 没有硬件时使用：打开后接受任何写入并记录，不驱动任何电机。
//! 写入记录通过 [`MockLog`] 共享，测试可以在传输被驱动层接管后继续观察。

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use hexy_protocol::{ProtocolError, ServoCommand, code_to_degrees};
use parking_lot::Mutex;
use tracing::debug;

use crate::{Transport, TransportError, TransportResolver};

#[derive(Debug, Default)]
struct MockShared {
    lines: Mutex<Vec<Vec<u8>>>,
    opens: AtomicUsize,
    fail_writes: AtomicBool,
}

/// Mock 传输的共享写入记录
#[derive(Debug, Clone, Default)]
pub struct MockLog {
    shared: Arc<MockShared>,
}

impl MockLog {
    /// 所有已写入的行
    pub fn lines(&self) -> Vec<Vec<u8>> {
        self.shared.lines.lock().clone()
    }

    /// 取出并清空已写入的行
    pub fn take(&self) -> Vec<Vec<u8>> {
        std::mem::take(&mut *self.shared.lines.lock())
    }

    /// 已写入的行解析为命令
    pub fn commands(&self) -> Result<Vec<ServoCommand>, ProtocolError> {
        self.shared.lines.lock().iter().map(|line| ServoCommand::parse(line)).collect()
    }

    pub fn len(&self) -> usize {
        self.shared.lines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.shared.lines.lock().clear();
    }

    /// `open()` 被调用（且实际从关闭变为打开）的次数
    pub fn open_count(&self) -> usize {
        self.shared.opens.load(Ordering::SeqCst)
    }

    /// 模拟设备中途拔出：之后的写入返回 IO 错误
    pub fn set_fail_writes(&self, fail: bool) {
        self.shared.fail_writes.store(fail, Ordering::SeqCst);
    }
}

/// 惰性 mock 传输
#[derive(Debug, Default)]
pub struct MockTransport {
    is_open: bool,
    log: MockLog,
}

impl MockTransport {
    pub fn new() -> Self {
        debug!("Creating mock serial transport");
        Self::default()
    }

    /// 与已有记录共享的 mock 传输
    pub fn with_log(log: MockLog) -> Self {
        Self { is_open: false, log }
    }

    /// 获取共享写入记录
    pub fn log(&self) -> MockLog {
        self.log.clone()
    }
}

impl Transport for MockTransport {
    fn open(&mut self) -> Result<(), TransportError> {
        if !self.is_open {
            debug!("Opening mock serial connection");
            self.is_open = true;
            self.log.shared.opens.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn close(&mut self) {
        if self.is_open {
            debug!("Closing mock serial connection");
            self.is_open = false;
        }
    }

    fn is_open(&self) -> bool {
        self.is_open
    }

    fn write_line(&mut self, line: &[u8]) -> Result<(), TransportError> {
        if !self.is_open {
            return Err(TransportError::NotOpen(self.describe()));
        }
        if self.log.shared.fail_writes.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "mock device unplugged").into());
        }
        match ServoCommand::parse(line) {
            Ok(ServoCommand::Move { id, code }) => debug!(
                "Command sent to mock serial: #{} -> {} ({:.1}° uncalibrated)",
                id,
                code,
                code_to_degrees(code)
            ),
            _ => debug!("Command sent to mock serial: {:?}", String::from_utf8_lossy(line)),
        }
        self.log.shared.lines.lock().push(line.to_vec());
        Ok(())
    }

    fn supports_real_timing(&self) -> bool {
        false
    }

    fn describe(&self) -> String {
        "mock".to_string()
    }
}

/// 总是解析出 mock 传输的解析器
///
/// 克隆体共享写入记录和计数器，测试可以保留一份克隆来观察驱动层行为。
#[derive(Debug, Clone)]
pub struct MockResolver {
    log: MockLog,
    resolves: Arc<AtomicUsize>,
    available: Arc<AtomicBool>,
}

impl MockResolver {
    pub fn new() -> Self {
        Self {
            log: MockLog::default(),
            resolves: Arc::new(AtomicUsize::new(0)),
            available: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn log(&self) -> MockLog {
        self.log.clone()
    }

    /// `resolve()` 被调用的次数（即端口发现次数）
    pub fn resolve_count(&self) -> usize {
        self.resolves.load(Ordering::SeqCst)
    }

    /// 模拟设备是否存在
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }
}

impl Default for MockResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl TransportResolver for MockResolver {
    fn resolve(&mut self) -> Result<Option<Box<dyn Transport>>, TransportError> {
        self.resolves.fetch_add(1, Ordering::SeqCst);
        if !self.available.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(Some(Box::new(MockTransport::with_log(self.log.clone()))))
    }

    fn target(&self) -> String {
        "mock device".to_string()
    }
}
