//! 安全停止
//!
//! Ctrl-C 只设置标志位，不直接退出进程。驱动舵机的命令在步骤之间
//! （包括运动后的保持期间）检查标志位并返回 [`Interrupted`]，由 [`Hexy::session`](hexy_driver::Hexy::session)
//! 负责发送 Kill 并断开。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use thiserror::Error;

/// 用户中断（Ctrl-C）
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Interrupted by user")]
pub struct Interrupted;

/// 中断标志
#[derive(Debug, Clone, Default)]
pub struct InterruptFlag(Arc<AtomicBool>);

impl InterruptFlag {
    /// 安装 Ctrl-C 处理器
    pub fn install() -> Result<Self> {
        let flag = Self::default();
        let handler_flag = flag.clone();
        ctrlc::set_handler(move || {
            eprintln!("\nInterrupt received, releasing servos...");
            handler_flag.trigger();
        })
        .context("Failed to set signal handler")?;
        Ok(flag)
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// 已中断时返回错误
    pub fn check(&self) -> Result<(), Interrupted> {
        if self.is_triggered() { Err(Interrupted) } else { Ok(()) }
    }
}
