//! 机器人连接参数
//!
//! 每个命令独立执行：
//! 1. 读取配置（默认为出厂配置，`--config` 覆盖）
//! 2. 应用命令行端口参数和标定偏移
//! 3. 在 [`Hexy::session`] 中连接 → 执行 → 卸力 → 断开

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use hexy_driver::{Hexy, HexyConfig};
use hexy_serial::PortAttribute;
use hexy_tools::OffsetTable;
use tracing::info;

use crate::safety::{InterruptFlag, Interrupted};

/// 保持期间检查中断的间隔
const HOLD_STEP: Duration = Duration::from_millis(50);

/// 所有命令共用的机器人参数
#[derive(Args, Debug, Clone, Default)]
pub struct RobotArgs {
    /// 机器人配置文件（TOML），默认使用出厂配置
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// 标定偏移文件（JSON，`{"舵机编号": 偏移}`）
    #[arg(long, global = true)]
    pub offsets: Option<PathBuf>,

    /// 找不到串口设备时使用 mock 传输
    #[arg(long, global = true)]
    pub mock: bool,

    /// 端口匹配子串（覆盖配置）
    #[arg(long = "match", global = true)]
    pub needle: Option<String>,

    /// 端口匹配属性：device / product / manufacturer / serial_number / description
    #[arg(long = "match-attr", global = true)]
    pub attribute: Option<PortAttribute>,

    /// 波特率（覆盖配置）
    #[arg(long, global = true)]
    pub baud: Option<u32>,
}

impl RobotArgs {
    /// 合并配置文件和命令行参数（命令行优先）
    pub fn load_config(&self) -> Result<HexyConfig> {
        let mut config = match &self.config {
            Some(path) => HexyConfig::load_from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => HexyConfig::default(),
        };

        if let Some(needle) = &self.needle {
            config.port.needle = needle.clone();
        }
        if let Some(attribute) = self.attribute {
            config.port.attribute = attribute;
        }
        if let Some(baud) = self.baud {
            config.port.baud_rate = baud;
        }
        if self.mock {
            config.port.fallback_to_mock = true;
        }

        Ok(config)
    }

    /// 创建机器人（未连接）并加载标定偏移
    pub fn build(&self) -> Result<Hexy> {
        let config = self.load_config()?;
        let mut hexy = Hexy::from_config(&config)?;
        self.apply_offsets(&mut hexy)?;
        Ok(hexy)
    }

    /// 创建机器人并在会话中执行 `f`（结束时总会卸力）
    pub fn run<T>(&self, f: impl FnOnce(&mut Hexy) -> Result<T>) -> Result<T> {
        let mut hexy = self.build()?;
        hexy.session(f)
    }

    /// 加载 `--offsets` 文件（如果有）
    pub fn apply_offsets(&self, hexy: &mut Hexy) -> Result<()> {
        if let Some(path) = &self.offsets {
            let table = OffsetTable::load(path)
                .with_context(|| format!("Failed to load offsets {}", path.display()))?;
            let updated = hexy.load_offsets(table.as_map());
            info!("Loaded {} offset(s) from {}", updated, path.display());
        }
        Ok(())
    }
}

/// 运动后保持供电的时间
#[derive(Args, Debug, Clone)]
pub struct HoldArgs {
    /// 卸力前保持的时间（ms）
    #[arg(long = "hold", default_value_t = 1000)]
    pub hold_ms: u64,
}

impl HoldArgs {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.hold_ms)
    }

    /// 保持当前姿态，每 50 ms 检查一次中断
    pub fn hold(&self, hexy: &mut Hexy, interrupt: &InterruptFlag) -> Result<(), Interrupted> {
        let mut remaining = self.duration();
        loop {
            interrupt.check()?;
            if remaining.is_zero() {
                return Ok(());
            }
            let step = remaining.min(HOLD_STEP);
            hexy.sleep(step);
            remaining -= step;
        }
    }
}
