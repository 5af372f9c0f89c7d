//! 输入验证模块

use std::str::FromStr;

use anyhow::{Result, anyhow, bail};
use hexy_driver::{Hexy, ServoHandle, ServoId};
use hexy_protocol::MAX_ANGLE_DEGREES;
use tracing::warn;

/// 舵机选择：编号（`7`）或名字（`LF/hip`、`Head`）
#[derive(Debug, Clone, PartialEq)]
pub enum ServoSelector {
    Id(ServoId),
    Name(String),
}

impl ServoSelector {
    /// 在机器人上查找
    pub fn resolve<'a>(&self, hexy: &'a mut Hexy) -> Result<ServoHandle<'a>> {
        match self {
            ServoSelector::Id(id) => Ok(hexy.servo_mut(*id)?),
            ServoSelector::Name(name) => hexy.servo_by_name(name).ok_or_else(|| {
                anyhow!("Unknown servo {:?} (expected an id, \"Head\" or e.g. \"LF/hip\")", name)
            }),
        }
    }
}

impl FromStr for ServoSelector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("servo must not be empty".to_string());
        }
        match s.parse::<u8>() {
            Ok(raw) => ServoId::new(raw).map(ServoSelector::Id).map_err(|e| e.to_string()),
            Err(_) => Ok(ServoSelector::Name(s.to_string())),
        }
    }
}

/// 检查角度参数
///
/// NaN / 无穷大直接拒绝；超出 ±90° 只警告（发送时会被截断）。
pub fn validate_angle(degrees: f64) -> Result<f64> {
    if !degrees.is_finite() {
        bail!("Angle must be a finite number, got {}", degrees);
    }
    if degrees.abs() > MAX_ANGLE_DEGREES {
        warn!("{}° is outside ±{}°, the servo will stop at the limit", degrees, MAX_ANGLE_DEGREES);
    }
    Ok(degrees)
}
