//! # Hexy Protocol
//!
//! Servotor32 舵机控制板串口协议定义（无硬件依赖）
//!
//! ## 模块
//!
//! - `constants`: 协议常量（位置码范围、波特率、固定命令行）
//! - `command`: 命令编码（角度 → 位置码 → ASCII 行）与解析
//!
//! ## 线上格式
//!
//! 以换行分隔的单行 ASCII 命令，例如 `#7P1278\n`。标定（符号、偏移）
//! 在编码前由主机完成，控制板只看到最终位置码。

pub mod command;
pub mod constants;

// 重新导出常用类型
pub use command::*;
pub use constants::*;

use std::fmt;

use thiserror::Error;

/// 协议错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    #[error("Invalid servo id: {id} (max {max})", max = MAX_SERVO_ID)]
    InvalidServoId { id: u8 },

    #[error("Invalid sign: {value} (expected 1 or -1)")]
    InvalidSign { value: i8 },

    #[error("Angle is not a number: angle={angle}, offset={offset}")]
    InvalidAngle { angle: f64, offset: f64 },

    #[error("Position code out of range: {code}")]
    InvalidCode { code: u16 },

    #[error("Malformed command line: {line:?}")]
    Malformed { line: String },
}

/// 舵机编号（0–31）
///
/// 构造时校验范围，之后所有层都可以直接信任该值。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "u8", into = "u8")
)]
pub struct ServoId(u8);

impl ServoId {
    pub fn new(id: u8) -> Result<Self, ProtocolError> {
        if id > MAX_SERVO_ID {
            return Err(ProtocolError::InvalidServoId { id });
        }
        Ok(Self(id))
    }

    /// 常量构造，超出范围时编译期报错
    pub const fn new_const(id: u8) -> Self {
        assert!(id <= MAX_SERVO_ID, "servo id out of range");
        Self(id)
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for ServoId {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ServoId> for u8 {
    fn from(id: ServoId) -> Self {
        id.0
    }
}

impl fmt::Display for ServoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 安装方向符号
///
/// 左右两侧舵机镜像安装，`Negative` 将指令角度取反，使正角度统一表示
/// “向前/向上”。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "i8", into = "i8")
)]
pub enum Sign {
    #[default]
    Positive,
    Negative,
}

impl Sign {
    pub fn as_f64(self) -> f64 {
        match self {
            Sign::Positive => 1.0,
            Sign::Negative => -1.0,
        }
    }
}

impl TryFrom<i8> for Sign {
    type Error = ProtocolError;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Sign::Positive),
            -1 => Ok(Sign::Negative),
            _ => Err(ProtocolError::InvalidSign { value }),
        }
    }
}

impl From<Sign> for i8 {
    fn from(sign: Sign) -> Self {
        match sign {
            Sign::Positive => 1,
            Sign::Negative => -1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_servo_id_range() {
        assert_eq!(ServoId::new(0).unwrap().get(), 0);
        assert_eq!(ServoId::new(31).unwrap().get(), 31);
        assert_eq!(
            ServoId::new(32).unwrap_err(),
            ProtocolError::InvalidServoId { id: 32 }
        );
    }

    #[test]
    fn test_sign_conversion() {
        assert_eq!(Sign::try_from(-1).unwrap(), Sign::Negative);
        assert_eq!(Sign::try_from(1).unwrap(), Sign::Positive);
        assert!(Sign::try_from(0).is_err());
        assert_eq!(i8::from(Sign::Negative), -1);
        assert_eq!(Sign::Negative.as_f64(), -1.0);
    }

    #[test]
    fn test_error_display() {
        let msg = format!("{}", ProtocolError::InvalidServoId { id: 40 });
        assert!(msg.contains("40") && msg.contains("31"), "{}", msg);

        let msg = format!("{}", ProtocolError::Malformed { line: "#x".to_string() });
        assert!(msg.contains("Malformed"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_validates() {
        let id: ServoId = serde_json::from_str("24").unwrap();
        assert_eq!(id.get(), 24);
        assert!(serde_json::from_str::<ServoId>("99").is_err());

        let sign: Sign = serde_json::from_str("-1").unwrap();
        assert_eq!(sign, Sign::Negative);
        assert_eq!(serde_json::to_string(&Sign::Positive).unwrap(), "1");
    }
}
