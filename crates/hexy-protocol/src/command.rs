//! 舵机命令编码/解码
//!
//! 所有标定计算（符号、偏移、饱和截断）都在主机侧完成，线上格式与标定无关：
//!
//! | 命令 | 格式 | 含义 |
//! |---|---|---|
//! | Move | `#{id}P{code}\n` | 舵机 `id` 运动到位置码 `code` |
//! | Limp | `#{id}L\n` | 舵机 `id` 卸力 |
//! | Kill | `K\n` | 全部舵机卸力 |
//! | Center | `C\n` | 全部舵机回到 1500 |

use std::fmt;

use crate::constants::*;
use crate::{ProtocolError, ServoId, Sign};

/// 标定后的有效角度（度），已截断到 [-90, 90]
///
/// `effective = angle * sign + offset`，绝对值超过 90 时饱和为 ±90。
pub fn effective_angle(angle_degrees: f64, offset: f64, sign: Sign) -> Result<f64, ProtocolError> {
    let effective = angle_degrees * sign.as_f64() + offset;
    if effective.is_nan() {
        return Err(ProtocolError::InvalidAngle {
            angle: angle_degrees,
            offset,
        });
    }
    Ok(effective.clamp(-MAX_ANGLE_DEGREES, MAX_ANGLE_DEGREES))
}

/// 角度 → 位置码
///
/// `code = round(1500 + effective * 1000 / 90)`，结果总在 [500, 2500] 内。
pub fn position_code(angle_degrees: f64, offset: f64, sign: Sign) -> Result<u16, ProtocolError> {
    let effective = effective_angle(angle_degrees, offset, sign)?;
    let code = (CENTER_CODE as f64 + effective * CODE_SPAN / MAX_ANGLE_DEGREES).round();
    Ok(code as u16)
}

/// 位置码 → 未标定角度（度）
pub fn code_to_degrees(code: u16) -> f64 {
    (code as f64 - CENTER_CODE as f64) * MAX_ANGLE_DEGREES / CODE_SPAN
}

/// 编码 Move 命令行
pub fn encode_move(
    id: ServoId,
    angle_degrees: f64,
    offset: f64,
    sign: Sign,
) -> Result<Vec<u8>, ProtocolError> {
    let code = position_code(angle_degrees, offset, sign)?;
    Ok(ServoCommand::Move { id, code }.to_bytes())
}

/// 编码 Limp 命令行（单个舵机卸力）
pub fn encode_limp(id: ServoId) -> Vec<u8> {
    ServoCommand::Limp { id }.to_bytes()
}

/// 编码 Kill 命令行（全部卸力）
pub fn encode_kill() -> Vec<u8> {
    KILL_LINE.to_vec()
}

/// 编码 Center 命令行（全部回到 1500，忽略标定）
pub fn encode_center() -> Vec<u8> {
    CENTER_LINE.to_vec()
}

/// 单行线上命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServoCommand {
    /// 运动到位置码
    Move { id: ServoId, code: u16 },
    /// 单个舵机卸力
    Limp { id: ServoId },
    /// 全部卸力
    Kill,
    /// 全部回中
    Center,
}

impl ServoCommand {
    /// 编码为带换行符的 ASCII 行
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut line = self.to_string().into_bytes();
        line.push(LINE_TERMINATOR);
        line
    }

    /// 解析一行命令（末尾换行符可选）
    pub fn parse(line: &[u8]) -> Result<Self, ProtocolError> {
        let body = line.strip_suffix(&[LINE_TERMINATOR]).unwrap_or(line);
        let body = std::str::from_utf8(body).map_err(|_| malformed(line))?;

        match body {
            "K" => return Ok(ServoCommand::Kill),
            "C" => return Ok(ServoCommand::Center),
            _ => {},
        }

        let rest = body.strip_prefix('#').ok_or_else(|| malformed(line))?;
        let split = rest.find(|c: char| !c.is_ascii_digit()).ok_or_else(|| malformed(line))?;
        let (digits, tail) = rest.split_at(split);
        let raw_id: u8 = digits.parse().map_err(|_| malformed(line))?;
        let id = ServoId::new(raw_id)?;

        if tail == "L" {
            return Ok(ServoCommand::Limp { id });
        }

        let code_digits = tail.strip_prefix('P').ok_or_else(|| malformed(line))?;
        if code_digits.is_empty() || !code_digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed(line));
        }
        let code: u16 = code_digits.parse().map_err(|_| malformed(line))?;
        if !(MIN_CODE..=MAX_CODE).contains(&code) {
            return Err(ProtocolError::InvalidCode { code });
        }
        Ok(ServoCommand::Move { id, code })
    }

    /// 命令作用的舵机（Kill/Center 作用于全部，返回 `None`）
    pub fn servo_id(&self) -> Option<ServoId> {
        match self {
            ServoCommand::Move { id, .. } | ServoCommand::Limp { id } => Some(*id),
            ServoCommand::Kill | ServoCommand::Center => None,
        }
    }
}

impl fmt::Display for ServoCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServoCommand::Move { id, code } => write!(f, "#{}P{}", id, code),
            ServoCommand::Limp { id } => write!(f, "#{}L", id),
            ServoCommand::Kill => write!(f, "K"),
            ServoCommand::Center => write!(f, "C"),
        }
    }
}

fn malformed(line: &[u8]) -> ProtocolError {
    ProtocolError::Malformed {
        line: String::from_utf8_lossy(line).into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u8) -> ServoId {
        ServoId::new(raw).unwrap()
    }

    #[test]
    fn test_encode_move_center() {
        assert_eq!(encode_move(id(5), 0.0, 0.0, Sign::Positive).unwrap(), b"#5P1500\n");
    }

    #[test]
    fn test_encode_move_negative_sign_example() {
        // -20° → 1500 - 222.2 → 1278
        assert_eq!(encode_move(id(7), 20.0, 0.0, Sign::Negative).unwrap(), b"#7P1278\n");
    }

    #[test]
    fn test_offset_applied_after_sign() {
        // 10 * -1 + 5 = -5
        let code = position_code(10.0, 5.0, Sign::Negative).unwrap();
        assert_eq!(code, position_code(-5.0, 0.0, Sign::Positive).unwrap());
    }

    #[test]
    fn test_saturating_clamp() {
        assert_eq!(position_code(135.0, 0.0, Sign::Positive).unwrap(), MAX_CODE);
        assert_eq!(position_code(-400.0, 0.0, Sign::Positive).unwrap(), MIN_CODE);
        assert_eq!(position_code(85.0, 10.0, Sign::Positive).unwrap(), MAX_CODE);
        assert_eq!(position_code(f64::INFINITY, 0.0, Sign::Negative).unwrap(), MIN_CODE);
    }

    #[test]
    fn test_nan_angle_rejected() {
        let err = position_code(f64::NAN, 0.0, Sign::Positive).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidAngle { .. }));
    }

    #[test]
    fn test_constant_commands() {
        assert_eq!(encode_kill(), b"K\n");
        assert_eq!(encode_center(), b"C\n");
        assert_eq!(encode_limp(id(31)), b"#31L\n");
    }

    #[test]
    fn test_parse_lines() {
        assert_eq!(
            ServoCommand::parse(b"#24P2011\n").unwrap(),
            ServoCommand::Move { id: id(24), code: 2011 }
        );
        assert_eq!(ServoCommand::parse(b"#3L").unwrap(), ServoCommand::Limp { id: id(3) });
        assert_eq!(ServoCommand::parse(b"K\n").unwrap(), ServoCommand::Kill);
        assert_eq!(ServoCommand::parse(b"C").unwrap(), ServoCommand::Center);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let lines: [&[u8]; 8] = [b"", b"#", b"#P1500", b"#5X", b"#5P", b"#5P+10", b"Z\n", b"#40P1500"];
        for line in lines {
            assert!(ServoCommand::parse(line).is_err(), "accepted {:?}", line);
        }
        assert!(matches!(
            ServoCommand::parse(b"#5P3000").unwrap_err(),
            ProtocolError::InvalidCode { code: 3000 }
        ));
    }

    #[test]
    fn test_code_to_degrees() {
        assert_eq!(code_to_degrees(1500), 0.0);
        assert_eq!(code_to_degrees(2500), 90.0);
        assert_eq!(code_to_degrees(500), -90.0);
    }

    #[test]
    fn test_servo_id_of_command() {
        assert_eq!(ServoCommand::Kill.servo_id(), None);
        assert_eq!(ServoCommand::Limp { id: id(9) }.servo_id(), Some(id(9)));
    }
}
