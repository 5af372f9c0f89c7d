//! 协议常量定义
//!
//! Servotor32 控制板使用脉宽风格的位置码：1500 为中位，±1000 对应 ±90°。

/// 中位位置码（对应 0°）
pub const CENTER_CODE: u16 = 1500;

/// 从中位到满行程的位置码跨度
pub const CODE_SPAN: f64 = 1000.0;

/// 最大可指令角度（度），超出部分饱和截断
pub const MAX_ANGLE_DEGREES: f64 = 90.0;

/// 最小位置码（-90°）
pub const MIN_CODE: u16 = 500;

/// 最大位置码（+90°）
pub const MAX_CODE: u16 = 2500;

/// 控制板支持的最大舵机编号
pub const MAX_SERVO_ID: u8 = 31;

/// 默认串口波特率
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// 行结束符
pub const LINE_TERMINATOR: u8 = b'\n';

/// 全部舵机卸力
pub const KILL_LINE: &[u8] = b"K\n";

/// 全部舵机回到 1500（忽略标定）
pub const CENTER_LINE: &[u8] = b"C\n";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_range() {
        assert_eq!(MIN_CODE, 500);
        assert_eq!(MAX_CODE, 2500);
    }

    #[test]
    fn test_constant_lines_are_terminated() {
        assert_eq!(KILL_LINE.last(), Some(&LINE_TERMINATOR));
        assert_eq!(CENTER_LINE.last(), Some(&LINE_TERMINATOR));
    }
}
