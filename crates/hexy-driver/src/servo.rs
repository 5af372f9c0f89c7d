//! 单个舵机
//!
//! 保存标定（偏移、符号）与最后一次指令角度。系统没有位置反馈，相对运动
//! 以“最后指令角度”为基准：如果舵机堵转或打滑，误差会在后续相对运动中
//! 累积且无法修正。

use hexy_protocol::{ServoId, Sign, encode_limp, encode_move};

use crate::{Connection, DriverError};

#[derive(Debug, Clone, PartialEq)]
pub struct Servo {
    id: ServoId,
    offset: f64,
    sign: Sign,
    last_commanded: Option<f64>,
}

impl Servo {
    pub fn new(id: ServoId, offset: f64, sign: Sign) -> Self {
        Self {
            id,
            offset,
            sign,
            last_commanded: None,
        }
    }

    /// 设置初始“最后指令角度”
    pub fn with_start_angle(mut self, angle: Option<f64>) -> Self {
        self.last_commanded = angle;
        self
    }

    pub fn id(&self) -> ServoId {
        self.id
    }

    /// 标定偏移（度）
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// 修改标定偏移，下一次运动命令生效
    ///
    /// 不做范围检查：偏移过大时结果角度会被饱和截断。
    pub fn set_offset(&mut self, offset: f64) {
        self.offset = offset;
    }

    pub fn sign(&self) -> Sign {
        self.sign
    }

    pub fn last_commanded_angle(&self) -> Option<f64> {
        self.last_commanded
    }

    /// 运动到绝对角度（应用偏移和符号）
    ///
    /// 只有发送成功后才更新最后指令角度。
    pub fn set_absolute_position(
        &mut self,
        link: &mut Connection,
        degrees: f64,
    ) -> Result<(), DriverError> {
        let line = encode_move(self.id, degrees, self.offset, self.sign)?;
        link.send(&line)?;
        self.last_commanded = Some(degrees);
        Ok(())
    }

    /// 相对最后指令角度运动（未设置时以 0 为基准）
    pub fn set_relative_position(
        &mut self,
        link: &mut Connection,
        delta_degrees: f64,
    ) -> Result<(), DriverError> {
        let base = self.last_commanded.unwrap_or(0.0);
        self.set_absolute_position(link, base + delta_degrees)
    }

    /// 重新发送最后指令角度（重连后用于恢复姿态）
    pub fn restore_last_position(&mut self, link: &mut Connection) -> Result<(), DriverError> {
        self.set_relative_position(link, 0.0)
    }

    /// 卸力，不改变最后指令角度
    pub fn stop(&self, link: &mut Connection) -> Result<(), DriverError> {
        link.send(&encode_limp(self.id))
    }

    /// 回到标定后的中位（区别于忽略标定的整机 Center 命令）
    pub fn center(&mut self, link: &mut Connection) -> Result<(), DriverError> {
        self.set_absolute_position(link, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexy_protocol::ServoCommand;
    use hexy_serial::{MockLog, MockResolver};

    fn connected() -> (Connection, MockLog) {
        let resolver = MockResolver::new();
        let log = resolver.log();
        let mut link = Connection::new(Box::new(resolver));
        link.connect().unwrap();
        (link, log)
    }

    fn servo(id: u8, offset: f64, sign: Sign) -> Servo {
        Servo::new(ServoId::new(id).unwrap(), offset, sign)
    }

    #[test]
    fn test_absolute_applies_calibration() {
        let (mut link, log) = connected();
        let mut s = servo(7, 0.0, Sign::Negative);

        s.set_absolute_position(&mut link, 20.0).unwrap();
        assert_eq!(log.lines(), vec![b"#7P1278\n".to_vec()]);
        assert_eq!(s.last_commanded_angle(), Some(20.0));
    }

    #[test]
    fn test_relative_matches_absolute() {
        let (mut link, log) = connected();
        let mut a = servo(3, 2.5, Sign::Positive);
        let mut b = servo(3, 2.5, Sign::Positive);

        a.set_absolute_position(&mut link, 10.0).unwrap();
        a.set_relative_position(&mut link, 15.0).unwrap();
        b.set_absolute_position(&mut link, 25.0).unwrap();

        let lines = log.lines();
        assert_eq!(lines[1], lines[2]);
        assert_eq!(a.last_commanded_angle(), Some(25.0));
    }

    #[test]
    fn test_restore_without_prior_move_goes_to_zero() {
        let (mut link, log) = connected();
        let mut a = servo(9, -4.0, Sign::Negative);
        let mut b = servo(9, -4.0, Sign::Negative);

        a.restore_last_position(&mut link).unwrap();
        b.set_absolute_position(&mut link, 0.0).unwrap();

        let lines = log.lines();
        assert_eq!(lines[0], lines[1]);
    }

    #[test]
    fn test_start_angle_is_restore_base() {
        let (mut link, log) = connected();
        let mut s = servo(6, 0.0, Sign::Positive).with_start_angle(Some(-45.0));

        s.restore_last_position(&mut link).unwrap();
        assert_eq!(log.commands().unwrap(), vec![ServoCommand::Move {
            id: ServoId::new(6).unwrap(),
            code: 1000
        }]);
    }

    #[test]
    fn test_stop_keeps_last_angle() {
        let (mut link, log) = connected();
        let mut s = servo(31, 0.0, Sign::Negative);

        s.set_absolute_position(&mut link, 30.0).unwrap();
        s.stop(&mut link).unwrap();
        assert_eq!(s.last_commanded_angle(), Some(30.0));
        assert_eq!(log.lines()[1], b"#31L\n".to_vec());
    }

    #[test]
    fn test_center_uses_offset() {
        let (mut link, log) = connected();
        let mut s = servo(5, 9.0, Sign::Positive);

        s.center(&mut link).unwrap();
        assert_eq!(log.lines(), vec![b"#5P1600\n".to_vec()]);
    }

    #[test]
    fn test_offset_change_takes_effect_on_next_move() {
        let (mut link, log) = connected();
        let mut s = servo(5, 0.0, Sign::Positive);

        s.set_offset(-9.0);
        s.center(&mut link).unwrap();
        assert_eq!(log.lines(), vec![b"#5P1400\n".to_vec()]);
    }

    #[test]
    fn test_not_connected_has_no_side_effect() {
        let resolver = MockResolver::new();
        let log = resolver.log();
        let mut link = Connection::new(Box::new(resolver));
        let mut s = servo(7, 0.0, Sign::Positive).with_start_angle(Some(5.0));

        assert!(matches!(
            s.set_absolute_position(&mut link, 40.0),
            Err(DriverError::NotConnected)
        ));
        assert!(matches!(s.stop(&mut link), Err(DriverError::NotConnected)));
        assert_eq!(s.last_commanded_angle(), Some(5.0));
        assert!(log.is_empty());
    }

    #[test]
    fn test_failed_write_keeps_last_angle() {
        let (mut link, log) = connected();
        let mut s = servo(7, 0.0, Sign::Positive);
        s.set_absolute_position(&mut link, 10.0).unwrap();

        log.set_fail_writes(true);
        assert!(matches!(
            s.set_absolute_position(&mut link, 50.0),
            Err(DriverError::Transport(_))
        ));
        assert_eq!(s.last_commanded_angle(), Some(10.0));
    }
}
