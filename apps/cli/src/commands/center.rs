//! 居中命令

use anyhow::Result;
use clap::Args;

use crate::robot::{HoldArgs, RobotArgs};
use crate::safety::InterruptFlag;

/// 居中命令参数
#[derive(Args, Debug)]
pub struct CenterCommand {
    /// 按标定偏移逐个居中（默认发送忽略标定的整机 Center）
    #[arg(long)]
    pub calibrated: bool,

    #[command(flatten)]
    pub hold: HoldArgs,
}

impl CenterCommand {
    pub fn execute(&self, robot: &RobotArgs, interrupt: &InterruptFlag) -> Result<()> {
        robot.run(|hexy| {
            if self.calibrated {
                for name in hexy.servo_names() {
                    interrupt.check()?;
                    if let Some(mut servo) = hexy.servo_by_name(&name) {
                        servo.center()?;
                    }
                }
            } else {
                hexy.center()?;
            }
            self.hold.hold(hexy, interrupt)?;
            Ok(())
        })?;
        println!("✅ Centered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_with_mock() {
        let robot = RobotArgs {
            mock: true,
            needle: Some("no-such-controller-7f3a".to_string()),
            ..Default::default()
        };
        let cmd = CenterCommand {
            calibrated: true,
            hold: HoldArgs { hold_ms: 0 },
        };
        cmd.execute(&robot, &InterruptFlag::default()).unwrap();
    }
}
