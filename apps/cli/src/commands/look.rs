//! 头部转动命令

use anyhow::Result;
use clap::Args;

use crate::robot::{HoldArgs, RobotArgs};
use crate::safety::InterruptFlag;
use crate::validation::validate_angle;

/// 头部转动参数
#[derive(Args, Debug)]
pub struct LookCommand {
    /// 绝对角度：-90 最左，+90 最右
    #[arg(allow_negative_numbers = true)]
    pub angle: f64,

    #[command(flatten)]
    pub hold: HoldArgs,
}

impl LookCommand {
    pub fn execute(&self, robot: &RobotArgs, interrupt: &InterruptFlag) -> Result<()> {
        let angle = validate_angle(self.angle)?;
        robot.run(|hexy| {
            hexy.head_mut().look(angle)?;
            self.hold.hold(hexy, interrupt)?;
            Ok(())
        })?;
        println!("✅ Head at {}°", angle);
        Ok(())
    }
}
