//! 急停命令
//!
//! 发送 Kill，所有舵机立即卸力

use anyhow::Result;
use clap::Args;

use crate::robot::RobotArgs;

/// 急停命令参数
#[derive(Args, Debug)]
pub struct StopCommand {}

impl StopCommand {
    pub fn execute(&self, robot: &RobotArgs) -> Result<()> {
        let mut hexy = robot.build()?;

        println!("🔌 Connecting...");
        hexy.connect()?;

        println!("🛑 Releasing all servos...");
        let result = hexy.stop();
        hexy.disconnect();
        result?;

        println!("✅ Stopped");
        Ok(())
    }
}
