//! 摆动命令
//!
//! 所有腿部舵机 +20° → -20° → +20°，每步之间暂停，最后全部卸力。
//! 用于上电后快速检查接线。

use std::time::Duration;

use anyhow::Result;
use clap::Args;
use hexy_driver::{Hexy, Joint, Leg};
use tracing::info;

use crate::robot::RobotArgs;
use crate::safety::InterruptFlag;
use crate::validation::validate_angle;

/// 摆动命令参数
#[derive(Args, Debug)]
pub struct WiggleCommand {
    /// 摆动幅度（度）
    #[arg(long, default_value_t = 20.0)]
    pub angle: f64,

    /// 每步之间的暂停（ms）
    #[arg(long, default_value_t = 200)]
    pub pause_ms: u64,
}

impl WiggleCommand {
    pub fn execute(&self, robot: &RobotArgs, interrupt: &InterruptFlag) -> Result<()> {
        let angle = validate_angle(self.angle)?;
        let pause = Duration::from_millis(self.pause_ms);
        robot.run(|hexy| wiggle(hexy, angle, pause, interrupt))?;
        println!("✅ Wiggle complete");
        Ok(())
    }
}

/// 执行摆动序列，结束时发送 Kill
pub fn wiggle(hexy: &mut Hexy, angle: f64, pause: Duration, interrupt: &InterruptFlag) -> Result<()> {
    let legs: Vec<_> = hexy.legs().iter().map(Leg::name).collect();

    for target in [angle, -angle, angle] {
        interrupt.check()?;
        info!("Moving all leg servos to {}°", target);
        for &name in &legs {
            let Some(mut leg) = hexy.leg_mut(name) else {
                continue;
            };
            for joint in Joint::ALL {
                leg.joint(joint).set_absolute_position(target)?;
            }
        }
        hexy.sleep(pause);
    }

    hexy.stop()?;
    Ok(())
}
