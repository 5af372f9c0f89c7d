//! 移动命令
//!
//! 把一个或多个舵机移动到绝对角度（应用标定），保持一段时间后卸力

use std::str::FromStr;

use anyhow::Result;
use clap::Args;

use crate::robot::{HoldArgs, RobotArgs};
use crate::safety::InterruptFlag;
use crate::validation::{ServoSelector, validate_angle};

/// 单个目标：`舵机=角度`
#[derive(Debug, Clone, PartialEq)]
pub struct MoveTarget {
    pub servo: ServoSelector,
    pub degrees: f64,
}

impl FromStr for MoveTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (servo, degrees) = s
            .split_once('=')
            .ok_or_else(|| format!("expected SERVO=DEGREES, got {:?}", s))?;
        let degrees = degrees
            .trim()
            .parse::<f64>()
            .map_err(|e| format!("invalid angle {:?}: {}", degrees, e))?;
        Ok(Self {
            servo: servo.parse()?,
            degrees,
        })
    }
}

/// 移动命令参数
#[derive(Args, Debug)]
pub struct MoveCommand {
    /// 目标，例如 `LF/hip=20 31=-45 7=10`
    #[arg(required = true)]
    pub targets: Vec<MoveTarget>,

    #[command(flatten)]
    pub hold: HoldArgs,
}

impl MoveCommand {
    pub fn execute(&self, robot: &RobotArgs, interrupt: &InterruptFlag) -> Result<()> {
        for target in &self.targets {
            validate_angle(target.degrees)?;
        }

        robot.run(|hexy| {
            for target in &self.targets {
                interrupt.check()?;
                let mut servo = target.servo.resolve(hexy)?;
                println!("  #{} → {}°", servo.id(), target.degrees);
                servo.set_absolute_position(target.degrees)?;
            }
            self.hold.hold(hexy, interrupt)?;
            Ok(())
        })?;

        println!("✅ Move complete");
        Ok(())
    }
}
