//! 标定命令
//!
//! 逐个舵机确定偏移，使所有舵机尽可能精确地居中。
//!
//! 每个舵机：
//! 1. 卸力，提示按回车开始（Tab 跳过）
//! 2. 摆动 ±15° 四次（间隔 250 ms）后回到 0°，便于辨认是哪一个舵机
//! 3. ←/→ 按灵敏度减/加偏移并重新居中，↑/↓ 调整灵敏度（0.1°–1.0°）
//! 4. 回车确认，卸力
//!
//! 按键从标准输入读取，终端需处于 raw 模式（例如
//! `stty raw -echo; hexy-cli calibrate; stty sane`）。raw 模式下 Ctrl-C 作为
//! 按键到达，立即中止；非 raw 模式下信号只设置中断标志，读取按键会一直阻塞，
//! 要再按一次任意键（或回车）才会中止并卸力。

use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::Args;
use hexy_driver::{Hexy, ServoHandle};
use hexy_tools::{Key, KeyDecoder, OffsetTable};

use crate::robot::RobotArgs;
use crate::safety::{InterruptFlag, Interrupted};

const DESCRIPTION: &str = "\
This tool helps you find the offset that makes each servo as precisely centered as possible.
Before adjusting a servo it is wiggled slightly so it is obvious which one is being centered.
LEFT/RIGHT move the servo slightly and update its offset.
UP/DOWN change the size of each LEFT/RIGHT adjustment.";

const WIGGLE_ANGLES: [f64; 4] = [15.0, -15.0, 15.0, -15.0];
const WIGGLE_PAUSE: Duration = Duration::from_millis(250);
const SETTLE_PAUSE: Duration = Duration::from_millis(250);
const RECENTER_PAUSE: Duration = Duration::from_millis(50);

/// 标定命令参数
#[derive(Args, Debug)]
pub struct CalibrateCommand {
    /// 初始偏移文件（可选）
    #[arg(short, long = "input-file")]
    pub input_file: Option<PathBuf>,

    /// 结束后写入偏移的文件（可选，偏移总会打印到屏幕）
    #[arg(short, long = "output-file")]
    pub output_file: Option<PathBuf>,
}

impl CalibrateCommand {
    pub fn execute(&self, robot: &RobotArgs, interrupt: &InterruptFlag) -> Result<()> {
        println!("{}\n", DESCRIPTION);

        let mut hexy = robot.build()?;
        if let Some(path) = &self.input_file {
            let seed = OffsetTable::load(path)
                .with_context(|| format!("Failed to load offsets {}", path.display()))?;
            hexy.load_offsets(seed.as_map());
        }

        let mut keys = KeyDecoder::new(std::io::stdin().lock());
        let offsets =
            hexy.session(|hexy| Calibrator::new(&mut keys, interrupt).run(hexy))?;

        println!("{}", offsets.to_json_string()?);
        if let Some(path) = &self.output_file {
            offsets
                .save(path)
                .with_context(|| format!("Failed to write offsets {}", path.display()))?;
        }
        Ok(())
    }
}

/// 左右键每次调整的角度，以 0.1° 为单位
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Sensitivity(u8);

impl Sensitivity {
    const MIN: u8 = 1;
    const MAX: u8 = 10;

    fn increase(&mut self) {
        self.0 = (self.0 + 1).min(Self::MAX);
    }

    fn decrease(&mut self) {
        self.0 = self.0.saturating_sub(1).max(Self::MIN);
    }

    fn degrees(self) -> f64 {
        f64::from(self.0) / 10.0
    }
}

impl Default for Sensitivity {
    fn default() -> Self {
        Self(5)
    }
}

/// 交互式标定流程
pub struct Calibrator<'a, R> {
    keys: &'a mut KeyDecoder<R>,
    interrupt: &'a InterruptFlag,
}

impl<'a, R: Read> Calibrator<'a, R> {
    pub fn new(keys: &'a mut KeyDecoder<R>, interrupt: &'a InterruptFlag) -> Self {
        Self { keys, interrupt }
    }

    /// 按标定顺序处理所有舵机，返回最终偏移表
    pub fn run(&mut self, hexy: &mut Hexy) -> Result<OffsetTable> {
        hexy.center()?;
        hexy.sleep(SETTLE_PAUSE);
        hexy.stop()?;

        for name in hexy.servo_names() {
            self.interrupt.check()?;
            println!("Servo name: {}", name);
            let mut servo = hexy
                .servo_by_name(&name)
                .ok_or_else(|| anyhow!("Unknown servo {}", name))?;

            servo.stop()?;
            let offset = self.determine_offset(&mut servo)?;
            servo.stop()?;
            println!("Offset: {:.1}", offset);
        }

        Ok(hexy.offsets().into_iter().collect())
    }

    fn determine_offset(&mut self, servo: &mut ServoHandle<'_>) -> Result<f64> {
        println!(
            "Preparing to determine offset for servo #{}. Press <enter> to wiggle and begin. Press <tab> to skip.",
            servo.id()
        );
        loop {
            match self.next_key()? {
                Key::Return => break,
                Key::Tab => return Ok(servo.offset()),
                _ => {},
            }
        }

        for angle in WIGGLE_ANGLES {
            self.interrupt.check()?;
            servo.set_absolute_position(angle)?;
            servo.pause(WIGGLE_PAUSE);
        }
        servo.set_absolute_position(0.0)?;
        println!("Done wiggling. Set to what you consider true center.");

        let mut sensitivity = Sensitivity::default();
        loop {
            match self.next_key()? {
                Key::Return => return Ok(servo.offset()),
                Key::Up => {
                    sensitivity.increase();
                    println!("Sensitivity: {:.1}", sensitivity.degrees());
                    continue;
                },
                Key::Down => {
                    sensitivity.decrease();
                    println!("Sensitivity: {:.1}", sensitivity.degrees());
                    continue;
                },
                Key::Right => {
                    println!("Adding {:.1} degree(s)", sensitivity.degrees());
                    servo.set_offset(servo.offset() + sensitivity.degrees());
                },
                Key::Left => {
                    println!("Subtracting {:.1} degree(s)", sensitivity.degrees());
                    servo.set_offset(servo.offset() - sensitivity.degrees());
                },
                _ => println!("Unknown key pressed."),
            }
            servo.center()?;
            servo.pause(RECENTER_PAUSE);
        }
    }

    /// 下一个按键；Ctrl-C（按键或信号）转换为 [`Interrupted`]
    fn next_key(&mut self) -> Result<Key> {
        self.interrupt.check()?;
        let key = self.keys.next_key()?.ok_or_else(|| anyhow!("Key input closed"))?;
        if key == Key::Interrupt {
            return Err(Interrupted.into());
        }
        self.interrupt.check()?;
        Ok(key)
    }
}
