//! # Hexy CLI
//!
//! Command-line interface for the Hexy hexapod.
//!
//! 每个命令独立执行（连接 → 操作 → 卸力 → 断开）：
//!
//! ```bash
//! # 列出串口，查看哪个会被选中
//! hexy-cli ports
//!
//! # 标定偏移并保存
//! hexy-cli calibrate --output-file offsets.json
//!
//! # 使用标定偏移移动舵机
//! hexy-cli --offsets offsets.json move LF/hip=20 Head=-30
//!
//! # 没有硬件时使用 mock 传输
//! hexy-cli --mock wiggle
//! ```

use std::process::ExitCode;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod robot;
mod safety;
mod validation;

use commands::{
    CalibrateCommand, CenterCommand, ConfigCommand, LookCommand, MoveCommand, PortsCommand,
    StopCommand, WiggleCommand,
};
use robot::RobotArgs;
use safety::{InterruptFlag, Interrupted};

/// Hexy CLI - 六足机器人命令行工具
#[derive(Parser, Debug)]
#[command(name = "hexy-cli")]
#[command(about = "Command-line interface for Hexy hexapod servo control", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    robot: RobotArgs,

    /// 日志详细程度（-v debug，-vv trace）
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 交互式标定舵机偏移
    Calibrate {
        #[command(flatten)]
        args: CalibrateCommand,
    },

    /// 腿部舵机来回摆动后卸力
    Wiggle {
        #[command(flatten)]
        args: WiggleCommand,
    },

    /// 所有舵机居中
    Center {
        #[command(flatten)]
        args: CenterCommand,
    },

    /// 急停（所有舵机卸力）
    Kill {
        #[command(flatten)]
        args: StopCommand,
    },

    /// 移动舵机到绝对角度
    Move {
        #[command(flatten)]
        args: MoveCommand,
    },

    /// 头部转到绝对角度
    Look {
        #[command(flatten)]
        args: LookCommand,
    },

    /// 列出串口
    Ports {
        #[command(flatten)]
        args: PortsCommand,
    },

    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "hexy_cli=info,hexy_driver=info,hexy_serial=info",
        1 => "hexy_cli=debug,hexy_driver=debug,hexy_serial=debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn run(cli: Cli) -> Result<()> {
    let robot = &cli.robot;
    // 驱动舵机的命令都需要在 Ctrl-C 时先卸力再退出
    let interrupt = match cli.command {
        Commands::Ports { .. } | Commands::Config(_) => InterruptFlag::default(),
        _ => InterruptFlag::install()?,
    };

    match cli.command {
        Commands::Calibrate { args } => args.execute(robot, &interrupt),
        Commands::Wiggle { args } => args.execute(robot, &interrupt),
        Commands::Center { args } => args.execute(robot, &interrupt),
        Commands::Kill { args } => args.execute(robot),
        Commands::Move { args } => args.execute(robot, &interrupt),
        Commands::Look { args } => args.execute(robot, &interrupt),
        Commands::Ports { args } => args.execute(robot),
        Commands::Config(cmd) => cmd.execute(robot),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is::<Interrupted>() => {
            eprintln!("Interrupted; all servos released");
            ExitCode::from(130)
        },
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "hexy-cli", "move", "LF/hip=-20", "--mock", "--match", "arduino", "--match-attr",
            "manufacturer", "-vv",
        ])
        .unwrap();

        assert!(cli.robot.mock);
        assert_eq!(cli.robot.needle.as_deref(), Some("arduino"));
        assert_eq!(cli.verbose, 2);
        let Commands::Move { args } = cli.command else {
            panic!("expected move");
        };
        assert_eq!(args.targets.len(), 1);
        assert_eq!(args.hold.hold_ms, 1000);
    }

    #[test]
    fn test_parse_flags_after_move_targets() {
        let cli = Cli::try_parse_from([
            "hexy-cli", "move", "LF/hip=20", "31=-45", "--hold", "500", "--baud", "115200",
        ])
        .unwrap();

        assert_eq!(cli.robot.baud, Some(115_200));
        let Commands::Move { args } = cli.command else {
            panic!("expected move");
        };
        assert_eq!(args.targets.len(), 2);
        assert_eq!(args.targets[1].degrees, -45.0);
        assert_eq!(args.hold.hold_ms, 500);
    }

    #[test]
    fn test_parse_look_with_hold() {
        let cli = Cli::try_parse_from(["hexy-cli", "look", "-30", "--hold", "250"]).unwrap();
        let Commands::Look { args } = cli.command else {
            panic!("expected look");
        };
        assert_eq!(args.angle, -30.0);
        assert_eq!(args.hold.hold_ms, 250);
    }

    #[test]
    fn test_parse_calibrate() {
        let cli =
            Cli::try_parse_from(["hexy-cli", "calibrate", "-i", "in.json", "-o", "out.json"])
                .unwrap();
        let Commands::Calibrate { args } = cli.command else {
            panic!("expected calibrate");
        };
        assert_eq!(args.input_file.as_deref(), Some(std::path::Path::new("in.json")));
        assert_eq!(args.output_file.as_deref(), Some(std::path::Path::new("out.json")));
    }

    #[test]
    fn test_negative_look_angle() {
        let cli = Cli::try_parse_from(["hexy-cli", "look", "-45"]).unwrap();
        let Commands::Look { args } = cli.command else {
            panic!("expected look");
        };
        assert_eq!(args.angle, -45.0);
    }
}
