//! 配置管理命令
//!
//! 输出或生成机器人配置文件（TOML）

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use hexy_driver::HexyConfig;

use crate::robot::RobotArgs;

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 打印生效的配置（配置文件 + 命令行参数）
    Show,

    /// 写出出厂配置，作为自定义配置的起点
    Init {
        /// 输出路径
        path: PathBuf,

        /// 覆盖已存在的文件
        #[arg(long)]
        force: bool,
    },

    /// 检查配置文件
    Check,
}

impl ConfigCommand {
    pub fn execute(&self, robot: &RobotArgs) -> Result<()> {
        match self {
            ConfigCommand::Show => {
                let config = robot.load_config()?;
                print!("{}", config.to_toml_string()?);
            },

            ConfigCommand::Init { path, force } => {
                if path.exists() && !force {
                    bail!("{} already exists (use --force to overwrite)", path.display());
                }
                fs::write(path, HexyConfig::default().to_toml_string()?)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!("✅ Wrote stock config to {}", path.display());
            },

            ConfigCommand::Check => {
                let config = robot.load_config()?;
                config.validate()?;
                println!("✅ Config OK ({} legs, head servo #{})", config.legs.len(), config.head.servo);
            },
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_then_check() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hexy.toml");

        let init = ConfigCommand::Init {
            path: path.clone(),
            force: false,
        };
        init.execute(&RobotArgs::default()).unwrap();
        assert!(init.execute(&RobotArgs::default()).is_err());

        let robot = RobotArgs {
            config: Some(path),
            ..Default::default()
        };
        ConfigCommand::Check.execute(&robot).unwrap();
    }

    #[test]
    fn test_check_rejects_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hexy.toml");
        let text = HexyConfig::default().to_toml_string().unwrap().replace("= 31", "= 7");
        fs::write(&path, text).unwrap();

        let robot = RobotArgs {
            config: Some(path),
            ..Default::default()
        };
        assert!(ConfigCommand::Check.execute(&robot).is_err());
    }
}
