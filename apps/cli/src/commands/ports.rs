//! 串口列表命令
//!
//! 列出系统串口，并标记端口匹配规则会选中的那一个

use anyhow::{Context, Result};
use clap::Args;
use hexy_serial::{PortEnumerator, PortInfo, PortMatcher, SystemPorts};

use crate::robot::RobotArgs;

/// 串口列表参数
#[derive(Args, Debug)]
pub struct PortsCommand {
    /// 以 JSON 输出
    #[arg(long)]
    pub json: bool,
}

impl PortsCommand {
    pub fn execute(&self, robot: &RobotArgs) -> Result<()> {
        let matcher = robot.load_config()?.port.matcher();
        let ports = SystemPorts.list_ports().context("Failed to list serial ports")?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&ports)?);
            return Ok(());
        }

        if ports.is_empty() {
            println!("No serial ports found");
            return Ok(());
        }
        println!("Matching rule: {}", matcher);
        for line in format_ports(&ports, &matcher) {
            println!("{}", line);
        }
        Ok(())
    }
}

/// 每个端口一行，被选中的端口以 `*` 开头
pub fn format_ports(ports: &[PortInfo], matcher: &PortMatcher) -> Vec<String> {
    let selected = matcher.select(ports).map(|port| port.device.as_str());
    ports
        .iter()
        .map(|port| {
            let marker = if Some(port.device.as_str()) == selected { '*' } else { ' ' };
            let field = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());
            format!(
                "{} {}  product={} manufacturer={} serial={}",
                marker,
                port.device,
                field(&port.product),
                field(&port.manufacturer),
                field(&port.serial_number),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marks_first_match_only() {
        let ports = vec![
            PortInfo::new("/dev/ttyUSB0").with_product("FT232R"),
            PortInfo::new("/dev/ttyACM0").with_product("Servotor32 v2.1"),
            PortInfo::new("/dev/ttyACM1").with_product("servotor32"),
        ];
        let lines = format_ports(&ports, &PortMatcher::default());

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("  /dev/ttyUSB0"));
        assert!(lines[1].starts_with("* /dev/ttyACM0"));
        assert!(lines[1].contains("manufacturer=-"));
        assert!(lines[2].starts_with("  /dev/ttyACM1"));
    }

    #[test]
    fn test_no_match() {
        let ports = vec![PortInfo::new("/dev/ttyS0")];
        let lines = format_ports(&ports, &PortMatcher::default());
        assert!(lines[0].starts_with("  "));
    }
}
