//! 端口发现
//!
//! 枚举系统串口，按属性子串（大小写不敏感）选出第一个匹配的端口。
//! 找不到时可以回退到 [`MockTransport`]，使上层在没有硬件时也能运行。

use std::fmt;

use tracing::{info, warn};

use crate::{MockTransport, SerialPortTransport, Transport, TransportError};

/// 枚举到的串口描述
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PortInfo {
    /// 设备路径（如 `/dev/ttyACM0`、`COM3`）
    pub device: String,
    pub product: Option<String>,
    pub manufacturer: Option<String>,
    pub serial_number: Option<String>,
    pub description: Option<String>,
}

impl PortInfo {
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            ..Default::default()
        }
    }

    pub fn with_product(mut self, product: impl Into<String>) -> Self {
        self.product = Some(product.into());
        self
    }

    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    /// 读取指定属性
    pub fn attribute(&self, attribute: PortAttribute) -> Option<&str> {
        match attribute {
            PortAttribute::Device => Some(self.device.as_str()),
            PortAttribute::Product => self.product.as_deref(),
            PortAttribute::Manufacturer => self.manufacturer.as_deref(),
            PortAttribute::SerialNumber => self.serial_number.as_deref(),
            PortAttribute::Description => self.description.as_deref(),
        }
    }
}

/// 用于匹配的端口属性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum PortAttribute {
    Device,
    #[default]
    Product,
    Manufacturer,
    SerialNumber,
    Description,
}

impl fmt::Display for PortAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PortAttribute::Device => "device",
            PortAttribute::Product => "product",
            PortAttribute::Manufacturer => "manufacturer",
            PortAttribute::SerialNumber => "serial_number",
            PortAttribute::Description => "description",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for PortAttribute {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "device" => Ok(PortAttribute::Device),
            "product" => Ok(PortAttribute::Product),
            "manufacturer" => Ok(PortAttribute::Manufacturer),
            "serial_number" | "serial" => Ok(PortAttribute::SerialNumber),
            "description" => Ok(PortAttribute::Description),
            other => Err(format!("unknown port attribute: {}", other)),
        }
    }
}

/// 端口匹配谓词：`attribute` 包含 `needle`（大小写不敏感）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortMatcher {
    pub attribute: PortAttribute,
    pub needle: String,
}

impl PortMatcher {
    pub fn new(attribute: PortAttribute, needle: impl Into<String>) -> Self {
        Self {
            attribute,
            needle: needle.into(),
        }
    }

    pub fn matches(&self, port: &PortInfo) -> bool {
        let needle = self.needle.to_lowercase();
        port.attribute(self.attribute)
            .is_some_and(|value| value.to_lowercase().contains(&needle))
    }

    /// 选出第一个匹配的端口
    pub fn select<'a>(&self, ports: &'a [PortInfo]) -> Option<&'a PortInfo> {
        ports.iter().find(|port| self.matches(port))
    }
}

impl Default for PortMatcher {
    fn default() -> Self {
        Self::new(PortAttribute::Product, "servotor32")
    }
}

impl fmt::Display for PortMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} contains {:?}", self.attribute, self.needle)
    }
}

/// 串口枚举器
pub trait PortEnumerator: Send {
    fn list_ports(&self) -> Result<Vec<PortInfo>, TransportError>;
}

/// 系统串口枚举（`serialport::available_ports`）
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPorts;

impl PortEnumerator for SystemPorts {
    fn list_ports(&self) -> Result<Vec<PortInfo>, TransportError> {
        let ports = serialport::available_ports()
            .map_err(|e| TransportError::Enumeration(e.to_string()))?;

        Ok(ports
            .into_iter()
            .map(|p| match p.port_type {
                serialport::SerialPortType::UsbPort(usb) => PortInfo {
                    description: usb.product.clone(),
                    device: p.port_name,
                    product: usb.product,
                    manufacturer: usb.manufacturer,
                    serial_number: usb.serial_number,
                },
                serialport::SerialPortType::PciPort => PortInfo {
                    description: Some("PCI".to_string()),
                    ..PortInfo::new(p.port_name)
                },
                serialport::SerialPortType::BluetoothPort => PortInfo {
                    description: Some("Bluetooth".to_string()),
                    ..PortInfo::new(p.port_name)
                },
                serialport::SerialPortType::Unknown => PortInfo::new(p.port_name),
            })
            .collect())
    }
}

/// 传输解析器：为连接找到一个可用的传输
pub trait TransportResolver: Send {
    /// 返回 `Ok(None)` 表示没有可用传输
    fn resolve(&mut self) -> Result<Option<Box<dyn Transport>>, TransportError>;

    /// 描述正在寻找的目标（错误信息用）
    fn target(&self) -> String;
}

/// 基于端口枚举 + 匹配谓词的解析器
pub struct PortDiscovery {
    enumerator: Box<dyn PortEnumerator>,
    matcher: PortMatcher,
    baud_rate: u32,
    fallback_to_mock: bool,
}

impl PortDiscovery {
    pub fn new(enumerator: Box<dyn PortEnumerator>, matcher: PortMatcher, baud_rate: u32) -> Self {
        Self {
            enumerator,
            matcher,
            baud_rate,
            fallback_to_mock: false,
        }
    }

    /// 使用系统串口枚举
    pub fn system(matcher: PortMatcher, baud_rate: u32) -> Self {
        Self::new(Box::new(SystemPorts), matcher, baud_rate)
    }

    /// 找不到端口时回退到 mock 传输
    pub fn fallback_to_mock(mut self, enabled: bool) -> Self {
        self.fallback_to_mock = enabled;
        self
    }

    pub fn matcher(&self) -> &PortMatcher {
        &self.matcher
    }

    /// 仅做端口选择，不创建传输
    pub fn find_port(&self) -> Result<Option<PortInfo>, TransportError> {
        let ports = self.enumerator.list_ports()?;
        Ok(self.matcher.select(&ports).cloned())
    }
}

impl TransportResolver for PortDiscovery {
    fn resolve(&mut self) -> Result<Option<Box<dyn Transport>>, TransportError> {
        let found = match self.find_port() {
            Ok(found) => found,
            Err(e) if self.fallback_to_mock => {
                warn!("Port enumeration failed ({}), treating as no ports", e);
                None
            },
            Err(e) => return Err(e),
        };

        if let Some(port) = found {
            info!("Found servo controller at {} ({})", port.device, self.matcher);
            return Ok(Some(Box::new(SerialPortTransport::new(port.device, self.baud_rate))));
        }

        if self.fallback_to_mock {
            warn!("No port matching {}, falling back to mock transport", self.matcher);
            return Ok(Some(Box::new(MockTransport::new())));
        }

        Ok(None)
    }

    fn target(&self) -> String {
        format!("serial port where {}", self.matcher)
    }
}
