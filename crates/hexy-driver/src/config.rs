//! 机器人配置
//!
//! 舵机编号、安装符号、出厂偏移、腿部几何参数都集中在一个不可变的
//! [`HexyConfig`] 中，构造 [`Hexy`](crate::Hexy) 时传入。默认值对应标准
//! Hexy 机器人；也可以从 TOML 文件加载替代配置。
//!
//! ```toml
//! restore_pacing_ms = 50
//!
//! [[legs]]
//! name = "LF"
//! servos = [7, 6, 5]
//! signs = [-1, -1, 1]
//! offsets = [0.0, 1.5, -2.0]
//!
//! # ... 其余五条腿
//!
//! [head]
//! servo = 31
//! sign = -1
//!
//! [port]
//! attribute = "product"
//! needle = "servotor32"
//! baud_rate = 9600
//! fallback_to_mock = false
//! ```

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use hexy_protocol::{DEFAULT_BAUD_RATE, ServoId, Sign};
use hexy_serial::{PortAttribute, PortMatcher};
use serde::{Deserialize, Serialize};

use crate::DriverError;

/// 腿的数量
pub const LEG_COUNT: usize = 6;

/// 腿部标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LegName {
    #[serde(rename = "LF")]
    LeftFront,
    #[serde(rename = "LM")]
    LeftMiddle,
    #[serde(rename = "LR")]
    LeftRear,
    #[serde(rename = "RF")]
    RightFront,
    #[serde(rename = "RM")]
    RightMiddle,
    #[serde(rename = "RR")]
    RightRear,
}

impl LegName {
    /// 标准顺序：左前、左中、左后、右前、右中、右后
    pub const ALL: [LegName; LEG_COUNT] = [
        LegName::LeftFront,
        LegName::LeftMiddle,
        LegName::LeftRear,
        LegName::RightFront,
        LegName::RightMiddle,
        LegName::RightRear,
    ];

    pub fn code(self) -> &'static str {
        match self {
            LegName::LeftFront => "LF",
            LegName::LeftMiddle => "LM",
            LegName::LeftRear => "LR",
            LegName::RightFront => "RF",
            LegName::RightMiddle => "RM",
            LegName::RightRear => "RR",
        }
    }
}

impl fmt::Display for LegName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for LegName {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LegName::ALL
            .into_iter()
            .find(|name| name.code().eq_ignore_ascii_case(s))
            .ok_or_else(|| DriverError::InvalidConfig(format!("unknown leg name: {}", s)))
    }
}

/// 腿部关节，顺序固定为 hip → thigh → knee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Joint {
    Hip,
    Thigh,
    Knee,
}

impl Joint {
    pub const ALL: [Joint; 3] = [Joint::Hip, Joint::Thigh, Joint::Knee];

    pub fn index(self) -> usize {
        match self {
            Joint::Hip => 0,
            Joint::Thigh => 1,
            Joint::Knee => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Joint::Hip => "hip",
            Joint::Thigh => "thigh",
            Joint::Knee => "knee",
        }
    }
}

impl fmt::Display for Joint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Joint {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Joint::ALL
            .into_iter()
            .find(|joint| joint.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| DriverError::InvalidConfig(format!("unknown joint: {}", s)))
    }
}

/// 腿部几何参数（仅供运动学使用）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegGeometry {
    /// hip / thigh / knee 段长（mm）
    pub segment_lengths: [f64; 3],
    /// 髋关节相对机身中心的坐标（mm）
    pub origin: [f64; 3],
    /// 机身中心到髋关节的方向角（度）
    pub mounting_angle: f64,
}

impl Default for LegGeometry {
    fn default() -> Self {
        Self {
            segment_lengths: [26.0, 49.0, 52.0],
            origin: [0.0, 0.0, 0.0],
            mounting_angle: 0.0,
        }
    }
}

/// 单条腿的配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegConfig {
    pub name: LegName,
    /// hip / thigh / knee 舵机编号
    pub servos: [ServoId; 3],
    pub signs: [Sign; 3],
    #[serde(default)]
    pub offsets: [f64; 3],
    /// 初始“最后指令角度”，未设置时相对运动以 0 为基准
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_angles: Option<[f64; 3]>,
    #[serde(default)]
    pub geometry: LegGeometry,
}

impl LegConfig {
    fn stock(name: LegName, servos: [ServoId; 3], signs: [i8; 3]) -> Self {
        Self {
            name,
            servos,
            signs: signs.map(stock_sign),
            offsets: [0.0; 3],
            start_angles: None,
            geometry: LegGeometry::default(),
        }
    }
}

/// 头部配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadConfig {
    pub servo: ServoId,
    /// 默认 -1：正角度向右看
    pub sign: Sign,
    #[serde(default)]
    pub offset: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_angle: Option<f64>,
}

impl Default for HeadConfig {
    fn default() -> Self {
        Self {
            servo: const { ServoId::new_const(31) },
            sign: Sign::Negative,
            offset: 0.0,
            start_angle: None,
        }
    }
}

/// 端口发现配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortConfig {
    pub attribute: PortAttribute,
    pub needle: String,
    pub baud_rate: u32,
    /// 找不到设备时回退到 mock 传输
    pub fallback_to_mock: bool,
}

impl PortConfig {
    pub fn matcher(&self) -> PortMatcher {
        PortMatcher::new(self.attribute, self.needle.clone())
    }
}

impl Default for PortConfig {
    fn default() -> Self {
        let matcher = PortMatcher::default();
        Self {
            attribute: matcher.attribute,
            needle: matcher.needle,
            baud_rate: DEFAULT_BAUD_RATE,
            fallback_to_mock: false,
        }
    }
}

/// 整机配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HexyConfig {
    /// 批量恢复位置时每条腿之间的间隔（ms）
    #[serde(default = "default_pacing_ms")]
    pub restore_pacing_ms: u64,
    pub legs: Vec<LegConfig>,
    #[serde(default)]
    pub head: HeadConfig,
    #[serde(default)]
    pub port: PortConfig,
}

fn default_pacing_ms() -> u64 {
    50
}

impl Default for HexyConfig {
    /// 标准 Hexy：左侧 hip/thigh 反向安装，右侧只有 thigh 反向
    fn default() -> Self {
        Self {
            restore_pacing_ms: default_pacing_ms(),
            legs: vec![
                LegConfig::stock(LegName::LeftFront, const { stock_ids([7, 6, 5]) }, [-1, -1, 1]),
                LegConfig::stock(LegName::LeftMiddle, const { stock_ids([11, 10, 9]) }, [-1, -1, 1]),
                LegConfig::stock(LegName::LeftRear, const { stock_ids([15, 14, 13]) }, [-1, -1, 1]),
                LegConfig::stock(LegName::RightFront, const { stock_ids([24, 25, 26]) }, [1, -1, 1]),
                LegConfig::stock(LegName::RightMiddle, const { stock_ids([20, 21, 22]) }, [1, -1, 1]),
                LegConfig::stock(LegName::RightRear, const { stock_ids([16, 17, 18]) }, [1, -1, 1]),
            ],
            head: HeadConfig::default(),
            port: PortConfig::default(),
        }
    }
}

impl HexyConfig {
    /// 从 TOML 字符串解析并校验
    pub fn from_toml_str(content: &str) -> Result<Self, DriverError> {
        let config: HexyConfig =
            toml::from_str(content).map_err(|e| DriverError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 从 TOML 文件加载并校验
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, DriverError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String, DriverError> {
        toml::to_string_pretty(self).map_err(|e| DriverError::InvalidConfig(e.to_string()))
    }

    /// 校验：恰好六条不同名的腿，所有舵机编号全局唯一
    pub fn validate(&self) -> Result<(), DriverError> {
        if self.legs.len() != LEG_COUNT {
            return Err(DriverError::InvalidConfig(format!(
                "expected {} legs, got {}",
                LEG_COUNT,
                self.legs.len()
            )));
        }

        let mut names = HashSet::new();
        for leg in &self.legs {
            if !names.insert(leg.name) {
                return Err(DriverError::InvalidConfig(format!("duplicate leg: {}", leg.name)));
            }
        }

        let mut ids = HashSet::new();
        let all_ids = self.legs.iter().flat_map(|leg| leg.servos).chain([self.head.servo]);
        for id in all_ids {
            if !ids.insert(id) {
                return Err(DriverError::InvalidConfig(format!("duplicate servo id: {}", id)));
            }
        }

        for leg in &self.legs {
            let lengths = leg.geometry.segment_lengths;
            if lengths.iter().any(|l| !l.is_finite() || *l <= 0.0) {
                return Err(DriverError::InvalidConfig(format!(
                    "leg {} has invalid segment lengths {:?}",
                    leg.name, lengths
                )));
            }
        }

        Ok(())
    }

    pub fn leg(&self, name: LegName) -> Option<&LegConfig> {
        self.legs.iter().find(|leg| leg.name == name)
    }
}

const fn stock_ids(ids: [u8; 3]) -> [ServoId; 3] {
    [
        ServoId::new_const(ids[0]),
        ServoId::new_const(ids[1]),
        ServoId::new_const(ids[2]),
    ]
}

fn stock_sign(sign: i8) -> Sign {
    if sign < 0 { Sign::Negative } else { Sign::Positive }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = HexyConfig::default();
        config.validate().unwrap();
        assert_eq!(config.legs.len(), 6);
        assert_eq!(config.head.servo.get(), 31);
        assert_eq!(config.port.baud_rate, 9600);
        assert_eq!(config.port.needle, "servotor32");
        assert_eq!(config.restore_pacing_ms, 50);
    }

    #[test]
    fn test_default_signs() {
        let config = HexyConfig::default();
        let lf = config.leg(LegName::LeftFront).unwrap();
        assert_eq!(lf.signs, [Sign::Negative, Sign::Negative, Sign::Positive]);
        let rr = config.leg(LegName::RightRear).unwrap();
        assert_eq!(rr.signs, [Sign::Positive, Sign::Negative, Sign::Positive]);
        assert_eq!(rr.servos.map(ServoId::get), [16, 17, 18]);
    }

    #[test]
    fn test_duplicate_servo_rejected() {
        let mut config = HexyConfig::default();
        config.head.servo = ServoId::new(7).unwrap();
        let err = config.validate().unwrap_err();
        assert!(format!("{}", err).contains("duplicate servo id: 7"));
    }

    #[test]
    fn test_wrong_leg_count_rejected() {
        let mut config = HexyConfig::default();
        config.legs.pop();
        assert!(matches!(config.validate(), Err(DriverError::InvalidConfig(_))));
    }

    #[test]
    fn test_duplicate_leg_rejected() {
        let mut config = HexyConfig::default();
        config.legs[5].name = LegName::LeftFront;
        let err = config.validate().unwrap_err();
        assert!(format!("{}", err).contains("duplicate leg: LF"));
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = HexyConfig::default();
        config.legs[0].offsets = [1.5, -2.0, 0.25];
        config.legs[0].start_angles = Some([0.0, -45.0, -45.0]);
        config.port.fallback_to_mock = true;

        let text = config.to_toml_string().unwrap();
        let parsed = HexyConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_toml_minimal_uses_defaults() {
        let mut text = String::new();
        for leg in HexyConfig::default().legs {
            let servos = leg.servos.map(ServoId::get);
            let signs = leg.signs.map(i8::from);
            text.push_str(&format!(
                "[[legs]]\nname = \"{}\"\nservos = {:?}\nsigns = {:?}\n\n",
                leg.name, servos, signs
            ));
        }
        let config = HexyConfig::from_toml_str(&text).unwrap();
        assert_eq!(config, HexyConfig::default());
    }

    #[test]
    fn test_toml_rejects_out_of_range_id() {
        let text = HexyConfig::default().to_toml_string().unwrap().replace("31", "32");
        assert!(HexyConfig::from_toml_str(&text).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hexy.toml");
        std::fs::write(&path, HexyConfig::default().to_toml_string().unwrap()).unwrap();

        let config = HexyConfig::load_from_file(&path).unwrap();
        assert_eq!(config, HexyConfig::default());

        let missing = HexyConfig::load_from_file(dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(DriverError::Io(_))));
    }

    #[test]
    fn test_names_parse() {
        assert_eq!("rm".parse::<LegName>().unwrap(), LegName::RightMiddle);
        assert_eq!("Knee".parse::<Joint>().unwrap(), Joint::Knee);
        assert!("XX".parse::<LegName>().is_err());
    }
}
