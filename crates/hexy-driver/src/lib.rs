//! 驱动层模块
//!
//! 本模块提供 Hexy 六足机器人的舵机命令核心，包括：
//! - 机身模型（6 条腿 × 3 关节 + 头部，共 19 个舵机）
//! - 标定（每个舵机的偏移与方向符号）与最后指令角度
//! - 连接生命周期（端口发现、打开/关闭、重置）
//! - 整机命令（Center、Kill、恢复姿态）
//!
//! # 使用场景
//!
//! ```no_run
//! use hexy_driver::{Hexy, HexyConfig, LegName, Joint};
//!
//! # fn main() -> Result<(), hexy_driver::DriverError> {
//! let mut hexy = Hexy::from_config(&HexyConfig::default())?;
//! hexy.session(|hexy| {
//!     hexy.head_mut().look(30.0)?;
//!     if let Some(mut leg) = hexy.leg_mut(LegName::LeftFront) {
//!         leg.joint(Joint::Thigh).set_absolute_position(-20.0)?;
//!     }
//!     Ok::<_, hexy_driver::DriverError>(())
//! })
//! # }
//! ```

mod config;
mod connection;
mod error;
mod hexy;
pub mod kinematics;
mod leg;
mod servo;

pub use config::{
    HeadConfig, HexyConfig, Joint, LEG_COUNT, LegConfig, LegGeometry, LegName, PortConfig,
};
pub use connection::{Connection, ConnectionState};
pub use error::DriverError;
pub use hexy::{HEAD_SERVO_NAME, HeadHandle, Hexy, LegHandle, ServoHandle};
pub use kinematics::{FootPosition, JointAngles};
pub use leg::{Head, Leg};
pub use servo::Servo;

pub use hexy_protocol::{ServoId, Sign};
