//! 命令定义和实现

pub mod calibrate;
pub mod center;
pub mod config;
pub mod look;
pub mod r#move;
pub mod ports;
pub mod stop;
pub mod wiggle;

pub use calibrate::CalibrateCommand;
pub use center::CenterCommand;
pub use config::ConfigCommand;
pub use look::LookCommand;
pub use r#move::MoveCommand;
pub use ports::PortsCommand;
pub use stop::StopCommand;
pub use wiggle::WiggleCommand;
