//! 腿部运动学接口（未实现）
//!
//! 正解（关节角 → 足端位置）与逆解（足端位置 → 关节角）的挂载点。
//! 两个函数目前都返回 [`DriverError::Unsupported`]，调用方不会把占位结果
//! 误当成真实计算。

use crate::DriverError;
use crate::config::LegGeometry;

/// 单腿关节角（度）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JointAngles {
    pub hip: f64,
    pub thigh: f64,
    pub knee: f64,
}

/// 足端坐标（mm，相对机身中心）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FootPosition {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// 正运动学
pub fn foot_location(
    _geometry: &LegGeometry,
    _joints: JointAngles,
) -> Result<FootPosition, DriverError> {
    Err(DriverError::Unsupported("foot_location"))
}

/// 逆运动学
///
/// 实现时：不可达的目标点应返回最接近的可达姿态，而不是报错。
pub fn joint_angles(
    _geometry: &LegGeometry,
    _foot: FootPosition,
) -> Result<JointAngles, DriverError> {
    Err(DriverError::Unsupported("joint_angles"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_are_unsupported() {
        let geometry = LegGeometry::default();
        assert!(matches!(
            foot_location(&geometry, JointAngles::default()),
            Err(DriverError::Unsupported("foot_location"))
        ));
        assert!(matches!(
            joint_angles(&geometry, FootPosition::default()),
            Err(DriverError::Unsupported("joint_angles"))
        ));
    }
}
