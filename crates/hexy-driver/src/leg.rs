//! 腿与头部
//!
//! 固定数量的舵机分组。聚合操作按 hip → thigh → knee 顺序逐个执行，
//! 舵机之间没有同步；任一舵机失败立即返回，后续舵机不再发送。

use crate::config::{HeadConfig, Joint, LegConfig, LegGeometry, LegName};
use crate::kinematics::{self, FootPosition, JointAngles};
use crate::{Connection, DriverError, Servo};

#[derive(Debug, Clone, PartialEq)]
pub struct Leg {
    name: LegName,
    servos: [Servo; 3],
    geometry: LegGeometry,
}

impl Leg {
    pub fn from_config(config: &LegConfig) -> Self {
        let start = config.start_angles.map(|angles| angles.map(Some)).unwrap_or([None; 3]);
        let servos = Joint::ALL.map(|joint| {
            let i = joint.index();
            Servo::new(config.servos[i], config.offsets[i], config.signs[i])
                .with_start_angle(start[i])
        });
        Self {
            name: config.name,
            servos,
            geometry: config.geometry.clone(),
        }
    }

    pub fn name(&self) -> LegName {
        self.name
    }

    pub fn geometry(&self) -> &LegGeometry {
        &self.geometry
    }

    pub fn servo(&self, joint: Joint) -> &Servo {
        &self.servos[joint.index()]
    }

    pub fn servo_mut(&mut self, joint: Joint) -> &mut Servo {
        &mut self.servos[joint.index()]
    }

    /// hip / thigh / knee 顺序
    pub fn servos(&self) -> &[Servo; 3] {
        &self.servos
    }

    pub fn servos_mut(&mut self) -> &mut [Servo; 3] {
        &mut self.servos
    }

    /// 全部卸力
    pub fn stop(&self, link: &mut Connection) -> Result<(), DriverError> {
        self.servos.iter().try_for_each(|servo| servo.stop(link))
    }

    /// 重新发送三个关节的最后指令角度
    pub fn restore_last_position(&mut self, link: &mut Connection) -> Result<(), DriverError> {
        self.servos
            .iter_mut()
            .try_for_each(|servo| servo.restore_last_position(link))
    }

    /// 最后指令角度（未设置按 0 计）
    pub fn joint_angles(&self) -> JointAngles {
        let angle = |joint: Joint| self.servo(joint).last_commanded_angle().unwrap_or(0.0);
        JointAngles {
            hip: angle(Joint::Hip),
            thigh: angle(Joint::Thigh),
            knee: angle(Joint::Knee),
        }
    }

    /// 足端位置（运动学尚未实现）
    pub fn foot_location(&self) -> Result<FootPosition, DriverError> {
        kinematics::foot_location(&self.geometry, self.joint_angles())
    }

    /// 到达足端位置所需的关节角（运动学尚未实现）
    pub fn joint_angles_for(&self, foot: FootPosition) -> Result<JointAngles, DriverError> {
        kinematics::joint_angles(&self.geometry, foot)
    }
}

/// 头部：单个舵机
#[derive(Debug, Clone, PartialEq)]
pub struct Head {
    servo: Servo,
}

impl Head {
    pub fn from_config(config: &HeadConfig) -> Self {
        Self {
            servo: Servo::new(config.servo, config.offset, config.sign)
                .with_start_angle(config.start_angle),
        }
    }

    pub fn servo(&self) -> &Servo {
        &self.servo
    }

    pub fn servo_mut(&mut self) -> &mut Servo {
        &mut self.servo
    }

    /// 看向绝对角度：-90 最左，+90 最右
    pub fn look(&mut self, link: &mut Connection, degrees: f64) -> Result<(), DriverError> {
        self.servo.set_absolute_position(link, degrees)
    }

    /// 相对当前朝向转动
    pub fn turn(&mut self, link: &mut Connection, degrees: f64) -> Result<(), DriverError> {
        self.servo.set_relative_position(link, degrees)
    }

    pub fn stop(&self, link: &mut Connection) -> Result<(), DriverError> {
        self.servo.stop(link)
    }

    pub fn restore_last_position(&mut self, link: &mut Connection) -> Result<(), DriverError> {
        self.servo.restore_last_position(link)
    }
}
