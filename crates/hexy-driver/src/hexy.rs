//! 整机（Hexy）
//!
//! 持有六条腿、头部和唯一的 [`Connection`]。腿/头/舵机的运动通过借用句柄
//! （[`LegHandle`]、[`HeadHandle`]、[`ServoHandle`]）完成，句柄同时借用
//! 舵机状态和连接，因此编译器保证同一时刻只有一个写入者。
//!
//! # 线程安全
//!
//! 所有运动方法都需要 `&mut self`。如果要在多个线程间共享同一台机器人，
//! 必须在外部串行化（例如 `Mutex<Hexy>`，或由单个线程持有 `Hexy` 并通过
//! 命令队列接收请求）。

use std::collections::{BTreeMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use hexy_protocol::{CENTER_LINE, KILL_LINE, ServoId};
use hexy_serial::{PortDiscovery, TransportResolver};
use tracing::{debug, info, warn};

use crate::config::{HexyConfig, Joint, LegName};
use crate::connection::{Connection, ConnectionState};
use crate::kinematics::FootPosition;
use crate::leg::{Head, Leg};
use crate::{DriverError, Servo};

/// 头部舵机在标定顺序中的名字
pub const HEAD_SERVO_NAME: &str = "Head";

pub struct Hexy {
    legs: Vec<Leg>,
    head: Head,
    link: Connection,
    pacing: Duration,
}

impl Hexy {
    /// 使用指定的传输解析器创建（不连接）
    pub fn new(
        config: &HexyConfig,
        resolver: Box<dyn TransportResolver>,
    ) -> Result<Self, DriverError> {
        config.validate()?;
        Ok(Self {
            legs: config.legs.iter().map(Leg::from_config).collect(),
            head: Head::from_config(&config.head),
            link: Connection::new(resolver),
            pacing: Duration::from_millis(config.restore_pacing_ms),
        })
    }

    /// 使用系统串口发现创建（不连接）
    pub fn from_config(config: &HexyConfig) -> Result<Self, DriverError> {
        let discovery = PortDiscovery::system(config.port.matcher(), config.port.baud_rate)
            .fallback_to_mock(config.port.fallback_to_mock);
        Self::new(config, Box::new(discovery))
    }

    // ==================== 连接管理 ====================

    /// 连接（幂等）；已解析的传输不会重新发现
    pub fn connect(&mut self) -> Result<(), DriverError> {
        self.link.connect()
    }

    /// 断开（幂等）
    pub fn disconnect(&mut self) {
        self.link.disconnect()
    }

    pub fn reconnect(&mut self) -> Result<(), DriverError> {
        self.link.reconnect()
    }

    /// 丢弃已解析的传输并重新做端口发现
    pub fn reset_connection(&mut self) -> Result<(), DriverError> {
        self.link.reset()
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_open()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.link.state()
    }

    /// 当前传输的描述
    pub fn transport_description(&self) -> Option<String> {
        self.link.describe()
    }

    /// 阻塞休眠；mock 传输下跳过
    pub fn sleep(&self, duration: Duration) {
        self.link.sleep(duration)
    }

    // ==================== 整机命令 ====================

    /// 全部舵机回到 1500（忽略标定）
    pub fn center(&mut self) -> Result<(), DriverError> {
        self.link.send(CENTER_LINE)
    }

    /// 全部舵机卸力（急停）
    pub fn stop(&mut self) -> Result<(), DriverError> {
        self.link.send(KILL_LINE)
    }

    /// 按腿 → 头的顺序重新发送最后指令角度，每组之间间隔 `restore_pacing_ms`
    pub fn restore_last_position(&mut self) -> Result<(), DriverError> {
        if !self.link.is_open() {
            return Err(DriverError::NotConnected);
        }
        for leg in &mut self.legs {
            leg.restore_last_position(&mut self.link)?;
            self.link.sleep(self.pacing);
        }
        self.head.restore_last_position(&mut self.link)?;
        self.link.sleep(self.pacing);
        Ok(())
    }

    /// 连接、执行 `f`，无论成功、出错还是 panic 都先卸力再断开
    pub fn session<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        E: From<DriverError>,
        F: FnOnce(&mut Hexy) -> Result<T, E>,
    {
        self.connect()?;

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| f(&mut *self)));
        let released = self.release();
        self.disconnect();

        let result = match outcome {
            Ok(result) => result,
            Err(payload) => panic::resume_unwind(payload),
        };

        match (result, released) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(e.into()),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(release_err)) => {
                warn!("Failed to release servos: {}", release_err);
                Err(e)
            },
        }
    }

    /// 仍连接时发送 Kill
    fn release(&mut self) -> Result<(), DriverError> {
        if self.link.is_open() {
            info!("Releasing all servos");
            self.stop()
        } else {
            Ok(())
        }
    }

    // ==================== 标定 ====================

    /// 按舵机编号（字符串键）批量加载偏移，未出现的舵机保持不变
    ///
    /// 返回被更新的舵机数量。
    pub fn load_offsets(&mut self, offsets: &BTreeMap<String, f64>) -> usize {
        let mut known = HashSet::new();
        let mut updated = 0;
        for servo in self.servos_mut() {
            let key = servo.id().to_string();
            if let Some(&offset) = offsets.get(&key) {
                debug!("Servo {} offset {} -> {}", key, servo.offset(), offset);
                servo.set_offset(offset);
                updated += 1;
            }
            known.insert(key);
        }
        for key in offsets.keys().filter(|key| !known.contains(*key)) {
            warn!("Ignoring offset for unknown servo {:?}", key);
        }
        updated
    }

    /// 所有舵机当前偏移
    pub fn offsets(&self) -> BTreeMap<ServoId, f64> {
        self.servos().map(|servo| (servo.id(), servo.offset())).collect()
    }

    // ==================== 访问 ====================

    /// 所有舵机：各腿（hip/thigh/knee）之后是头部
    pub fn servos(&self) -> impl Iterator<Item = &Servo> {
        self.legs
            .iter()
            .flat_map(|leg| leg.servos().iter())
            .chain(std::iter::once(self.head.servo()))
    }

    fn servos_mut(&mut self) -> impl Iterator<Item = &mut Servo> {
        self.legs
            .iter_mut()
            .flat_map(|leg| leg.servos_mut().iter_mut())
            .chain(std::iter::once(self.head.servo_mut()))
    }

    pub fn legs(&self) -> &[Leg] {
        &self.legs
    }

    pub fn leg(&self, name: LegName) -> Option<&Leg> {
        self.legs.iter().find(|leg| leg.name() == name)
    }

    pub fn leg_mut(&mut self, name: LegName) -> Option<LegHandle<'_>> {
        let leg = self.legs.iter_mut().find(|leg| leg.name() == name)?;
        Some(LegHandle {
            leg,
            link: &mut self.link,
        })
    }

    pub fn head(&self) -> &Head {
        &self.head
    }

    pub fn head_mut(&mut self) -> HeadHandle<'_> {
        HeadHandle {
            head: &mut self.head,
            link: &mut self.link,
        }
    }

    pub fn servo(&self, id: ServoId) -> Option<&Servo> {
        self.servos().find(|servo| servo.id() == id)
    }

    pub fn servo_mut(&mut self, id: ServoId) -> Result<ServoHandle<'_>, DriverError> {
        let Self { legs, head, link, .. } = self;
        let servo = legs
            .iter_mut()
            .flat_map(|leg| leg.servos_mut().iter_mut())
            .chain(std::iter::once(head.servo_mut()))
            .find(|servo| servo.id() == id)
            .ok_or(DriverError::UnknownServo(id))?;
        Ok(ServoHandle { servo, link })
    }

    /// 标定顺序的舵机名：`Head`，然后每条腿的 `LF/hip`、`LF/thigh`、`LF/knee` …
    pub fn servo_names(&self) -> Vec<String> {
        std::iter::once(HEAD_SERVO_NAME.to_string())
            .chain(self.legs.iter().flat_map(|leg| {
                Joint::ALL.map(|joint| format!("{}/{}", leg.name(), joint))
            }))
            .collect()
    }

    /// 按名字（`Head` 或 `LF/hip` 形式，大小写不敏感）查找舵机
    pub fn servo_by_name(&mut self, name: &str) -> Option<ServoHandle<'_>> {
        let Self { legs, head, link, .. } = self;
        if name.eq_ignore_ascii_case(HEAD_SERVO_NAME) {
            return Some(ServoHandle {
                servo: head.servo_mut(),
                link,
            });
        }
        let (leg_name, joint) = name.split_once('/')?;
        let leg_name: LegName = leg_name.parse().ok()?;
        let joint: Joint = joint.parse().ok()?;
        let leg = legs.iter_mut().find(|leg| leg.name() == leg_name)?;
        Some(ServoHandle {
            servo: leg.servo_mut(joint),
            link,
        })
    }
}

impl std::fmt::Debug for Hexy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hexy")
            .field("legs", &self.legs.iter().map(Leg::name).collect::<Vec<_>>())
            .field("connection", &self.link)
            .finish()
    }
}

// ==================== 借用句柄 ====================

/// 单个舵机 + 连接
pub struct ServoHandle<'a> {
    servo: &'a mut Servo,
    link: &'a mut Connection,
}

impl ServoHandle<'_> {
    pub fn id(&self) -> ServoId {
        self.servo.id()
    }

    pub fn offset(&self) -> f64 {
        self.servo.offset()
    }

    pub fn set_offset(&mut self, offset: f64) {
        self.servo.set_offset(offset)
    }

    pub fn last_commanded_angle(&self) -> Option<f64> {
        self.servo.last_commanded_angle()
    }

    pub fn set_absolute_position(&mut self, degrees: f64) -> Result<(), DriverError> {
        self.servo.set_absolute_position(self.link, degrees)
    }

    pub fn set_relative_position(&mut self, delta_degrees: f64) -> Result<(), DriverError> {
        self.servo.set_relative_position(self.link, delta_degrees)
    }

    pub fn restore_last_position(&mut self) -> Result<(), DriverError> {
        self.servo.restore_last_position(self.link)
    }

    pub fn stop(&mut self) -> Result<(), DriverError> {
        self.servo.stop(self.link)
    }

    pub fn center(&mut self) -> Result<(), DriverError> {
        self.servo.center(self.link)
    }

    /// 阻塞休眠；mock 传输下跳过
    pub fn pause(&self, duration: Duration) {
        self.link.sleep(duration)
    }
}

/// 单条腿 + 连接
pub struct LegHandle<'a> {
    leg: &'a mut Leg,
    link: &'a mut Connection,
}

impl LegHandle<'_> {
    pub fn name(&self) -> LegName {
        self.leg.name()
    }

    pub fn joint(&mut self, joint: Joint) -> ServoHandle<'_> {
        ServoHandle {
            servo: self.leg.servo_mut(joint),
            link: &mut *self.link,
        }
    }

    pub fn stop(&mut self) -> Result<(), DriverError> {
        self.leg.stop(self.link)
    }

    pub fn restore_last_position(&mut self) -> Result<(), DriverError> {
        self.leg.restore_last_position(self.link)
    }

    pub fn foot_location(&self) -> Result<FootPosition, DriverError> {
        self.leg.foot_location()
    }
}

/// 头部 + 连接
pub struct HeadHandle<'a> {
    head: &'a mut Head,
    link: &'a mut Connection,
}

impl HeadHandle<'_> {
    pub fn look(&mut self, degrees: f64) -> Result<(), DriverError> {
        self.head.look(self.link, degrees)
    }

    pub fn turn(&mut self, degrees: f64) -> Result<(), DriverError> {
        self.head.turn(self.link, degrees)
    }

    pub fn stop(&mut self) -> Result<(), DriverError> {
        self.head.stop(self.link)
    }

    pub fn restore_last_position(&mut self) -> Result<(), DriverError> {
        self.head.restore_last_position(self.link)
    }

    pub fn servo(&mut self) -> ServoHandle<'_> {
        ServoHandle {
            servo: self.head.servo_mut(),
            link: &mut *self.link,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexy_serial::{MockLog, MockResolver};

    fn hexy() -> (Hexy, MockResolver) {
        let resolver = MockResolver::new();
        let hexy = Hexy::new(&HexyConfig::default(), Box::new(resolver.clone())).unwrap();
        (hexy, resolver)
    }

    fn connected() -> (Hexy, MockLog) {
        let (mut hexy, resolver) = hexy();
        hexy.connect().unwrap();
        (hexy, resolver.log())
    }

    #[test]
    fn test_servo_count_and_order() {
        let (hexy, _) = hexy();
        let ids: Vec<u8> = hexy.servos().map(|s| s.id().get()).collect();
        assert_eq!(ids.len(), 19);
        assert_eq!(&ids[..3], &[7, 6, 5]);
        assert_eq!(ids.last(), Some(&31));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = HexyConfig::default();
        config.legs.truncate(5);
        assert!(Hexy::new(&config, Box::new(MockResolver::new())).is_err());
    }

    #[test]
    fn test_servo_names() {
        let (hexy, _) = hexy();
        let names = hexy.servo_names();
        assert_eq!(names.len(), 19);
        assert_eq!(names[0], "Head");
        assert_eq!(names[1], "LF/hip");
        assert_eq!(names[18], "RR/knee");
    }

    #[test]
    fn test_servo_by_name() {
        let (mut hexy, _) = hexy();
        assert_eq!(hexy.servo_by_name("head").unwrap().id().get(), 31);
        assert_eq!(hexy.servo_by_name("RF/thigh").unwrap().id().get(), 25);
        assert_eq!(hexy.servo_by_name("lm/KNEE").unwrap().id().get(), 9);
        assert!(hexy.servo_by_name("XX/hip").is_none());
        assert!(hexy.servo_by_name("LF/ankle").is_none());
        assert!(hexy.servo_by_name("LF").is_none());
    }

    #[test]
    fn test_servo_mut_unknown() {
        let (mut hexy, _) = hexy();
        let missing = ServoId::new(0).unwrap();
        assert!(matches!(hexy.servo_mut(missing), Err(DriverError::UnknownServo(_))));
    }

    #[test]
    fn test_center_and_stop_lines() {
        let (mut hexy, log) = connected();
        hexy.center().unwrap();
        hexy.stop().unwrap();
        assert_eq!(log.lines(), vec![b"C\n".to_vec(), b"K\n".to_vec()]);
    }

    #[test]
    fn test_handles_move() {
        let (mut hexy, log) = connected();
        hexy.leg_mut(LegName::RightFront).unwrap().joint(Joint::Hip).set_absolute_position(9.0).unwrap();
        hexy.head_mut().look(0.0).unwrap();

        assert_eq!(log.lines(), vec![b"#24P1600\n".to_vec(), b"#31P1500\n".to_vec()]);
        let rf = hexy.leg(LegName::RightFront).unwrap();
        assert_eq!(rf.servo(Joint::Hip).last_commanded_angle(), Some(9.0));
    }

    #[test]
    fn test_load_offsets() {
        let (mut hexy, _) = hexy();
        let mut offsets = BTreeMap::new();
        offsets.insert("5".to_string(), 3.5);
        offsets.insert("99".to_string(), 1.0);
        offsets.insert("head".to_string(), 1.0);

        assert_eq!(hexy.load_offsets(&offsets), 1);
        for (id, offset) in hexy.offsets() {
            let expected = if id.get() == 5 { 3.5 } else { 0.0 };
            assert_eq!(offset, expected, "servo {}", id);
        }
    }

    #[test]
    fn test_restore_requires_connection() {
        let (mut hexy, resolver) = hexy();
        assert!(matches!(hexy.restore_last_position(), Err(DriverError::NotConnected)));
        assert!(resolver.log().is_empty());
    }

    #[test]
    fn test_session_releases_on_error() {
        let (mut hexy, resolver) = hexy();
        let result: Result<(), DriverError> = hexy.session(|hexy| {
            hexy.head_mut().look(10.0)?;
            Err(DriverError::Unsupported("test"))
        });

        assert!(matches!(result, Err(DriverError::Unsupported("test"))));
        assert_eq!(resolver.log().lines().last(), Some(&b"K\n".to_vec()));
        assert_eq!(hexy.connection_state(), ConnectionState::Closed);
    }

    #[test]
    fn test_session_releases_on_panic() {
        let (mut hexy, resolver) = hexy();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let _: Result<(), DriverError> = hexy.session(|_| panic!("boom"));
        }));

        assert!(outcome.is_err());
        assert_eq!(resolver.log().lines(), vec![b"K\n".to_vec()]);
        assert!(!hexy.is_connected());
    }
}
