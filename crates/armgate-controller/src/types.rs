//! 控制器数据类型
//!
//! 角度单位统一为度（deg），速度为 deg/s，加速度为 deg/s²，
//! 与控制器的关节运动接口保持一致。

use std::fmt;
use std::ops::Index;

/// 关节数量（六轴机械臂）
pub const JOINT_COUNT: usize = 6;

/// 六个关节的目标角度（度）
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct JointAngles(pub [f64; JOINT_COUNT]);

impl JointAngles {
    /// 从角度数组创建
    pub const fn new(degrees: [f64; JOINT_COUNT]) -> Self {
        Self(degrees)
    }

    /// 获取底层数组
    pub const fn as_array(&self) -> &[f64; JOINT_COUNT] {
        &self.0
    }

    /// 所有角度是否都是有限值（非 NaN/Inf）
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|a| a.is_finite())
    }
}

impl From<[f64; JOINT_COUNT]> for JointAngles {
    fn from(degrees: [f64; JOINT_COUNT]) -> Self {
        Self(degrees)
    }
}

impl Index<usize> for JointAngles {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.0[index]
    }
}

impl fmt::Display for JointAngles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, a) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{:.1}", a)?;
        }
        write!(f, "]")
    }
}

/// 过渡半径
///
/// 正值：控制器在进入下一个目标前平滑过渡；负值：精确停在目标点。
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct BlendRadius(pub f64);

impl BlendRadius {
    /// 精确停止（控制器约定的 -1）
    pub const EXACT_STOP: BlendRadius = BlendRadius(-1.0);

    /// 是否允许路径过渡
    pub fn is_blending(&self) -> bool {
        self.0 > 0.0
    }
}

impl Default for BlendRadius {
    fn default() -> Self {
        Self::EXACT_STOP
    }
}

/// 关节运动的速度/加速度预设
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MotionParams {
    /// 关节角速度（deg/s）
    pub speed: f64,
    /// 关节角加速度（deg/s²）
    pub acceleration: f64,
}

impl MotionParams {
    pub const fn new(speed: f64, acceleration: f64) -> Self {
        Self {
            speed,
            acceleration,
        }
    }

    /// 速度和加速度均为有限正数
    pub fn is_valid(&self) -> bool {
        self.speed.is_finite()
            && self.speed > 0.0
            && self.acceleration.is_finite()
            && self.acceleration > 0.0
    }
}

impl Default for MotionParams {
    fn default() -> Self {
        Self::new(20.0, 200.0)
    }
}

/// 一条阻塞式关节运动命令
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointMove {
    pub angles: JointAngles,
    pub params: MotionParams,
    pub radius: BlendRadius,
    /// 是否阻塞直到运动完成
    pub wait: bool,
}

/// 控制器上报的运行状态码
///
/// 控制器可能上报未在此列出的值，因此使用 newtype 而不是封闭枚举。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct RunState(pub i32);

impl RunState {
    /// 就绪
    pub const READY: RunState = RunState(0);
    /// 运动中
    pub const MOVING: RunState = RunState(1);
    /// 休眠
    pub const SLEEPING: RunState = RunState(2);
    /// 暂停
    pub const PAUSED: RunState = RunState(3);
    /// 已停止（终止状态阈值）
    pub const STOPPED: RunState = RunState(4);
    /// 状态切换中
    pub const TRANSITIONAL: RunState = RunState(5);

    /// 是否等于终止状态
    pub fn is_terminal(&self) -> bool {
        *self == Self::STOPPED
    }

    pub fn is_transitional(&self) -> bool {
        *self == Self::TRANSITIONAL
    }

    /// 状态码低于终止阈值时允许继续发送运动命令
    pub fn permits_motion(&self) -> bool {
        *self < Self::STOPPED
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            Self::READY => "ready",
            Self::MOVING => "moving",
            Self::SLEEPING => "sleeping",
            Self::PAUSED => "paused",
            Self::STOPPED => "stopped",
            Self::TRANSITIONAL => "transitional",
            _ => return write!(f, "unknown({})", self.0),
        };
        write!(f, "{}({})", name, self.0)
    }
}

/// 控制模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum ControlMode {
    /// 位置模式（默认）
    #[default]
    Position,
    /// 伺服模式
    Servo,
    /// 关节示教模式
    JointTeaching,
}

impl ControlMode {
    /// 控制器协议中的模式编号
    pub const fn code(self) -> i32 {
        match self {
            Self::Position => 0,
            Self::Servo => 1,
            Self::JointTeaching => 2,
        }
    }
}

/// 运行状态切换命令
///
/// 监督层只会请求进入就绪状态；暂停/停止由控制器自身或操作员触发。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateCommand {
    /// 进入就绪/运动状态
    Start,
}

impl StateCommand {
    /// 控制器协议中的状态编号
    pub const fn code(self) -> i32 {
        match self {
            Self::Start => 0,
        }
    }

    /// 命令成功后控制器进入的运行状态
    pub const fn target_state(self) -> RunState {
        RunState(self.code())
    }
}

/// 诊断快照
///
/// 命令失败时读取，用于日志中定位故障。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Diagnostics {
    pub connected: bool,
    pub state: RunState,
    pub error_code: i32,
    pub warn_code: i32,
}

/// 控制器可选能力
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    /// 是否支持运动计数变化事件
    pub count_events: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_state_thresholds() {
        assert!(RunState::READY.permits_motion());
        assert!(RunState::MOVING.permits_motion());
        assert!(RunState::PAUSED.permits_motion());
        assert!(!RunState::STOPPED.permits_motion());
        assert!(!RunState::TRANSITIONAL.permits_motion());

        assert!(RunState::STOPPED.is_terminal());
        assert!(!RunState::TRANSITIONAL.is_terminal());
        assert!(RunState(5).is_transitional());
    }

    #[test]
    fn test_run_state_display() {
        assert_eq!(RunState::STOPPED.to_string(), "stopped(4)");
        assert_eq!(RunState(42).to_string(), "unknown(42)");
    }

    #[test]
    fn test_blend_radius() {
        assert!(!BlendRadius::EXACT_STOP.is_blending());
        assert!(!BlendRadius(-42.0).is_blending());
        assert!(BlendRadius(5.0).is_blending());
        assert_eq!(BlendRadius::default(), BlendRadius(-1.0));
    }

    #[test]
    fn test_motion_params_validation() {
        assert!(MotionParams::default().is_valid());
        assert!(!MotionParams::new(0.0, 200.0).is_valid());
        assert!(!MotionParams::new(20.0, -1.0).is_valid());
        assert!(!MotionParams::new(f64::NAN, 200.0).is_valid());
    }

    #[test]
    fn test_joint_angles_display_and_index() {
        let angles = JointAngles::new([27.0, 33.0, -138.0, 1.5, 6.5, -2.0]);
        assert_eq!(angles[3], 1.5);
        assert_eq!(angles.to_string(), "[27.0, 33.0, -138.0, 1.5, 6.5, -2.0]");
        assert!(angles.is_finite());
        assert!(!JointAngles::new([0.0, 0.0, f64::INFINITY, 0.0, 0.0, 0.0]).is_finite());
    }

    #[test]
    fn test_mode_codes() {
        assert_eq!(ControlMode::default().code(), 0);
        assert_eq!(ControlMode::JointTeaching.code(), 2);
        assert_eq!(StateCommand::Start.code(), 0);
        assert_eq!(StateCommand::Start.target_state(), RunState::READY);
    }
}
