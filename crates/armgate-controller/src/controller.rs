//! 控制器接口 Trait

use std::sync::Arc;

use crate::error::Result;
use crate::event::{EventCallback, EventKind, SubscriptionId};
use crate::types::{
    Capabilities, ControlMode, Diagnostics, JointMove, RunState, StateCommand,
};

/// 外部机械臂控制器
///
/// 监督层只通过本 trait 访问控制器。实现者负责通信、轨迹规划和伺服控制，
/// 并在自己的通知线程上投递事件。
///
/// # 返回值约定
///
/// - `Err(ControllerError)`: 控制器客户端抛出的异常
/// - `set_servo_angle` 的 `Ok(code)`: 控制器返回码，`0` 表示成功
///
/// # 线程安全
///
/// 回调可能在通知线程上调用 [`unsubscribe`](Self::unsubscribe)，
/// 因此实现必须是 `Send + Sync`，并且派发事件时不能持有订阅表的锁。
pub trait ArmController: Send + Sync {
    /// 清除警告
    fn clean_warn(&self) -> Result<()>;

    /// 清除错误
    fn clean_error(&self) -> Result<()>;

    /// 使能/失能运动
    fn motion_enable(&self, enable: bool) -> Result<()>;

    fn set_mode(&self, mode: ControlMode) -> Result<()>;

    fn set_state(&self, state: StateCommand) -> Result<()>;

    /// 关节空间运动到目标角度
    ///
    /// `joint_move.wait == true` 时阻塞直到运动完成或失败。
    fn set_servo_angle(&self, joint_move: &JointMove) -> Result<i32>;

    /// 当前是否已连接
    fn is_connected(&self) -> bool;

    /// 当前错误码（0 表示无错误）
    fn error_code(&self) -> i32;

    /// 当前运行状态
    fn run_state(&self) -> RunState;

    /// 主动读回诊断信息
    ///
    /// 默认实现由实时属性拼装，警告码记为 0。
    fn diagnostics(&self) -> Result<Diagnostics> {
        Ok(Diagnostics {
            connected: self.is_connected(),
            state: self.run_state(),
            error_code: self.error_code(),
            warn_code: 0,
        })
    }

    /// 可选能力
    fn capabilities(&self) -> Capabilities {
        Capabilities::default()
    }

    /// 订阅事件
    ///
    /// 对不支持的事件类型返回 `ControllerError::Unsupported`。
    fn subscribe(
        &self,
        kind: EventKind,
        callback: Arc<dyn EventCallback>,
    ) -> Result<SubscriptionId>;

    /// 取消订阅，返回句柄是否仍然有效
    fn unsubscribe(&self, id: SubscriptionId) -> Result<bool>;
}
