//! 运动监督器
//!
//! 按顺序下发关节路点，同时监听控制器的错误/状态/计数事件，
//! 一旦控制器不可用就放弃剩余路点。
//!
//! # 生命周期
//!
//! ```text
//! new()  ── 清错/使能/设模式/设状态 ── 稳定等待 ── 订阅事件
//!   │
//! run()  ── for 每个路点: is_alive? → set_servo_angle → check_code
//!   │        （任意一步失败即停止）
//!   │
//! 终止   ── 锁存停止 + 释放全部订阅（恰好一次，panic 也会执行）
//! ```
//!
//! # 线程模型
//!
//! - 调用方线程执行 `run()`，运动命令是阻塞的
//! - 事件回调运行在控制器的通知线程上，只做锁存和日志，不阻塞
//! - 回调持有 `Weak` 引用，注册的回调不会延长监督器的生命周期

use armgate_controller::{
    ArmController, ControllerEvent, EventCallback, EventKind, JointMove, RunState,
    SubscriptionId,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::thread;
use tracing::{debug, error, info, warn};

use crate::config::SupervisorConfig;
use crate::error::Result;
use crate::latch::LivenessLatch;
use crate::sequence::MotionSequence;

/// 运动命令在日志中的标签
const MOVE_LABEL: &str = "set_servo_angle";

/// 序列执行结果
///
/// `index` 均为路点序号（从 0 开始）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// 全部路点执行完毕
    Completed,
    /// 下发第 `index` 个路点前存活检查失败，该路点未下发
    NotAlive { index: usize },
    /// 第 `index` 个路点执行后检查失败（返回码非零，或执行期间失去存活）
    CheckFailed { index: usize, code: i32 },
    /// 第 `index` 个路点执行时控制器抛出异常
    Error { index: usize, message: String },
}

/// 一次 `run()` 的报告
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// 序列中的路点总数
    pub total: usize,
    /// 实际下发的运动命令数量
    pub issued: usize,
    pub outcome: RunOutcome,
    /// 锁存的首个原因（终止后总是存在）
    pub trip_reason: Option<String>,
}

impl RunReport {
    pub fn is_completed(&self) -> bool {
        self.outcome == RunOutcome::Completed
    }
}

#[derive(Debug, Default)]
struct Subscriptions {
    error_warn: Option<SubscriptionId>,
    state: Option<SubscriptionId>,
    count: Option<SubscriptionId>,
}

impl Subscriptions {
    fn slot(&mut self, kind: EventKind) -> &mut Option<SubscriptionId> {
        match kind {
            EventKind::ErrorWarnChanged => &mut self.error_warn,
            EventKind::StateChanged => &mut self.state,
            EventKind::CountChanged => &mut self.count,
        }
    }

    fn take_all(&mut self) -> Vec<(EventKind, SubscriptionId)> {
        EventKind::ALL
            .into_iter()
            .filter_map(|kind| self.slot(kind).take().map(|id| (kind, id)))
            .collect()
    }
}

struct Inner<C: ?Sized> {
    controller: Arc<C>,
    config: SupervisorConfig,
    latch: LivenessLatch,
    subscriptions: Mutex<Subscriptions>,
    terminated: AtomicBool,
}

/// 运动监督器
///
/// # 示例
///
/// ```rust,no_run
/// # use armgate_supervisor::{MotionSequence, MotionSupervisor, SupervisorConfig};
/// # use armgate_controller::ArmController;
/// # use std::sync::Arc;
/// # fn example<C: ArmController + 'static>(controller: Arc<C>) -> armgate_supervisor::Result<()> {
/// let supervisor = MotionSupervisor::new(controller, SupervisorConfig::default())?;
/// let report = supervisor.run(&MotionSequence::recorded());
/// println!("issued {}/{}: {:?}", report.issued, report.total, report.outcome);
/// # Ok(())
/// # }
/// ```
pub struct MotionSupervisor<C: ArmController + ?Sized + 'static> {
    inner: Arc<Inner<C>>,
}

impl<C: ArmController + ?Sized + 'static> MotionSupervisor<C> {
    /// 初始化控制器并订阅事件
    ///
    /// 依次执行：清除警告、清除错误、使能运动、设置模式、设置就绪状态、
    /// 稳定等待、订阅事件。任意一步出错都会返回错误，已建立的订阅会被释放。
    pub fn new(controller: Arc<C>, config: SupervisorConfig) -> Result<Self> {
        config.validate()?;

        let supervisor = Self {
            inner: Arc::new(Inner {
                controller,
                config,
                latch: LivenessLatch::new(),
                subscriptions: Mutex::new(Subscriptions::default()),
                terminated: AtomicBool::new(false),
            }),
        };

        // 出错时 supervisor 被 drop，Drop 负责释放已建立的订阅
        supervisor.inner.prepare_controller()?;
        supervisor.subscribe_all()?;

        info!(
            mode = ?supervisor.inner.config.mode,
            speed = supervisor.inner.config.motion.speed,
            acceleration = supervisor.inner.config.motion.acceleration,
            "Motion supervisor ready"
        );
        Ok(supervisor)
    }

    fn subscribe_all(&self) -> Result<()> {
        let capabilities = self.inner.controller.capabilities();
        for kind in EventKind::ALL {
            if kind == EventKind::CountChanged && !capabilities.count_events {
                debug!("Controller has no count-changed events, skipping subscription");
                continue;
            }
            let callback: Arc<dyn EventCallback> = Arc::new(SupervisorCallback {
                inner: Arc::downgrade(&self.inner),
            });
            let id = self.inner.controller.subscribe(kind, callback)?;
            *self.inner.subscriptions.lock().slot(kind) = Some(id);
            debug!(%kind, %id, "Subscribed to controller events");
        }
        Ok(())
    }

    /// 存活判定（可能阻塞）
    ///
    /// 锁存未触发、控制器已连接且错误码为 0 时，再看运行状态：
    /// 处于切换中则按配置的间隔有限次轮询，最终要求状态低于终止阈值。
    /// 本方法不会触发锁存。
    pub fn is_alive(&self) -> bool {
        self.inner.is_alive()
    }

    /// 命令结果检查
    ///
    /// 已失去存活或 `code != 0` 时锁存停止、读回并记录诊断信息，返回 `false`。
    pub fn check_code(&self, code: i32, label: &str) -> bool {
        self.inner.check_code(code, label)
    }

    /// 执行路点序列
    ///
    /// 故障不会以错误返回：首个故障锁存后序列立即结束，结果记录在报告中。
    /// 无论以何种方式退出（完成、提前终止、控制器异常、panic），
    /// 终止流程都会执行且只执行一次。
    pub fn run(&self, sequence: &MotionSequence) -> RunReport {
        let guard = TerminationGuard {
            inner: self.inner.as_ref(),
        };
        let (issued, outcome) = self.inner.run_steps(sequence);
        drop(guard);

        RunReport {
            total: sequence.len(),
            issued,
            outcome,
            trip_reason: self.inner.latch.trip_reason(),
        }
    }

    /// 立即终止：锁存停止并释放所有订阅（幂等）
    pub fn terminate(&self) {
        self.inner.terminate();
    }

    pub fn is_terminated(&self) -> bool {
        self.inner.terminated.load(Ordering::Acquire)
    }

    pub fn latch(&self) -> &LivenessLatch {
        &self.inner.latch
    }

    pub fn controller(&self) -> &Arc<C> {
        &self.inner.controller
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.inner.config
    }
}

impl<C: ArmController + ?Sized + 'static> Drop for MotionSupervisor<C> {
    fn drop(&mut self) {
        self.inner.terminate();
    }
}

/// 作用域守卫：离开 `run()` 时（包括 unwind）执行终止流程
struct TerminationGuard<'a, C: ArmController + ?Sized> {
    inner: &'a Inner<C>,
}

impl<C: ArmController + ?Sized> Drop for TerminationGuard<'_, C> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.inner
                .latch
                .trip("MainException: panic while running the sequence");
            error!("MainException: panic while running the sequence");
        }
        self.inner.terminate();
    }
}

impl<C: ArmController + ?Sized> Inner<C> {
    fn prepare_controller(&self) -> Result<()> {
        let controller = &self.controller;
        controller.clean_warn()?;
        controller.clean_error()?;
        controller.motion_enable(true)?;
        controller.set_mode(self.config.mode)?;
        controller.set_state(armgate_controller::StateCommand::Start)?;

        // 模式/状态切换后控制器需要时间稳定
        thread::sleep(self.config.settle_delay());
        Ok(())
    }

    fn is_alive(&self) -> bool {
        let controller = &self.controller;
        if !(self.latch.is_alive() && controller.is_connected() && controller.error_code() == 0)
        {
            return false;
        }

        let mut state = controller.run_state();
        let mut polls = 0;
        while state.is_transitional() && polls < self.config.transitional_max_polls {
            polls += 1;
            thread::sleep(self.config.transitional_poll_interval());
            state = controller.run_state();
        }
        if state.is_transitional() {
            debug!(polls, "Run state still transitional after bounded wait");
        }
        state.permits_motion()
    }

    /// 非阻塞存活判定，供回调使用
    ///
    /// 切换中的状态视为存活（不在通知线程上等待）。
    fn is_alive_now(&self) -> bool {
        let controller = &self.controller;
        if !(self.latch.is_alive() && controller.is_connected() && controller.error_code() == 0)
        {
            return false;
        }
        let state = controller.run_state();
        state.permits_motion() || state.is_transitional()
    }

    fn check_code(&self, code: i32, label: &str) -> bool {
        let alive = self.is_alive();
        if alive && code == 0 {
            return true;
        }

        let reason = if code != 0 {
            format!("{} returned code {}", label, code)
        } else {
            format!("{}: controller no longer alive", label)
        };
        self.latch.trip(reason);
        self.log_diagnostics(label, code);
        false
    }

    /// 下发前存活检查失败的原因
    ///
    /// 已锁存时沿用首个原因，否则按连接、错误码、运行状态的顺序描述。
    fn not_alive_reason(&self) -> String {
        if let Some(reason) = self.latch.trip_reason() {
            return reason;
        }
        let controller = &self.controller;
        if !controller.is_connected() {
            "controller disconnected".to_string()
        } else if controller.error_code() != 0 {
            format!("controller error {}", controller.error_code())
        } else {
            format!("controller state {}", controller.run_state())
        }
    }

    /// 读回并记录诊断信息（实时属性 + 主动读回）
    fn log_diagnostics(&self, label: &str, code: i32) {
        let controller = &self.controller;
        let connected = controller.is_connected();
        let state = controller.run_state();
        let error_code = controller.error_code();
        match controller.diagnostics() {
            Ok(diag) => error!(
                label,
                code,
                connected,
                %state,
                error_code,
                readback_state = %diag.state,
                readback_error = diag.error_code,
                readback_warn = diag.warn_code,
                "Command check failed"
            ),
            Err(e) => error!(
                label,
                code,
                connected,
                %state,
                error_code,
                readback = %e,
                "Command check failed, diagnostics unavailable"
            ),
        }
    }

    fn run_steps(&self, sequence: &MotionSequence) -> (usize, RunOutcome) {
        let total = sequence.len();
        let mut issued = 0;
        info!(sequence = %sequence.name, total, "Starting joint sequence");

        for (index, waypoint) in sequence.iter().enumerate() {
            if !self.is_alive() {
                let reason = self.not_alive_reason();
                warn!(
                    step = index + 1,
                    total,
                    %reason,
                    "Not alive, abandoning remaining waypoints"
                );
                self.latch.trip(reason);
                self.log_diagnostics(MOVE_LABEL, 0);
                return (issued, RunOutcome::NotAlive { index });
            }

            let joint_move = JointMove {
                angles: waypoint.angles,
                params: self.config.motion,
                radius: waypoint.radius,
                wait: true,
            };
            info!(
                step = index + 1,
                total,
                angles = %waypoint.angles,
                radius = waypoint.radius.0,
                "Issuing joint move"
            );
            issued += 1;

            match self.controller.set_servo_angle(&joint_move) {
                Ok(code) => {
                    if !self.check_code(code, MOVE_LABEL) {
                        return (issued, RunOutcome::CheckFailed { index, code });
                    }
                },
                Err(e) => {
                    error!(step = index + 1, "MainException: {}", e);
                    self.latch.trip(format!("MainException: {}", e));
                    return (
                        issued,
                        RunOutcome::Error {
                            index,
                            message: e.to_string(),
                        },
                    );
                },
            }
        }

        info!(sequence = %sequence.name, total, "Joint sequence completed");
        (issued, RunOutcome::Completed)
    }

    fn terminate(&self) {
        if self.terminated.swap(true, Ordering::AcqRel) {
            return;
        }
        self.latch.trip("supervisor terminated");

        let held = self.subscriptions.lock().take_all();
        let mut released = 0;
        for (kind, id) in held {
            match self.controller.unsubscribe(id) {
                Ok(true) => released += 1,
                Ok(false) => debug!(%kind, %id, "Subscription already gone"),
                Err(e) => warn!(%kind, %id, "Failed to release subscription: {}", e),
            }
        }
        let record = self.latch.trip_record();
        info!(
            released,
            reason = record.as_ref().map_or("unknown", |r| r.reason.as_str()),
            since_trip = ?record.as_ref().map(|r| r.at.elapsed()),
            "Motion supervisor terminated"
        );
    }

    /// 一次性释放某个订阅（回调触发后调用）
    fn release(&self, kind: EventKind) {
        let id = self.subscriptions.lock().slot(kind).take();
        if let Some(id) = id {
            if let Err(e) = self.controller.unsubscribe(id) {
                warn!(%kind, %id, "Failed to release subscription: {}", e);
            }
        }
    }

    fn on_error_warn(&self, error_code: i32, warn_code: i32) {
        if error_code != 0 {
            self.latch.trip(format!("controller error {}", error_code));
            warn!(error_code, warn_code, "err={}, quit", error_code);
            self.release(EventKind::ErrorWarnChanged);
        } else if warn_code != 0 {
            debug!(warn_code, "Controller warning");
        }
    }

    fn on_state(&self, state: RunState) {
        if state.is_terminal() {
            self.latch.trip(format!("controller state {}", state));
            warn!(%state, "state={}, quit", state.0);
            self.release(EventKind::StateChanged);
        }
    }

    fn on_count(&self, count: u64) {
        if self.is_alive_now() {
            info!(count, "counter val: {}", count);
        }
    }
}

/// 注册到控制器的回调
struct SupervisorCallback<C: ?Sized> {
    inner: Weak<Inner<C>>,
}

impl<C: ArmController + ?Sized + 'static> EventCallback for SupervisorCallback<C> {
    fn on_event(&self, event: &ControllerEvent) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        match *event {
            ControllerEvent::ErrorWarnChanged {
                error_code,
                warn_code,
            } => inner.on_error_warn(error_code, warn_code),
            ControllerEvent::StateChanged { state } => inner.on_state(state),
            ControllerEvent::CountChanged { count } => inner.on_count(count),
        }
    }
}
