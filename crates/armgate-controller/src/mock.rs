//! 模拟控制器
//!
//! 用于测试和演示的进程内控制器：
//! - 记录所有初始化调用、运动命令和取消订阅调用
//! - 按命令序号预设结果（返回码、异常、命令执行期间的故障事件、panic）
//! - 初始化命令可预设为被拒绝（`ControllerError::Rejected`）
//! - 事件由独立的通知线程投递，与真实控制器的回调线程模型一致
//!
//! # 示例
//!
//! ```rust
//! use armgate_controller::mock::{MoveScript, SimulatedController};
//! use armgate_controller::ArmController;
//!
//! let controller = SimulatedController::new();
//! // 第 3 条运动命令（序号 2）返回错误码 9
//! controller.script_move(2, MoveScript::Code(9));
//! assert!(controller.is_connected());
//! ```

use crossbeam_channel::{Sender, bounded, unbounded};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU64, AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crate::controller::ArmController;
use crate::error::{ControllerError, Result};
use crate::event::{ControllerEvent, EventCallback, EventKind, SubscriptionId};
use crate::registry::{CallbackRegistry, dispatch};
use crate::types::{
    Capabilities, ControlMode, Diagnostics, JointMove, RunState, StateCommand,
};

/// 初始化阶段的调用记录
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupCall {
    CleanWarn,
    CleanError,
    MotionEnable(bool),
    SetMode(ControlMode),
    SetState(StateCommand),
}

impl SetupCall {
    /// 控制器命令名称
    pub const fn command(&self) -> &'static str {
        match self {
            Self::CleanWarn => "clean_warn",
            Self::CleanError => "clean_error",
            Self::MotionEnable(_) => "motion_enable",
            Self::SetMode(_) => "set_mode",
            Self::SetState(_) => "set_state",
        }
    }
}

/// 单条运动命令的预设结果
#[derive(Debug, Clone)]
pub enum MoveScript {
    /// 直接返回该结果码
    Code(i32),
    /// 抛出控制器异常
    Error(ControllerError),
    /// 执行期间控制器报错：设置错误码并投递错误事件，等待回调完成后返回 0
    FaultDuring { error_code: i32 },
    /// 执行期间运行状态变化：设置状态并投递状态事件，等待回调完成后返回 0
    StateDuring { state: RunState },
    /// 执行期间 panic（模拟未预期的崩溃）
    Panic(&'static str),
}

/// 取消订阅调用记录
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseCall {
    pub id: SubscriptionId,
    /// 句柄对应的事件类型（已失效的句柄为 `None`）
    pub kind: Option<EventKind>,
    /// 句柄在调用时是否有效
    pub removed: bool,
}

#[derive(Default)]
struct Journal {
    setup: Vec<SetupCall>,
    setup_at: Vec<Instant>,
    moves: Vec<JointMove>,
    subscribe_attempts: Vec<EventKind>,
    subscribe_at: Vec<Instant>,
    releases: Vec<ReleaseCall>,
}

type Notice = (ControllerEvent, Option<Sender<()>>);

struct Notifier {
    tx: Sender<Notice>,
    handle: JoinHandle<()>,
}

/// 模拟控制器
pub struct SimulatedController {
    connected: AtomicBool,
    error_code: AtomicI32,
    warn_code: AtomicI32,
    state: AtomicI32,
    mode: AtomicI32,
    count: AtomicU64,
    capabilities: Capabilities,
    /// 被拒绝的初始化命令及返回码
    rejected_setup: Mutex<Option<(&'static str, i32)>>,
    registry: Arc<RwLock<CallbackRegistry>>,
    journal: Mutex<Journal>,
    scripts: Mutex<HashMap<usize, MoveScript>>,
    /// 依次由 `run_state()` 读取的状态序列，读完后保持最后的值
    state_queue: Mutex<VecDeque<RunState>>,
    state_reads: AtomicUsize,
    diagnostics_reads: AtomicUsize,
    notifier: Option<Notifier>,
}

impl SimulatedController {
    /// 创建已连接、无错误、就绪状态、支持计数事件的模拟控制器
    pub fn new() -> Self {
        Self::with_capabilities(Capabilities { count_events: true })
    }

    pub fn with_capabilities(capabilities: Capabilities) -> Self {
        let registry = Arc::new(RwLock::new(CallbackRegistry::new()));
        let (tx, rx) = unbounded::<Notice>();

        let thread_registry = Arc::clone(&registry);
        let handle = thread::spawn(move || {
            while let Ok((event, ack)) = rx.recv() {
                dispatch(&thread_registry, &event);
                if let Some(ack) = ack {
                    let _ = ack.send(());
                }
            }
        });

        Self {
            connected: AtomicBool::new(true),
            error_code: AtomicI32::new(0),
            warn_code: AtomicI32::new(0),
            state: AtomicI32::new(RunState::READY.0),
            mode: AtomicI32::new(ControlMode::default().code()),
            count: AtomicU64::new(0),
            capabilities,
            rejected_setup: Mutex::new(None),
            registry,
            journal: Mutex::new(Journal::default()),
            scripts: Mutex::new(HashMap::new()),
            state_queue: Mutex::new(VecDeque::new()),
            state_reads: AtomicUsize::new(0),
            diagnostics_reads: AtomicUsize::new(0),
            notifier: Some(Notifier { tx, handle }),
        }
    }

    // ==================== 场景预设 ====================

    /// 预设第 `index` 条运动命令（从 0 开始）的结果
    pub fn script_move(&self, index: usize, script: MoveScript) {
        self.scripts.lock().insert(index, script);
    }

    /// 预设名为 `command` 的初始化命令被拒绝，返回 `code`
    pub fn reject_setup(&self, command: &'static str, code: i32) {
        *self.rejected_setup.lock() = Some((command, code));
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// 直接设置错误码（不投递事件）
    pub fn set_error_code(&self, error_code: i32) {
        self.error_code.store(error_code, Ordering::SeqCst);
    }

    /// 直接设置运行状态（不投递事件）
    pub fn set_run_state(&self, state: RunState) {
        self.state_queue.lock().clear();
        self.state.store(state.0, Ordering::SeqCst);
    }

    /// 预设后续 `run_state()` 依次读到的状态
    pub fn queue_run_states(&self, states: impl IntoIterator<Item = RunState>) {
        self.state_queue.lock().extend(states);
    }

    /// 控制器报错：设置错误/警告码并投递事件（等待回调执行完毕）
    pub fn inject_error(&self, error_code: i32, warn_code: i32) {
        self.error_code.store(error_code, Ordering::SeqCst);
        self.warn_code.store(warn_code, Ordering::SeqCst);
        self.emit(ControllerEvent::ErrorWarnChanged {
            error_code,
            warn_code,
        });
    }

    /// 运行状态变化：设置状态并投递事件（等待回调执行完毕）
    pub fn inject_state(&self, state: RunState) {
        self.set_run_state(state);
        self.emit(ControllerEvent::StateChanged { state });
    }

    /// 在通知线程上投递事件，并等待所有回调执行完毕
    ///
    /// 不能在回调内部调用（会等待自己）。
    pub fn emit(&self, event: ControllerEvent) {
        let Some(notifier) = &self.notifier else {
            return;
        };
        let (ack_tx, ack_rx) = bounded(1);
        if notifier.tx.send((event, Some(ack_tx))).is_ok() {
            let _ = ack_rx.recv();
        }
    }

    // ==================== 记录查询 ====================

    pub fn setup_calls(&self) -> Vec<SetupCall> {
        self.journal.lock().setup.clone()
    }

    /// 每条初始化调用的时间
    pub fn setup_timestamps(&self) -> Vec<Instant> {
        self.journal.lock().setup_at.clone()
    }

    /// 每次订阅尝试的时间
    pub fn subscribe_timestamps(&self) -> Vec<Instant> {
        self.journal.lock().subscribe_at.clone()
    }

    /// 最近一次 `set_mode` 设置的模式编号
    pub fn mode_code(&self) -> i32 {
        self.mode.load(Ordering::SeqCst)
    }

    /// 已下发的运动命令（按顺序）
    pub fn issued_moves(&self) -> Vec<JointMove> {
        self.journal.lock().moves.clone()
    }

    pub fn subscribe_attempts(&self) -> Vec<EventKind> {
        self.journal.lock().subscribe_attempts.clone()
    }

    /// 全部取消订阅调用（包括无效句柄）
    pub fn release_calls(&self) -> Vec<ReleaseCall> {
        self.journal.lock().releases.clone()
    }

    /// 当前仍有效的订阅数量
    pub fn active_subscriptions(&self, kind: EventKind) -> usize {
        self.registry.read().count(kind)
    }

    /// 累计的 `run_state()` 读取次数
    pub fn run_state_reads(&self) -> usize {
        self.state_reads.load(Ordering::SeqCst)
    }

    pub fn diagnostics_reads(&self) -> usize {
        self.diagnostics_reads.load(Ordering::SeqCst)
    }

    pub fn motion_count(&self) -> u64 {
        self.count.load(Ordering::SeqCst)
    }

    fn record_setup(&self, call: SetupCall) -> Result<()> {
        {
            let mut journal = self.journal.lock();
            journal.setup.push(call);
            journal.setup_at.push(Instant::now());
        }
        if !self.connected.load(Ordering::SeqCst) {
            return Err(ControllerError::NotConnected);
        }
        match *self.rejected_setup.lock() {
            Some((command, code)) if command == call.command() => {
                Err(ControllerError::Rejected { command, code })
            },
            _ => Ok(()),
        }
    }
}

impl Default for SimulatedController {
    fn default() -> Self {
        Self::new()
    }
}

impl ArmController for SimulatedController {
    fn clean_warn(&self) -> Result<()> {
        self.record_setup(SetupCall::CleanWarn)?;
        self.warn_code.store(0, Ordering::SeqCst);
        Ok(())
    }

    fn clean_error(&self) -> Result<()> {
        self.record_setup(SetupCall::CleanError)?;
        self.error_code.store(0, Ordering::SeqCst);
        Ok(())
    }

    fn motion_enable(&self, enable: bool) -> Result<()> {
        self.record_setup(SetupCall::MotionEnable(enable))
    }

    fn set_mode(&self, mode: ControlMode) -> Result<()> {
        self.record_setup(SetupCall::SetMode(mode))?;
        self.mode.store(mode.code(), Ordering::SeqCst);
        Ok(())
    }

    fn set_state(&self, state: StateCommand) -> Result<()> {
        self.record_setup(SetupCall::SetState(state))?;
        self.set_run_state(state.target_state());
        Ok(())
    }

    fn set_servo_angle(&self, joint_move: &JointMove) -> Result<i32> {
        let index = {
            let mut journal = self.journal.lock();
            journal.moves.push(*joint_move);
            journal.moves.len() - 1
        };

        if !self.connected.load(Ordering::SeqCst) {
            return Err(ControllerError::NotConnected);
        }

        let script = self.scripts.lock().remove(&index);
        match script {
            None | Some(MoveScript::Code(0)) => {
                let count = self.count.fetch_add(1, Ordering::SeqCst) + 1;
                self.emit(ControllerEvent::CountChanged { count });
                Ok(0)
            },
            Some(MoveScript::Code(code)) => Ok(code),
            Some(MoveScript::Error(e)) => Err(e),
            Some(MoveScript::FaultDuring { error_code }) => {
                self.inject_error(error_code, 0);
                Ok(0)
            },
            Some(MoveScript::StateDuring { state }) => {
                self.inject_state(state);
                Ok(0)
            },
            Some(MoveScript::Panic(msg)) => panic!("{}", msg),
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn error_code(&self) -> i32 {
        self.error_code.load(Ordering::SeqCst)
    }

    fn run_state(&self) -> RunState {
        self.state_reads.fetch_add(1, Ordering::SeqCst);
        if let Some(next) = self.state_queue.lock().pop_front() {
            self.state.store(next.0, Ordering::SeqCst);
        }
        RunState(self.state.load(Ordering::SeqCst))
    }

    fn diagnostics(&self) -> Result<Diagnostics> {
        self.diagnostics_reads.fetch_add(1, Ordering::SeqCst);
        Ok(Diagnostics {
            connected: self.is_connected(),
            state: RunState(self.state.load(Ordering::SeqCst)),
            error_code: self.error_code(),
            warn_code: self.warn_code.load(Ordering::SeqCst),
        })
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn subscribe(
        &self,
        kind: EventKind,
        callback: Arc<dyn EventCallback>,
    ) -> Result<SubscriptionId> {
        {
            let mut journal = self.journal.lock();
            journal.subscribe_attempts.push(kind);
            journal.subscribe_at.push(Instant::now());
        }
        if kind == EventKind::CountChanged && !self.capabilities.count_events {
            return Err(ControllerError::Unsupported(kind));
        }
        Ok(self.registry.write().register(kind, callback))
    }

    fn unsubscribe(&self, id: SubscriptionId) -> Result<bool> {
        let (kind, removed) = {
            let mut registry = self.registry.write();
            let kind = registry.kind_of(id);
            (kind, registry.release(id))
        };
        self.journal.lock().releases.push(ReleaseCall { id, kind, removed });
        Ok(removed)
    }
}

impl Drop for SimulatedController {
    fn drop(&mut self) {
        if let Some(Notifier { tx, handle }) = self.notifier.take() {
            drop(tx);
            // 最后一个引用可能在通知线程的回调里释放，此时不能 join 自己
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BlendRadius, JointAngles, MotionParams};

    fn sample_move() -> JointMove {
        JointMove {
            angles: JointAngles::new([0.0; 6]),
            params: MotionParams::default(),
            radius: BlendRadius::EXACT_STOP,
            wait: true,
        }
    }

    #[test]
    fn test_scripted_results() {
        let controller = SimulatedController::new();
        controller.script_move(1, MoveScript::Code(3));
        controller.script_move(2, MoveScript::Error(ControllerError::Timeout));

        assert_eq!(controller.set_servo_angle(&sample_move()), Ok(0));
        assert_eq!(controller.set_servo_angle(&sample_move()), Ok(3));
        assert_eq!(
            controller.set_servo_angle(&sample_move()),
            Err(ControllerError::Timeout)
        );
        assert_eq!(controller.issued_moves().len(), 3);
        assert_eq!(controller.motion_count(), 1);
    }

    #[test]
    fn test_events_delivered_on_notifier_thread() {
        let controller = SimulatedController::new();
        let caller = thread::current().id();
        let off_thread = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&off_thread);
        controller
            .subscribe(
                EventKind::StateChanged,
                Arc::new(move |_: &ControllerEvent| {
                    flag.store(thread::current().id() != caller, Ordering::SeqCst);
                }),
            )
            .unwrap();

        controller.inject_state(RunState::STOPPED);
        assert!(off_thread.load(Ordering::SeqCst));
        assert_eq!(controller.run_state(), RunState::STOPPED);
    }

    #[test]
    fn test_fault_during_move_is_delivered_before_return() {
        let controller = SimulatedController::new();
        let seen = Arc::new(AtomicI32::new(0));
        let sink = Arc::clone(&seen);
        controller
            .subscribe(
                EventKind::ErrorWarnChanged,
                Arc::new(move |event: &ControllerEvent| {
                    if let ControllerEvent::ErrorWarnChanged { error_code, .. } = event {
                        sink.store(*error_code, Ordering::SeqCst);
                    }
                }),
            )
            .unwrap();
        controller.script_move(0, MoveScript::FaultDuring { error_code: 5 });

        assert_eq!(controller.set_servo_angle(&sample_move()), Ok(0));
        assert_eq!(seen.load(Ordering::SeqCst), 5);
        assert_eq!(controller.error_code(), 5);
    }

    #[test]
    fn test_count_subscription_requires_capability() {
        let controller = SimulatedController::with_capabilities(Capabilities {
            count_events: false,
        });
        let result = controller.subscribe(
            EventKind::CountChanged,
            Arc::new(|_: &ControllerEvent| {}),
        );
        assert_eq!(
            result,
            Err(ControllerError::Unsupported(EventKind::CountChanged))
        );
    }

    #[test]
    fn test_release_journal() {
        let controller = SimulatedController::new();
        let id = controller
            .subscribe(EventKind::StateChanged, Arc::new(|_: &ControllerEvent| {}))
            .unwrap();

        assert_eq!(controller.unsubscribe(id), Ok(true));
        assert_eq!(controller.unsubscribe(id), Ok(false));

        let calls = controller.release_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].kind, Some(EventKind::StateChanged));
        assert!(calls[0].removed);
        assert_eq!(calls[1].kind, None);
        assert!(!calls[1].removed);
    }

    #[test]
    fn test_state_queue() {
        let controller = SimulatedController::new();
        controller.queue_run_states([RunState::TRANSITIONAL, RunState::MOVING]);
        assert_eq!(controller.run_state(), RunState::TRANSITIONAL);
        assert_eq!(controller.run_state(), RunState::MOVING);
        assert_eq!(controller.run_state(), RunState::MOVING);
        assert_eq!(controller.run_state_reads(), 3);
    }

    #[test]
    fn test_rejected_setup_command() {
        let controller = SimulatedController::new();
        controller.reject_setup("set_mode", 12);

        assert_eq!(controller.clean_warn(), Ok(()));
        assert_eq!(
            controller.set_mode(ControlMode::Servo),
            Err(ControllerError::Rejected {
                command: "set_mode",
                code: 12
            })
        );
        // 被拒绝的命令不生效
        assert_eq!(controller.mode_code(), ControlMode::Position.code());
        assert_eq!(controller.setup_calls().len(), 2);
        assert_eq!(controller.setup_timestamps().len(), 2);
    }

    #[test]
    fn test_set_mode_and_state_apply() {
        let controller = SimulatedController::new();
        controller.set_run_state(RunState::STOPPED);

        controller.set_mode(ControlMode::JointTeaching).unwrap();
        controller.set_state(StateCommand::Start).unwrap();

        assert_eq!(controller.mode_code(), 2);
        assert_eq!(controller.run_state(), RunState::READY);
    }

    #[test]
    fn test_setup_fails_when_disconnected() {
        let controller = SimulatedController::new();
        controller.set_connected(false);
        assert_eq!(controller.clean_warn(), Err(ControllerError::NotConnected));
        assert_eq!(controller.setup_calls(), vec![SetupCall::CleanWarn]);
    }

    #[test]
    fn test_drop_joins_notifier() {
        let hits = Arc::new(AtomicUsize::new(0));
        {
            let controller = SimulatedController::new();
            let sink = Arc::clone(&hits);
            controller
                .subscribe(
                    EventKind::CountChanged,
                    Arc::new(move |_: &ControllerEvent| {
                        sink.fetch_add(1, Ordering::SeqCst);
                    }),
                )
                .unwrap();
            controller.set_servo_angle(&sample_move()).unwrap();
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
