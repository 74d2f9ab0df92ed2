//! 控制器异步事件
//!
//! 控制器在自己的通知线程上投递事件，回调必须是非阻塞的：
//! 只允许原子标志更新和日志输出。

use std::fmt;

use crate::types::RunState;

/// 事件类型（订阅通道）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// 错误/警告码变化
    ErrorWarnChanged,
    /// 运行状态变化
    StateChanged,
    /// 运动计数变化（可选能力）
    CountChanged,
}

impl EventKind {
    pub const ALL: [EventKind; 3] = [
        EventKind::ErrorWarnChanged,
        EventKind::StateChanged,
        EventKind::CountChanged,
    ];
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ErrorWarnChanged => "error-warn-changed",
            Self::StateChanged => "state-changed",
            Self::CountChanged => "count-changed",
        })
    }
}

/// 控制器事件负载
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerEvent {
    ErrorWarnChanged { error_code: i32, warn_code: i32 },
    StateChanged { state: RunState },
    CountChanged { count: u64 },
}

impl ControllerEvent {
    /// 事件所属的订阅通道
    pub fn kind(&self) -> EventKind {
        match self {
            Self::ErrorWarnChanged { .. } => EventKind::ErrorWarnChanged,
            Self::StateChanged { .. } => EventKind::StateChanged,
            Self::CountChanged { .. } => EventKind::CountChanged,
        }
    }
}

/// 订阅句柄，用于取消订阅
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

/// 事件回调 Trait
///
/// # 性能要求
///
/// - **非阻塞**: 回调运行在控制器的通知线程上
/// - **禁止 sleep / 等待**: 只做原子操作和日志
///
/// 闭包 `Fn(&ControllerEvent) + Send + Sync` 自动实现本 trait。
pub trait EventCallback: Send + Sync {
    fn on_event(&self, event: &ControllerEvent);
}

impl<F> EventCallback for F
where
    F: Fn(&ControllerEvent) + Send + Sync,
{
    fn on_event(&self, event: &ControllerEvent) {
        self(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_mapping() {
        let event = ControllerEvent::ErrorWarnChanged {
            error_code: 5,
            warn_code: 0,
        };
        assert_eq!(event.kind(), EventKind::ErrorWarnChanged);
        assert_eq!(
            ControllerEvent::StateChanged {
                state: RunState::STOPPED
            }
            .kind(),
            EventKind::StateChanged
        );
        assert_eq!(
            ControllerEvent::CountChanged { count: 3 }.kind(),
            EventKind::CountChanged
        );
    }

    #[test]
    fn test_closure_callback() {
        use std::sync::atomic::{AtomicU64, Ordering};

        let seen = AtomicU64::new(0);
        let callback = |event: &ControllerEvent| {
            if let ControllerEvent::CountChanged { count } = event {
                seen.store(*count, Ordering::Relaxed);
            }
        };
        callback.on_event(&ControllerEvent::CountChanged { count: 7 });
        assert_eq!(seen.load(Ordering::Relaxed), 7);
    }
}
