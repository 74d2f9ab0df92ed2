//! 回调注册表
//!
//! 按事件类型管理订阅回调，供控制器实现复用。
//!
//! # 设计原则
//!
//! - **快照派发**: [`dispatch`] 在读锁内复制回调列表，释放锁后再调用，
//!   因此回调可以在被派发期间取消自己的订阅（一次性回调）
//! - **稳定句柄**: 每次注册返回唯一的 [`SubscriptionId`]，取消订阅只需句柄
//!
//! # 示例
//!
//! ```rust
//! use armgate_controller::{CallbackRegistry, ControllerEvent, EventKind, dispatch};
//! use parking_lot::RwLock;
//! use std::sync::Arc;
//!
//! let registry = RwLock::new(CallbackRegistry::new());
//! let id = registry.write().register(
//!     EventKind::CountChanged,
//!     Arc::new(|event: &ControllerEvent| println!("{:?}", event)),
//! );
//!
//! let delivered = dispatch(&registry, &ControllerEvent::CountChanged { count: 1 });
//! assert_eq!(delivered, 1);
//!
//! assert!(registry.write().release(id));
//! ```

use parking_lot::RwLock;
use std::sync::Arc;
use tracing::trace;

use crate::event::{ControllerEvent, EventCallback, EventKind, SubscriptionId};

struct Entry {
    id: SubscriptionId,
    kind: EventKind,
    callback: Arc<dyn EventCallback>,
}

/// 回调注册表
///
/// 本身不是线程安全的，需要外部同步（通常是 `parking_lot::RwLock<CallbackRegistry>`）。
#[derive(Default)]
pub struct CallbackRegistry {
    next_id: u64,
    entries: Vec<Entry>,
}

impl CallbackRegistry {
    /// 创建空注册表
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next_id: 1,
            entries: Vec::new(),
        }
    }

    /// 注册回调，返回订阅句柄
    pub fn register(
        &mut self,
        kind: EventKind,
        callback: Arc<dyn EventCallback>,
    ) -> SubscriptionId {
        // Default 派生的 next_id 为 0，统一从 1 开始
        let id = SubscriptionId(self.next_id.max(1));
        self.next_id = id.0 + 1;
        self.entries.push(Entry { id, kind, callback });
        id
    }

    /// 取消订阅
    ///
    /// 返回 `true` 表示句柄存在并已移除；重复取消返回 `false`。
    pub fn release(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    /// 查询句柄对应的事件类型
    pub fn kind_of(&self, id: SubscriptionId) -> Option<EventKind> {
        self.entries.iter().find(|e| e.id == id).map(|e| e.kind)
    }

    /// 复制某类事件的全部回调
    pub fn snapshot(&self, kind: EventKind) -> Vec<Arc<dyn EventCallback>> {
        self.entries
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| Arc::clone(&e.callback))
            .collect()
    }

    /// 某类事件的订阅数量
    pub fn count(&self, kind: EventKind) -> usize {
        self.entries.iter().filter(|e| e.kind == kind).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 向某类事件的全部订阅者派发事件
///
/// 回调在调用方线程上执行，执行期间不持有锁。返回被调用的回调数量。
pub fn dispatch(registry: &RwLock<CallbackRegistry>, event: &ControllerEvent) -> usize {
    let callbacks = registry.read().snapshot(event.kind());
    trace!(kind = %event.kind(), listeners = callbacks.len(), "Dispatching controller event");
    for callback in &callbacks {
        callback.on_event(event);
    }
    callbacks.len()
}
