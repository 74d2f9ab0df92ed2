//! 存活锁存器
//!
//! 单向锁存：从"存活"到"停止"只能跳变一次，之后不可复位。
//!
//! # 设计目标
//!
//! - **热路径无锁**: `is_alive()` 只读一个原子标志（Acquire）
//! - **首个故障生效**: 多个故障源并发触发时只记录第一个原因
//! - **无 Poison**: 使用 parking_lot::RwLock 保存触发记录
//!
//! ```text
//! ┌─────────────────┐
//! │  LivenessLatch  │
//! ├─────────────────┤
//! │ alive           │ ← AtomicBool (快速检查)
//! │ record          │ ← RwLock<Option<TripRecord>> (首个故障)
//! └─────────────────┘
//! ```

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// 锁存触发记录
#[derive(Debug, Clone)]
pub struct TripRecord {
    /// 触发原因
    pub reason: String,
    /// 触发时间
    pub at: Instant,
}

/// 存活锁存器
#[derive(Debug)]
pub struct LivenessLatch {
    alive: AtomicBool,
    record: RwLock<Option<TripRecord>>,
}

impl LivenessLatch {
    /// 创建处于存活状态的锁存器
    pub fn new() -> Self {
        Self {
            alive: AtomicBool::new(true),
            record: RwLock::new(None),
        }
    }

    /// 快速检查是否存活（热路径）
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// 触发锁存
    ///
    /// 返回 `true` 表示本次调用完成了跳变；已经停止时返回 `false`，原因不会被覆盖。
    ///
    /// # 内存序
    ///
    /// 在写锁内先写入记录，再以 Release 语义清除标志，
    /// 读到 `false` 的线程一定能看到完整的触发记录。
    pub fn trip(&self, reason: impl Into<String>) -> bool {
        let mut record = self.record.write();
        if !self.alive.load(Ordering::Acquire) {
            return false;
        }
        *record = Some(TripRecord {
            reason: reason.into(),
            at: Instant::now(),
        });
        self.alive.store(false, Ordering::Release);
        true
    }

    /// 首个触发原因
    pub fn trip_reason(&self) -> Option<String> {
        self.record.read().as_ref().map(|r| r.reason.clone())
    }

    /// 首个触发记录（原因与时间）
    pub fn trip_record(&self) -> Option<TripRecord> {
        self.record.read().clone()
    }
}

impl Default for LivenessLatch {
    fn default() -> Self {
        Self::new()
    }
}
