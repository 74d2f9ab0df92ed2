//! 机械臂控制器边界
//!
//! 本 crate 定义监督层与外部机械臂控制器之间的全部接口：
//! - 命令（清错、使能、模式/状态切换、关节运动）
//! - 实时属性（连接状态、错误码、运行状态）
//! - 事件订阅（错误/警告变化、运行状态变化、运动计数变化）
//! - 可选能力标志（部分控制器不支持计数事件）
//!
//! 控制器的通信协议、轨迹规划与伺服控制都不在本 crate 范围内，
//! 具体实现只需满足 [`ArmController`] trait。
//!
//! # Feature Flags
//!
//! - `mock` - 启用 [`mock::SimulatedController`]（无硬件，用于测试和演示）
//! - `serde` - 为数据类型派生 `Serialize`/`Deserialize`

mod controller;
mod error;
pub mod event;
pub mod registry;
pub mod types;

#[cfg(feature = "mock")]
pub mod mock;

pub use controller::ArmController;
pub use error::{ControllerError, Result};
pub use event::{ControllerEvent, EventCallback, EventKind, SubscriptionId};
pub use registry::{CallbackRegistry, dispatch};
pub use types::*;
