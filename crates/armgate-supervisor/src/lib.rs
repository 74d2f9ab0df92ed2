//! 运动监督层
//!
//! 在外部机械臂控制器之上按顺序执行预先录制的关节路点，
//! 并根据控制器上报的错误、运行状态与连接状态决定是否允许继续下发命令。
//!
//! # 模块
//!
//! - `latch` - 单向存活锁存器（原子标志 + 首个故障记录）
//! - `supervisor` - 初始化、存活判定、命令检查、序列执行、终止流程、事件回调
//! - `sequence` - 路点序列（内置录制序列 / JSON 文件）
//! - `config` - 监督器配置（TOML）
//! - `logging` - tracing 日志初始化
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use armgate_supervisor::{MotionSequence, MotionSupervisor, SupervisorConfig};
//! # use armgate_controller::ArmController;
//! # use std::sync::Arc;
//! # fn example<C: ArmController + 'static>(controller: Arc<C>) -> armgate_supervisor::Result<()> {
//! armgate_supervisor::init_logging();
//!
//! let supervisor = MotionSupervisor::new(controller, SupervisorConfig::default())?;
//! let report = supervisor.run(&MotionSequence::recorded());
//! assert!(!supervisor.latch().is_alive());
//! # let _ = report;
//! # Ok(())
//! # }
//! ```

pub mod config;
mod error;
pub mod latch;
mod logging;
pub mod sequence;
pub mod supervisor;

pub use config::SupervisorConfig;
pub use error::{Result, SupervisorError};
pub use latch::{LivenessLatch, TripRecord};
pub use logging::{init_logging, init_logging_with};
pub use sequence::{MotionSequence, Waypoint};
pub use supervisor::{MotionSupervisor, RunOutcome, RunReport};
