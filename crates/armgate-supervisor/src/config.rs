//! 监督器配置
//!
//! TOML 格式，所有字段都有默认值：
//!
//! ```toml
//! mode = "position"
//! settle_delay_ms = 1000
//! transitional_poll_interval_ms = 100
//! transitional_max_polls = 5
//!
//! [motion]
//! speed = 20.0
//! acceleration = 200.0
//! ```

use armgate_controller::{ControlMode, MotionParams};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{Result, SupervisorError};

/// 监督器配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// 初始化时设置的控制模式
    pub mode: ControlMode,

    /// 模式/状态切换后的稳定等待（毫秒，必须大于 0）
    pub settle_delay_ms: u64,

    /// 运行状态处于切换中时的轮询间隔（毫秒）
    pub transitional_poll_interval_ms: u64,

    /// 运行状态处于切换中时的最大轮询次数
    pub transitional_max_polls: u32,

    /// 所有关节运动共用的速度/加速度
    pub motion: MotionParams,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            mode: ControlMode::Position,
            settle_delay_ms: 1000,
            transitional_poll_interval_ms: 100,
            transitional_max_polls: 5,
            motion: MotionParams::default(),
        }
    }
}

impl SupervisorConfig {
    /// 从 TOML 字符串解析并校验
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SupervisorConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 从文件加载配置
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.settle_delay_ms == 0 {
            return Err(SupervisorError::InvalidConfig(
                "settle_delay_ms must be non-zero: the controller needs time to apply mode/state"
                    .to_string(),
            ));
        }
        if !self.motion.is_valid() {
            return Err(SupervisorError::InvalidConfig(format!(
                "motion speed/acceleration must be finite and positive (speed={}, acceleration={})",
                self.motion.speed, self.motion.acceleration
            )));
        }
        if self.transitional_max_polls > 0 && self.transitional_poll_interval_ms == 0 {
            return Err(SupervisorError::InvalidConfig(
                "transitional_poll_interval_ms must be non-zero when polling is enabled"
                    .to_string(),
            ));
        }
        Ok(())
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn transitional_poll_interval(&self) -> Duration {
        Duration::from_millis(self.transitional_poll_interval_ms)
    }
}
