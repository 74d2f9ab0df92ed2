//! 监督层错误类型定义

use armgate_controller::ControllerError;
use thiserror::Error;

/// 监督层错误类型
///
/// 只用于构造、配置加载和序列加载。运动序列执行期间的故障不会以错误形式抛出，
/// 而是锁存后体现在 [`RunReport`](crate::RunReport) 中。
#[derive(Error, Debug)]
pub enum SupervisorError {
    /// 控制器异常
    #[error("Controller error: {0}")]
    Controller(#[from] ControllerError),

    /// 配置无效
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// 运动序列无效
    #[error("Invalid sequence: {0}")]
    InvalidSequence(String),

    /// 文件读写错误
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML 配置解析错误
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// 序列 JSON 编解码错误
    #[error("Sequence format error: {0}")]
    SequenceFormat(#[from] serde_json::Error),
}

/// 监督层 Result 别名
pub type Result<T> = std::result::Result<T, SupervisorError>;
