//! 控制器层错误类型定义

use crate::event::EventKind;
use thiserror::Error;

/// 控制器层错误类型
///
/// 表示控制器客户端本身抛出的异常（与命令返回的非零结果码不同）。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControllerError {
    /// 控制器未连接
    #[error("Controller not connected")]
    NotConnected,

    /// 控制器不支持该事件类型
    #[error("Event kind not supported by this controller: {0}")]
    Unsupported(EventKind),

    /// 命令被控制器拒绝（非运动命令）
    #[error("Command `{command}` rejected with code {code}")]
    Rejected {
        /// 命令名称
        command: &'static str,
        /// 控制器返回码
        code: i32,
    },

    /// 通信错误
    #[error("Transport error: {0}")]
    Transport(String),

    /// 操作超时
    #[error("Operation timeout")]
    Timeout,
}

/// 控制器层 Result 别名
pub type Result<T> = std::result::Result<T, ControllerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controller_error_display() {
        assert_eq!(
            ControllerError::NotConnected.to_string(),
            "Controller not connected"
        );

        let msg = ControllerError::Unsupported(EventKind::CountChanged).to_string();
        assert!(msg.contains("count-changed"), "message: {}", msg);

        let msg = ControllerError::Rejected {
            command: "set_mode",
            code: 9,
        }
        .to_string();
        assert!(msg.contains("set_mode") && msg.contains('9'));

        let msg = ControllerError::Transport("socket reset".to_string()).to_string();
        assert!(msg.contains("Transport") && msg.contains("socket reset"));

        assert_eq!(ControllerError::Timeout.to_string(), "Operation timeout");
    }
}
