//! 日志初始化
//!
//! 每条日志带时间戳和调用位置（文件:行号），`RUST_LOG` 可覆盖默认过滤规则。

use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVES: &str = "armgate_supervisor=info,armgate_controller=info";

/// 使用默认过滤规则初始化全局日志
///
/// 重复调用是安全的，已安装的订阅者不会被替换。
pub fn init_logging() -> bool {
    init_logging_with(DEFAULT_DIRECTIVES)
}

/// 使用指定的默认过滤规则初始化全局日志
///
/// 返回 `true` 表示本次调用安装了订阅者。
pub fn init_logging_with(default_directives: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .try_init()
        .is_ok()
}
