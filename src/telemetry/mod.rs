//! 遥测与日志
//!
//! 初始化 tracing 订阅器，过滤级别由 `RUST_LOG` 控制。

use tracing_subscriber::EnvFilter;

/// 初始化全局日志订阅器
///
/// 未设置 `RUST_LOG` 时默认输出本服务的 info 级别日志。
/// 重复调用是无害的（测试里可能多次初始化）。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tutorcast=info,tower_http=info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init();
}
