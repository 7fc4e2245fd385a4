//! 配置管理模块
//!
//! 进程配置在启动时从环境变量构建一次，之后以只读方式注入各组件，
//! 核心逻辑不读取任何全局状态。

mod types;

pub use types::{Config, ConfigError, StreamConfig};
