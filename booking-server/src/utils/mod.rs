//! 工具模块 - 通用工具函数和类型
//!
//! # 内容
//!
//! - [`AppError`] - HTTP 层错误类型
//! - [`logger`] - 日志初始化
//! - [`time`] - 业务时区转换

pub mod error;
pub mod logger;
pub mod time;

pub use error::{AppError, AppResult};
