//! 统一错误处理
//!
//! HTTP 层错误类型 [`AppError`]，实现 `IntoResponse`。
//!
//! # 错误码规范
//!
//! | 错误码 | HTTP | 说明 |
//! |--------|------|------|
//! | E0002 | 400 | 请求字段缺失或格式错误 |
//! | E0003 | 404 | 资源不存在 |
//! | E0004 | 409 | 容量不足 / 时段关闭 / 非营业时间 |
//! | E0007 | 423 | 在线预订已全局关闭 |
//! | E0008 | 503 | 无法读取当前容量 (存储不可用) |
//! | E9001 | 500 | 内部错误 (详情只写日志) |

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

/// 错误响应结构
///
/// ```json
/// {
///   "code": "E0004",
///   "error": "Service unavailable",
///   "message": "Dinner: insufficient capacity (5 seats left, 6 requested)",
///   "fullBooking": true
/// }
/// ```
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub code: String,
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_booking: Option<bool>,
}

/// 应用错误枚举
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation failed: {0}")]
    /// 字段缺失/格式错误 (400)
    Validation(String),

    #[error("Resource not found: {0}")]
    /// 资源不存在 (404)
    NotFound(String),

    #[error("Service unavailable: {0}")]
    /// 容量拒绝 (409)
    CapacityRejected(String),

    #[error("Online bookings are temporarily closed")]
    /// 在线预订全局关闭 (423)
    OnlineBookingClosed,

    #[error("Capacity unknown: {0}")]
    /// 容量无法确认，可重试 (503)
    CapacityUnknown(String),

    #[error("Internal server error: {0}")]
    /// 内部错误 (500)
    Internal(String),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::CapacityRejected(_) => StatusCode::CONFLICT,
            Self::OnlineBookingClosed => StatusCode::LOCKED,
            Self::CapacityUnknown(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::Validation(msg) => ErrorBody {
                code: "E0002".to_string(),
                error: "Invalid request".to_string(),
                message: msg.clone(),
                full_booking: None,
            },
            AppError::NotFound(msg) => ErrorBody {
                code: "E0003".to_string(),
                error: "Not found".to_string(),
                message: msg.clone(),
                full_booking: None,
            },
            AppError::CapacityRejected(msg) => ErrorBody {
                code: "E0004".to_string(),
                error: "Service unavailable".to_string(),
                message: msg.clone(),
                full_booking: Some(true),
            },
            AppError::OnlineBookingClosed => ErrorBody {
                code: "E0007".to_string(),
                error: "Online bookings temporarily closed".to_string(),
                message: "Please call the restaurant directly.".to_string(),
                full_booking: None,
            },
            AppError::CapacityUnknown(msg) => ErrorBody {
                code: "E0008".to_string(),
                error: "Capacity unavailable".to_string(),
                message: msg.clone(),
                full_booking: None,
            },
            AppError::Internal(msg) => {
                // 记录内部错误但不暴露详细信息
                error!(target: "internal", error = %msg, "Internal error occurred");
                ErrorBody {
                    code: "E9001".to_string(),
                    error: "Server error".to_string(),
                    message: "An internal error occurred".to_string(),
                    full_booking: None,
                }
            }
        };

        (status, Json(body)).into_response()
    }
}

/// 处理器的 Result 类型别名
pub type AppResult<T> = Result<T, AppError>;
