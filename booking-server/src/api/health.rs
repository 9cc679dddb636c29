//! 健康检查路由
//!
//! # 路由列表
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | / | GET | 简单健康检查 |
//! | /health | GET | 简单健康检查 |
//! | /health/detailed | GET | 详细健康检查 (含存储探测) |
//!
//! # 响应示例
//!
//! ```json
//! {
//!   "status": "ok",
//!   "service": "booking-server",
//!   "timestamp": "2026-10-18T12:00:00Z"
//! }
//! ```

use std::time::Instant;

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::core::ServerState;
use crate::reservations::SchemaCapabilities;
use crate::utils::time;

const SERVICE_NAME: &str = env!("CARGO_PKG_NAME");

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/health/detailed", get(detailed_health))
}

/// 简单健康检查响应
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    service: &'static str,
    timestamp: String,
}

/// 详细健康检查响应
#[derive(Debug, Serialize)]
pub struct DetailedHealthResponse {
    /// ok | degraded
    status: &'static str,
    service: &'static str,
    version: &'static str,
    timestamp: String,
    /// 运行时间 (秒)
    uptime_seconds: u64,
    schema: SchemaCapabilities,
    checks: HealthChecks,
    /// 日历镜像失败次数 (进程启动以来)
    calendar_mirror_failures: u64,
    calendar_enabled: bool,
    online_booking_blocked: bool,
    waitlist_size: usize,
    active_sessions: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthChecks {
    store: CheckResult,
}

/// 单项检查结果
#[derive(Debug, Serialize)]
pub struct CheckResult {
    /// ok | error
    status: &'static str,
    /// 延迟 (毫秒)
    latency_ms: Option<u64>,
    message: Option<String>,
}

impl CheckResult {
    fn ok_with_latency(latency_ms: u64) -> Self {
        Self {
            status: "ok",
            latency_ms: Some(latency_ms),
            message: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            latency_ms: None,
            message: Some(message.into()),
        }
    }
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: SERVICE_NAME,
        timestamp: time::now_timestamp(),
    })
}

/// 包含组件状态的详细健康检查
pub async fn detailed_health(State(state): State<ServerState>) -> Json<DetailedHealthResponse> {
    let start = Instant::now();
    let store = match state.store.headers().await {
        Ok(_) => CheckResult::ok_with_latency(start.elapsed().as_millis() as u64),
        Err(e) => CheckResult::error(e.to_string()),
    };
    let status = if store.status == "ok" { "ok" } else { "degraded" };

    Json(DetailedHealthResponse {
        status,
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        timestamp: time::now_timestamp(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        schema: state.schema.current(),
        checks: HealthChecks { store },
        calendar_mirror_failures: state.booking.writer().mirror_failures(),
        calendar_enabled: state.calendar().is_enabled(),
        online_booking_blocked: state.settings.online_booking_blocked(),
        waitlist_size: state.waitlist().len(),
        active_sessions: state.sessions.len(),
    })
}
