//! 网站预订入口
//!
//! `POST /webhook`，JSON 请求体：
//!
//! ```json
//! { "name": "Ada", "partySize": "4", "dateTime": "2026-10-20T19:30:00", "email": "ada@example.com" }
//! ```
//!
//! | 结果 | HTTP |
//! |------|------|
//! | 预订成功 | 200 `{success, remaining, service}` |
//! | 字段缺失/格式错误 | 400 |
//! | 容量不足 / 时段关闭 / 非营业时间 | 409 |
//! | 在线预订已关闭 | 423 |
//! | 存储不可用，容量无法确认 | 503 |
//! | 写入失败 | 500 |

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::post,
};
use serde::{Deserialize, Serialize};
use shared::{BookingChannel, MAX_PARTY_SIZE};

use crate::booking::BookingError;
use crate::bot::render;
use crate::capacity::RejectionReason;
use crate::core::ServerState;
use crate::reservations::NewReservation;
use crate::utils::{AppError, AppResult, time};

pub fn router() -> Router<ServerState> {
    Router::new().route("/webhook", post(create_booking))
}

/// `partySize` arrives as a number or a numeric string
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PartySize {
    Number(i64),
    Text(String),
}

impl PartySize {
    fn value(&self) -> Option<u32> {
        let n = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse().ok()?,
        };
        u32::try_from(n)
            .ok()
            .filter(|n| (1..=MAX_PARTY_SIZE).contains(n))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub name: Option<String>,
    pub party_size: Option<PartySize>,
    pub date_time: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    success: bool,
    remaining: Option<u32>,
    service: Option<String>,
}

pub async fn create_booking(
    State(state): State<ServerState>,
    payload: Result<Json<BookingRequest>, JsonRejection>,
) -> AppResult<Json<BookingResponse>> {
    let Json(request) = payload.map_err(|e| AppError::validation(e.body_text()))?;
    let reservation = to_reservation(request, &state)?;

    let booked = state
        .booking
        .book(reservation, state.schema.current())
        .await
        .map_err(into_app_error)?;

    state
        .notifier
        .notify(&render::staff_new_booking(&booked.record, state.tz()))
        .await;

    Ok(Json(BookingResponse {
        success: true,
        remaining: booked.remaining,
        service: booked.service,
    }))
}

fn to_reservation(request: BookingRequest, state: &ServerState) -> AppResult<NewReservation> {
    let name = request
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::validation("name is required"))?;
    let party_size = request
        .party_size
        .ok_or_else(|| AppError::validation("partySize is required"))?
        .value()
        .ok_or_else(|| AppError::validation("partySize must be a positive integer"))?;
    let raw = request
        .date_time
        .ok_or_else(|| AppError::validation("dateTime is required"))?;
    let at = time::parse_instant(&raw, state.tz())
        .ok_or_else(|| AppError::validation(format!("dateTime is not a valid date: {raw}")))?;

    Ok(NewReservation::new(name, party_size, at, BookingChannel::Web).with_email(request.email))
}

fn into_app_error(error: BookingError) -> AppError {
    match error {
        BookingError::OnlineBookingClosed => AppError::OnlineBookingClosed,
        BookingError::Rejected(rejection) | BookingError::Waitlisted { rejection, .. }
            if rejection.reason == RejectionReason::CapacityUnknown =>
        {
            AppError::CapacityUnknown(rejection.message())
        }
        BookingError::Rejected(rejection) | BookingError::Waitlisted { rejection, .. } => {
            AppError::CapacityRejected(rejection.message())
        }
        BookingError::Invalid(msg) => AppError::validation(msg),
        BookingError::Write(e) => AppError::internal(e.to_string()),
    }
}
