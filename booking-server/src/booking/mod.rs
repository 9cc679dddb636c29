//! 预订策略 (booking policy)
//!
//! 按渠道包装准入判定：
//!
//! | 渠道 | 全局开关 | 准入 | 被拒后 |
//! |------|----------|------|--------|
//! | Web (Webflow) | 检查 → 423 | 是 | 直接失败 |
//! | Chat (Phone) | - | 是 | 进入候补名单 |
//! | Manual | - | 否 | - |
//!
//! 同一 `(date, window)` 的 check + write 在一把异步锁内串行执行，
//! 避免两个并发预订读到同一剩余座位而超订。

pub mod waitlist;

pub use waitlist::WaitlistRegister;

use std::sync::Arc;

use chrono::{NaiveDate, Timelike};
use dashmap::DashMap;
use shared::{BookingChannel, MAX_PARTY_SIZE, ReservationRecord};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::capacity::{AdmissionController, AdmissionDecision, Rejection};
use crate::reservations::{NewReservation, ReservationWriter, SchemaCapabilities};
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("Online booking is closed")]
    OnlineBookingClosed,

    #[error("Reservation rejected: {}", .0.reason)]
    Rejected(Rejection),

    #[error("Reservation waitlisted as {entry_id}: {}", .rejection.reason)]
    Waitlisted { rejection: Rejection, entry_id: String },

    #[error("Invalid reservation: {0}")]
    Invalid(String),

    #[error("Failed to write reservation: {0}")]
    Write(#[from] StoreError),
}

/// Successful booking
#[derive(Debug, Clone)]
pub struct Booked {
    pub record: ReservationRecord,
    /// Window the booking landed in (manual bookings may have none)
    pub service: Option<String>,
    /// Seats left after this booking; `None` when admission was bypassed
    pub remaining: Option<u32>,
}

type WindowKey = (NaiveDate, String);

#[derive(Debug)]
pub struct BookingService {
    admission: AdmissionController,
    writer: Arc<ReservationWriter>,
    waitlist: Arc<WaitlistRegister>,
    locks: DashMap<WindowKey, Arc<Mutex<()>>>,
}

impl BookingService {
    pub fn new(
        admission: AdmissionController,
        writer: Arc<ReservationWriter>,
        waitlist: Arc<WaitlistRegister>,
    ) -> Self {
        Self {
            admission,
            writer,
            waitlist,
            locks: DashMap::new(),
        }
    }

    pub fn admission(&self) -> &AdmissionController {
        &self.admission
    }

    pub fn writer(&self) -> &Arc<ReservationWriter> {
        &self.writer
    }

    pub fn waitlist(&self) -> &Arc<WaitlistRegister> {
        &self.waitlist
    }

    /// Apply the channel policy and, when admitted, write the reservation
    pub async fn book(
        &self,
        reservation: NewReservation,
        caps: SchemaCapabilities,
    ) -> Result<Booked, BookingError> {
        if reservation.name.trim().is_empty() {
            return Err(BookingError::Invalid("name is required".into()));
        }
        if reservation.party_size == 0 {
            return Err(BookingError::Invalid("party size must be at least 1".into()));
        }
        if reservation.party_size > MAX_PARTY_SIZE {
            return Err(BookingError::Invalid(format!(
                "party size must be at most {MAX_PARTY_SIZE}"
            )));
        }

        let settings = self.admission.settings();
        let local = reservation
            .scheduled_at
            .with_timezone(&self.admission.ledger().timezone());
        let window = settings.classify(local.hour());

        if !reservation.channel.requires_admission() {
            let record = self.writer.commit(&reservation, caps).await?;
            return Ok(Booked {
                record,
                service: window.map(|w| w.name),
                remaining: None,
            });
        }

        if reservation.channel == BookingChannel::Web && settings.online_booking_blocked() {
            tracing::info!(name = %reservation.name, "Online booking closed, request refused");
            return Err(BookingError::OnlineBookingClosed);
        }

        // Outside all windows the check rejects without touching the store
        let lock = window.map(|w| {
            self.locks
                .entry((local.date_naive(), w.name))
                .or_default()
                .clone()
        });
        let _guard = match &lock {
            Some(lock) => Some(lock.lock().await),
            None => None,
        };

        match self
            .admission
            .check(&reservation.scheduled_at, reservation.party_size)
            .await
        {
            AdmissionDecision::Admitted { service, remaining } => {
                let record = self.writer.commit(&reservation, caps).await?;
                Ok(Booked {
                    record,
                    service: Some(service),
                    remaining: Some(remaining),
                })
            }
            AdmissionDecision::Rejected(rejection) => {
                tracing::info!(
                    name = %reservation.name,
                    party_size = reservation.party_size,
                    channel = %reservation.channel,
                    reason = %rejection.reason,
                    "Reservation rejected"
                );
                if reservation.channel.supports_waitlist() {
                    let entry_id = self.waitlist.add(&reservation);
                    Err(BookingError::Waitlisted {
                        rejection,
                        entry_id,
                    })
                } else {
                    Err(BookingError::Rejected(rejection))
                }
            }
        }
    }

    /// Drop admission locks of past dates
    pub fn prune_locks_before(&self, date: NaiveDate) -> usize {
        let before = self.locks.len();
        self.locks.retain(|(d, _), _| *d >= date);
        before - self.locks.len()
    }
}
