//! Capacity ledger
//!
//! 每次查询都重新读取整个存储并求和，不维护增量计数。

use std::sync::Arc;

use chrono::{NaiveDate, Timelike};
use chrono_tz::Tz;
use shared::{CapacitySnapshot, ReservationRecord, ServiceWindow};
use thiserror::Error;

use crate::reservations::record_from_row;
use crate::store::{ReservationStore, StoreError};

#[derive(Debug, Error)]
pub enum LedgerError {
    /// Usage is unknown, not zero
    #[error("Reservation store unavailable: {0}")]
    Unavailable(#[from] StoreError),
}

#[derive(Debug, Clone)]
pub struct CapacityLedger {
    store: Arc<dyn ReservationStore>,
    tz: Tz,
}

impl CapacityLedger {
    pub fn new(store: Arc<dyn ReservationStore>, tz: Tz) -> Self {
        Self { store, tz }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Every readable record, in store order
    pub async fn records(&self) -> Result<Vec<ReservationRecord>, LedgerError> {
        let rows = self.store.rows().await?;
        Ok(rows
            .iter()
            .enumerate()
            .filter_map(|(i, row)| record_from_row(i, row, self.tz))
            .collect())
    }

    /// Records scheduled on `date` (business-local)
    pub async fn records_on(&self, date: NaiveDate) -> Result<Vec<ReservationRecord>, LedgerError> {
        let tz = self.tz;
        Ok(self
            .records()
            .await?
            .into_iter()
            .filter(|r| r.scheduled_at.with_timezone(&tz).date_naive() == date)
            .collect())
    }

    /// Records on `date` whose local hour lies in the window
    pub async fn records_in_window(
        &self,
        date: NaiveDate,
        window: &ServiceWindow,
    ) -> Result<Vec<ReservationRecord>, LedgerError> {
        let tz = self.tz;
        Ok(self
            .records_on(date)
            .await?
            .into_iter()
            .filter(|r| window.contains_hour(r.scheduled_at.with_timezone(&tz).hour()))
            .collect())
    }

    /// Σ party size over the window on `date`
    pub async fn used_seats(
        &self,
        date: NaiveDate,
        window: &ServiceWindow,
    ) -> Result<u32, LedgerError> {
        let records = self.records_in_window(date, window).await?;
        Ok(records
            .iter()
            .fold(0u32, |used, r| used.saturating_add(r.party_size)))
    }

    /// Display-only variant: an outage reads as 0
    pub async fn used_seats_or_zero(&self, date: NaiveDate, window: &ServiceWindow) -> u32 {
        match self.used_seats(date, window).await {
            Ok(used) => used,
            Err(e) => {
                tracing::warn!(window = %window.name, %date, error = %e, "Capacity read failed, showing 0 used");
                0
            }
        }
    }

    pub async fn snapshot(&self, date: NaiveDate, window: &ServiceWindow) -> CapacitySnapshot {
        CapacitySnapshot::compute(window, self.used_seats_or_zero(date, window).await)
    }
}
