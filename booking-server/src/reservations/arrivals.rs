//! Arrival tracking
//!
//! 当日某时段的预订列表、到店标记切换 (last-write-wins)、到店统计。

use std::sync::Arc;

use chrono::NaiveDate;
use shared::{ArrivalStats, ReservationRecord, ServiceWindow, columns, format_arrived};
use thiserror::Error;

use super::{SchemaRegistry, record_from_row};
use crate::capacity::{CapacityLedger, CapacitySettings, LedgerError};
use crate::store::{ReservationStore, StoreError};
use crate::utils::time;

#[derive(Debug, Error)]
pub enum ArrivalError {
    #[error("Store has no Arrived column")]
    NotSupported,

    #[error("Unknown service window: {0}")]
    UnknownWindow(String),

    #[error("Reservation row {0} not found")]
    RowNotFound(usize),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

#[derive(Debug, Clone)]
pub struct ArrivalTracker {
    store: Arc<dyn ReservationStore>,
    ledger: CapacityLedger,
    settings: Arc<CapacitySettings>,
    schema: Arc<SchemaRegistry>,
}

impl ArrivalTracker {
    pub fn new(
        store: Arc<dyn ReservationStore>,
        ledger: CapacityLedger,
        settings: Arc<CapacitySettings>,
        schema: Arc<SchemaRegistry>,
    ) -> Self {
        Self {
            store,
            ledger,
            settings,
            schema,
        }
    }

    pub fn is_supported(&self) -> bool {
        self.schema.current().arrival
    }

    fn window(&self, name: &str) -> Result<ServiceWindow, ArrivalError> {
        self.settings
            .window(name)
            .ok_or_else(|| ArrivalError::UnknownWindow(name.to_string()))
    }

    /// Records of `window` on `date`, earliest first
    pub async fn list_for(
        &self,
        date: NaiveDate,
        window: &str,
    ) -> Result<Vec<ReservationRecord>, ArrivalError> {
        let window = self.window(window)?;
        let mut records = self.ledger.records_in_window(date, &window).await?;
        records.sort_by_key(|r| r.scheduled_at);
        Ok(records)
    }

    pub async fn list_today(&self, window: &str) -> Result<Vec<ReservationRecord>, ArrivalError> {
        self.list_for(time::today(self.ledger.timezone()), window).await
    }

    /// Flip the arrived flag of one row, returning the new value.
    /// Reads the row again first; concurrent toggles are last-write-wins.
    pub async fn toggle(&self, row_index: usize) -> Result<bool, ArrivalError> {
        if !self.is_supported() {
            return Err(ArrivalError::NotSupported);
        }

        let rows = self.store.rows().await?;
        let record = rows
            .get(row_index)
            .and_then(|row| record_from_row(row_index, row, self.ledger.timezone()))
            .ok_or(ArrivalError::RowNotFound(row_index))?;

        let arrived = !record.has_arrived();
        self.store
            .update_cell(row_index, columns::ARRIVED, format_arrived(arrived))
            .await?;
        tracing::info!(row = row_index, name = %record.name, arrived, "Arrival toggled");
        Ok(arrived)
    }

    pub async fn stats_for(&self, date: NaiveDate, window: &str) -> Result<ArrivalStats, ArrivalError> {
        let records = self.list_for(date, window).await?;
        Ok(ArrivalStats::from_parties(
            records.iter().map(|r| (r.party_size, r.has_arrived())),
        ))
    }

    pub async fn stats_today(&self, window: &str) -> Result<ArrivalStats, ArrivalError> {
        self.stats_for(time::today(self.ledger.timezone()), window).await
    }
}
