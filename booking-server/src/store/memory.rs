//! In-memory reservation store
//!
//! Backs `STORE_BACKEND=memory` and the test suite. The `unavailable`
//! switch simulates a store outage.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use shared::columns;

use super::{ReservationStore, StoreError, StoreResult, StoreRow};

#[derive(Debug, Default)]
pub struct MemoryStore {
    headers: RwLock<Vec<String>>,
    rows: RwLock<Vec<StoreRow>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: RwLock::new(headers.iter().map(|h| h.to_string()).collect()),
            rows: RwLock::new(Vec::new()),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Required columns only (no phone/email, no arrival tracking)
    pub fn basic() -> Self {
        Self::new(&columns::REQUIRED)
    }

    /// Required + PhoneNumber, Email, Arrived
    pub fn full() -> Self {
        let mut headers = columns::REQUIRED.to_vec();
        headers.extend([columns::PHONE_NUMBER, columns::EMAIL, columns::ARRIVED]);
        Self::new(&headers)
    }

    /// Replace the header row (e.g. a column added by hand)
    pub fn set_headers(&self, headers: &[&str]) {
        *self.headers.write() = headers.iter().map(|h| h.to_string()).collect();
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Seed a row without going through the header filter
    pub fn push_raw(&self, row: StoreRow) {
        self.rows.write().push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store switched off".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ReservationStore for MemoryStore {
    async fn headers(&self) -> StoreResult<Vec<String>> {
        self.check_available()?;
        Ok(self.headers.read().clone())
    }

    async fn rows(&self) -> StoreResult<Vec<StoreRow>> {
        self.check_available()?;
        Ok(self.rows.read().clone())
    }

    async fn append(&self, row: StoreRow) -> StoreResult<()> {
        self.check_available()?;
        let headers = self.headers.read().clone();
        let filtered = StoreRow::from_ordered(&headers, &row.to_ordered(&headers));
        self.rows.write().push(filtered);
        Ok(())
    }

    async fn update_cell(&self, row_index: usize, column: &str, value: &str) -> StoreResult<()> {
        self.check_available()?;
        if !self.headers.read().iter().any(|h| h == column) {
            return Err(StoreError::UnknownColumn(column.to_string()));
        }
        let mut rows = self.rows.write();
        let row = rows
            .get_mut(row_index)
            .ok_or(StoreError::RowNotFound(row_index))?;
        row.set(column, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_append_drops_unknown_columns() {
        let store = MemoryStore::basic();
        store
            .append(StoreRow::new().with("Name", "Ada").with("Email", "ada@example.com"))
            .await
            .unwrap();

        let rows = store.rows().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("Name"), Some("Ada"));
        assert_eq!(rows[0].get("Email"), None);
    }

    #[tokio::test]
    async fn test_update_cell() {
        let store = MemoryStore::full();
        store.append(StoreRow::new().with("Name", "Ada")).await.unwrap();

        store.update_cell(0, "Arrived", "Yes").await.unwrap();
        assert_eq!(store.rows().await.unwrap()[0].get("Arrived"), Some("Yes"));

        assert!(matches!(
            store.update_cell(3, "Arrived", "Yes").await,
            Err(StoreError::RowNotFound(3))
        ));
        assert!(matches!(
            store.update_cell(0, "Table", "7").await,
            Err(StoreError::UnknownColumn(_))
        ));
    }

    #[tokio::test]
    async fn test_unavailable_switch() {
        let store = MemoryStore::basic();
        store.set_unavailable(true);
        assert!(matches!(store.rows().await, Err(StoreError::Unavailable(_))));
        store.set_unavailable(false);
        assert!(store.rows().await.is_ok());
    }
}
