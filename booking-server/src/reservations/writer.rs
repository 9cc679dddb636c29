//! Reservation writer
//!
//! 两阶段：先写存储 (持久，失败即返回错误)，再尽力写日历
//! (失败只记 warn 并计数，不影响结果)。不做容量判定。

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Duration;
use shared::ReservationRecord;

use super::{NewReservation, SchemaCapabilities, row_for};
use crate::calendar::{CalendarEvent, CalendarService};
use crate::store::{ReservationStore, StoreError};
use crate::utils::time;

#[derive(Debug)]
pub struct ReservationWriter {
    store: Arc<dyn ReservationStore>,
    calendar: Arc<dyn CalendarService>,
    event_duration: Duration,
    time_zone: String,
    mirror_failures: AtomicU64,
}

impl ReservationWriter {
    pub fn new(
        store: Arc<dyn ReservationStore>,
        calendar: Arc<dyn CalendarService>,
        event_duration: Duration,
        time_zone: impl Into<String>,
    ) -> Self {
        Self {
            store,
            calendar,
            event_duration,
            time_zone: time_zone.into(),
            mirror_failures: AtomicU64::new(0),
        }
    }

    /// Calendar mirror failures since startup
    pub fn mirror_failures(&self) -> u64 {
        self.mirror_failures.load(Ordering::Relaxed)
    }

    pub fn calendar(&self) -> &Arc<dyn CalendarService> {
        &self.calendar
    }

    /// Append the row, then mirror it to the calendar
    pub async fn commit(
        &self,
        reservation: &NewReservation,
        caps: SchemaCapabilities,
    ) -> Result<ReservationRecord, StoreError> {
        let created_at = time::now_timestamp();
        let row = row_for(reservation, &created_at, caps);

        self.store.append(row).await.inspect_err(|e| {
            tracing::error!(name = %reservation.name, error = %e, "Failed to write reservation");
        })?;

        tracing::info!(
            name = %reservation.name,
            party_size = reservation.party_size,
            at = %reservation.scheduled_at,
            source = reservation.channel.as_source(),
            "Reservation written"
        );

        self.mirror(reservation).await;

        Ok(ReservationRecord {
            row_index: None,
            created_at,
            name: reservation.name.clone(),
            party_size: reservation.party_size,
            scheduled_at: reservation.scheduled_at.fixed_offset(),
            source: reservation.channel.as_source().to_string(),
            phone: caps.phone_email.then(|| reservation.phone.clone()).flatten(),
            email: caps.phone_email.then(|| reservation.email.clone()).flatten(),
            arrived: caps.arrival.then_some(false),
        })
    }

    async fn mirror(&self, reservation: &NewReservation) {
        if !self.calendar.is_enabled() {
            tracing::debug!("Calendar mirror disabled, skipping");
            return;
        }

        let event = CalendarEvent::for_reservation(
            &reservation.name,
            reservation.party_size,
            reservation.scheduled_at.fixed_offset(),
            self.event_duration,
            reservation.channel.as_source(),
            reservation.phone.as_deref(),
            reservation.email.as_deref(),
            &self.time_zone,
        );

        match self.calendar.insert_event(event).await {
            Ok(id) => tracing::debug!(event_id = %id, "Calendar event created"),
            Err(e) => {
                let total = self.mirror_failures.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::warn!(name = %reservation.name, error = %e, total, "Calendar mirror failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{DisabledCalendar, MemoryCalendar};
    use crate::store::MemoryStore;
    use chrono::TimeZone;
    use chrono_tz::Europe::Paris;
    use shared::{BookingChannel, columns};

    fn reservation() -> NewReservation {
        let at = Paris.with_ymd_and_hms(2026, 10, 18, 19, 30, 0).unwrap();
        NewReservation::new("Ada", 4, at, BookingChannel::Web)
            .with_email(Some("ada@example.com".into()))
    }

    #[tokio::test]
    async fn test_commit_writes_row_and_event() {
        let store = Arc::new(MemoryStore::full());
        let calendar = Arc::new(MemoryCalendar::new());
        let writer =
            ReservationWriter::new(store.clone(), calendar.clone(), Duration::minutes(120), "Europe/Paris");

        let caps = SchemaCapabilities { phone_email: true, arrival: true };
        let record = writer.commit(&reservation(), caps).await.unwrap();
        assert_eq!(record.email.as_deref(), Some("ada@example.com"));
        assert_eq!(record.arrived, Some(false));

        let rows = store.rows().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get(columns::SOURCE), Some("Webflow"));
        assert_eq!(rows[0].get(columns::ARRIVED), Some("No"));

        let events = calendar.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].end - events[0].start, Duration::hours(2));
        assert!(events[0].description.contains("ada@example.com"));
        assert_eq!(writer.mirror_failures(), 0);
    }

    #[tokio::test]
    async fn test_calendar_failure_keeps_store_write() {
        let store = Arc::new(MemoryStore::basic());
        let calendar = Arc::new(MemoryCalendar::new());
        calendar.set_failing(true);
        let writer =
            ReservationWriter::new(store.clone(), calendar, Duration::minutes(120), "Europe/Paris");

        assert!(writer.commit(&reservation(), SchemaCapabilities::default()).await.is_ok());
        assert_eq!(store.len(), 1);
        assert_eq!(writer.mirror_failures(), 1);
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let store = Arc::new(MemoryStore::basic());
        store.set_unavailable(true);
        let calendar = Arc::new(MemoryCalendar::new());
        let writer =
            ReservationWriter::new(store, calendar.clone(), Duration::minutes(120), "Europe/Paris");

        assert!(writer.commit(&reservation(), SchemaCapabilities::default()).await.is_err());
        assert!(calendar.events().is_empty());
    }

    #[tokio::test]
    async fn test_disabled_calendar_is_not_a_failure() {
        let store = Arc::new(MemoryStore::basic());
        let writer = ReservationWriter::new(
            store,
            Arc::new(DisabledCalendar),
            Duration::minutes(120),
            "Europe/Paris",
        );
        writer.commit(&reservation(), SchemaCapabilities::default()).await.unwrap();
        assert_eq!(writer.mirror_failures(), 0);
    }
}
