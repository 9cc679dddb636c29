use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use parking_lot::Mutex;

use super::{CalendarEntry, CalendarError, CalendarEvent, CalendarResult, CalendarService};

/// Process-local calendar for development and tests
#[derive(Debug, Default)]
pub struct MemoryCalendar {
    events: Mutex<Vec<(String, CalendarEvent)>>,
    failing: AtomicBool,
}

impl MemoryCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail until switched back
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<CalendarEvent> {
        self.events.lock().iter().map(|(_, e)| e.clone()).collect()
    }

    fn check(&self) -> CalendarResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CalendarError::Unavailable("memory calendar switched off".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl CalendarService for MemoryCalendar {
    async fn insert_event(&self, event: CalendarEvent) -> CalendarResult<String> {
        self.check()?;
        let id = uuid::Uuid::new_v4().to_string();
        self.events.lock().push((id.clone(), event));
        Ok(id)
    }

    async fn list_events(
        &self,
        from: DateTime<FixedOffset>,
        to: DateTime<FixedOffset>,
    ) -> CalendarResult<Vec<CalendarEntry>> {
        self.check()?;
        let mut entries: Vec<CalendarEntry> = self
            .events
            .lock()
            .iter()
            .filter(|(_, e)| e.start >= from && e.start < to)
            .map(|(id, e)| CalendarEntry {
                id: id.clone(),
                summary: e.summary.clone(),
                description: Some(e.description.clone()),
                start: e.start,
            })
            .collect();
        entries.sort_by_key(|e| e.start);
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn event_at(rfc3339: &str, name: &str) -> CalendarEvent {
        let start = DateTime::parse_from_rfc3339(rfc3339).unwrap();
        CalendarEvent::for_reservation(
            name,
            2,
            start,
            Duration::minutes(120),
            "Phone",
            None,
            None,
            "Europe/Paris",
        )
    }

    #[tokio::test]
    async fn test_list_filters_and_orders() {
        let calendar = MemoryCalendar::new();
        calendar.insert_event(event_at("2026-10-20T19:00:00+02:00", "Late")).await.unwrap();
        calendar.insert_event(event_at("2026-10-19T12:00:00+02:00", "Early")).await.unwrap();
        calendar.insert_event(event_at("2026-10-27T12:00:00+01:00", "NextWeek")).await.unwrap();

        let from = DateTime::parse_from_rfc3339("2026-10-19T00:00:00+02:00").unwrap();
        let to = DateTime::parse_from_rfc3339("2026-10-26T00:00:00+01:00").unwrap();
        let entries = calendar.list_events(from, to).await.unwrap();
        let summaries: Vec<_> = entries.iter().map(|e| e.summary.as_str()).collect();
        assert_eq!(
            summaries,
            vec!["Réservation: Early (2 pers.)", "Réservation: Late (2 pers.)"]
        );
    }

    #[tokio::test]
    async fn test_failure_switch() {
        let calendar = MemoryCalendar::new();
        calendar.set_failing(true);
        assert!(calendar
            .insert_event(event_at("2026-10-20T19:00:00+02:00", "Ada"))
            .await
            .is_err());
        assert!(calendar.events().is_empty());
    }
}
