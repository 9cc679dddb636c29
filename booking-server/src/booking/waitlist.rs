//! 候补名单 (append-only, process memory)

use chrono::Utc;
use parking_lot::Mutex;
use shared::WaitlistEntry;

use crate::reservations::NewReservation;

#[derive(Debug, Default)]
pub struct WaitlistRegister {
    entries: Mutex<Vec<WaitlistEntry>>,
}

impl WaitlistRegister {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a rejected request, returning its id (`<millis>_<name>`)
    pub fn add(&self, request: &NewReservation) -> String {
        let created_at = Utc::now();
        let mut entries = self.entries.lock();

        let base = format!("{}_{}", created_at.timestamp_millis(), request.name);
        let mut id = base.clone();
        let mut n = 1;
        while entries.iter().any(|e| e.id == id) {
            n += 1;
            id = format!("{base}_{n}");
        }

        entries.push(WaitlistEntry {
            id: id.clone(),
            customer_name: request.name.clone(),
            party_size: request.party_size,
            requested_at: request.scheduled_at.fixed_offset(),
            source: request.channel,
            phone: request.phone.clone(),
            email: request.email.clone(),
            created_at,
        });
        id
    }

    /// Insertion order
    pub fn list(&self) -> Vec<WaitlistEntry> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Europe::Paris;
    use shared::BookingChannel;

    #[test]
    fn test_ids_unique_and_order_kept() {
        let register = WaitlistRegister::new();
        let at = Paris.with_ymd_and_hms(2026, 10, 18, 20, 0, 0).unwrap();
        let ada = NewReservation::new("Ada", 4, at, BookingChannel::Chat);

        let first = register.add(&ada);
        let second = register.add(&ada);
        let third = register.add(&NewReservation::new("Bob", 2, at, BookingChannel::Chat));

        assert!(first.ends_with("_Ada"));
        assert_ne!(first, second);
        let ids: Vec<_> = register.list().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![first, second, third]);
        assert_eq!(register.len(), 3);
    }
}
