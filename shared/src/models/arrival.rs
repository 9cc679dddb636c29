//! Arrival statistics (到店统计)

use serde::{Deserialize, Serialize};

/// Aggregate check-in figures for one service window.
///
/// The two rates are computed independently: with unequal party sizes
/// `people_rate` and `reservation_rate` diverge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrivalStats {
    pub total_reservations: u32,
    pub arrived_reservations: u32,
    pub total_people: u32,
    pub arrived_people: u32,
    /// `100 * arrived_reservations / total_reservations`, 0 when empty
    pub reservation_rate: f64,
    /// `100 * arrived_people / total_people`, 0 when empty
    pub people_rate: f64,
}

impl ArrivalStats {
    /// Build from `(party_size, arrived)` pairs
    pub fn from_parties(parties: impl IntoIterator<Item = (u32, bool)>) -> Self {
        let mut stats = Self::default();
        for (party, arrived) in parties {
            stats.total_reservations = stats.total_reservations.saturating_add(1);
            stats.total_people = stats.total_people.saturating_add(party);
            if arrived {
                stats.arrived_reservations = stats.arrived_reservations.saturating_add(1);
                stats.arrived_people = stats.arrived_people.saturating_add(party);
            }
        }
        stats.reservation_rate = rate(stats.arrived_reservations, stats.total_reservations);
        stats.people_rate = rate(stats.arrived_people, stats.total_people);
        stats
    }
}

fn rate(part: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * part as f64 / total as f64
    }
}
