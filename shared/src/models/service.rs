//! Service Window Model (营业时段)

use serde::{Deserialize, Serialize};

/// Named time-of-day band with its own seat cap and open/closed flag.
///
/// `start_hour` / `end_hour` are both inclusive: a window `12..=14`
/// accepts 12:00 through 14:59.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceWindow {
    /// Identity, e.g. `lunch` / `dinner`
    pub name: String,
    pub start_hour: u32,
    pub end_hour: u32,
    /// Seats available for the whole window
    pub max_capacity: u32,
    /// Closed by an operator
    #[serde(default)]
    pub blocked: bool,
}

impl ServiceWindow {
    pub fn new(name: impl Into<String>, start_hour: u32, end_hour: u32, max_capacity: u32) -> Self {
        Self {
            name: name.into(),
            start_hour,
            end_hour,
            max_capacity,
            blocked: false,
        }
    }

    /// Whether a local hour-of-day falls inside `[start_hour, end_hour]`
    pub fn contains_hour(&self, hour: u32) -> bool {
        hour >= self.start_hour && hour <= self.end_hour
    }

    /// Display label: `lunch` → `Lunch`
    pub fn label(&self) -> String {
        let mut chars = self.name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

/// Derived view of a window's occupancy, recomputed per query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacitySnapshot {
    pub service: String,
    pub used_seats: u32,
    pub max_capacity: u32,
    /// `max_capacity - used_seats`, floored at 0
    pub remaining_seats: u32,
    /// Rounded percentage of `max_capacity` already committed
    pub percentage_full: u32,
    pub blocked: bool,
}

impl CapacitySnapshot {
    pub fn compute(window: &ServiceWindow, used_seats: u32) -> Self {
        let percentage_full = if window.max_capacity == 0 {
            100
        } else {
            ((used_seats as f64 / window.max_capacity as f64) * 100.0).round() as u32
        };

        Self {
            service: window.name.clone(),
            used_seats,
            max_capacity: window.max_capacity,
            remaining_seats: window.max_capacity.saturating_sub(used_seats),
            percentage_full,
            blocked: window.blocked,
        }
    }
}
