//! Reservation Model (预订记录)

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Column names of the reservation store.
///
/// Lookup is by name, never by position.
pub mod columns {
    pub const TIMESTAMP: &str = "Timestamp";
    pub const NAME: &str = "Name";
    pub const PARTY_SIZE: &str = "PartySize";
    pub const DATE_TIME: &str = "DateTime";
    pub const SOURCE: &str = "Source";
    pub const PHONE_NUMBER: &str = "PhoneNumber";
    pub const EMAIL: &str = "Email";
    pub const ARRIVED: &str = "Arrived";

    /// Columns every store must have
    pub const REQUIRED: [&str; 5] = [TIMESTAMP, NAME, PARTY_SIZE, DATE_TIME, SOURCE];
}

/// Where a booking request came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookingChannel {
    /// Third-party web form (webhook)
    #[serde(rename = "Webflow")]
    Web,
    /// Conversational booking through the chat bot
    #[serde(rename = "Phone")]
    Chat,
    /// Operator quick entry, bypasses admission
    #[serde(rename = "Manual")]
    Manual,
}

impl BookingChannel {
    /// Value written to the `Source` column
    pub fn as_source(&self) -> &'static str {
        match self {
            Self::Web => "Webflow",
            Self::Chat => "Phone",
            Self::Manual => "Manual",
        }
    }

    pub fn from_source(source: &str) -> Option<Self> {
        match source {
            "Webflow" => Some(Self::Web),
            "Phone" => Some(Self::Chat),
            "Manual" => Some(Self::Manual),
            _ => None,
        }
    }

    /// Rejected requests from this channel go to the waitlist
    pub fn supports_waitlist(&self) -> bool {
        matches!(self, Self::Chat)
    }

    /// Requests from this channel go through admission
    pub fn requires_admission(&self) -> bool {
        !matches!(self, Self::Manual)
    }
}

impl std::fmt::Display for BookingChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_source())
    }
}

/// Persisted reservation row
///
/// Identity is the row position in the store (`row_index`, 0-based over
/// data rows). Only the `arrived` field is ever mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservationRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_index: Option<usize>,
    /// Creation timestamp (ISO 8601)
    pub created_at: String,
    pub name: String,
    /// 0 when the stored value is missing or unparseable
    pub party_size: u32,
    pub scheduled_at: DateTime<FixedOffset>,
    /// Raw `Source` column value
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// `None` when the store has no `Arrived` column
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrived: Option<bool>,
}

impl ReservationRecord {
    pub fn has_arrived(&self) -> bool {
        self.arrived.unwrap_or(false)
    }
}

/// Largest party size accepted from any channel; larger stored values are
/// clamped to it when read back.
pub const MAX_PARTY_SIZE: u32 = 1000;

/// Parse the `Arrived` column. Accepts the spellings a spreadsheet
/// user may type by hand.
pub fn parse_arrived(value: &str) -> bool {
    matches!(value.trim(), "Yes" | "yes" | "YES" | "TRUE" | "true" | "True")
}

/// Value written to the `Arrived` column
pub fn format_arrived(arrived: bool) -> &'static str {
    if arrived { "Yes" } else { "No" }
}
