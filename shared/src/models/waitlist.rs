//! Waitlist Model (候补名单)

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use super::BookingChannel;

/// Rejected request held for manual follow-up. Never promoted automatically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitlistEntry {
    /// `<unix millis>_<name>`
    pub id: String,
    pub customer_name: String,
    pub party_size: u32,
    pub requested_at: DateTime<FixedOffset>,
    pub source: BookingChannel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}
