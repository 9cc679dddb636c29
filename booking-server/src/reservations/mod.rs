//! 预订记录 (reservation records)
//!
//! - **schema**: 表头能力探测 (PhoneNumber/Email、Arrived 列)
//! - **writer**: 写入存储 + 日历镜像
//! - **arrivals**: 到店标记与统计

pub mod arrivals;
pub mod schema;
pub mod writer;

pub use arrivals::{ArrivalError, ArrivalTracker};
pub use schema::{SchemaCapabilities, SchemaRegistry};
pub use writer::ReservationWriter;

use chrono::DateTime;
use chrono_tz::Tz;
use shared::{BookingChannel, MAX_PARTY_SIZE, ReservationRecord, columns, parse_arrived};

use crate::store::StoreRow;
use crate::utils::time;

/// A reservation about to be written
#[derive(Debug, Clone, PartialEq)]
pub struct NewReservation {
    pub name: String,
    pub party_size: u32,
    pub scheduled_at: DateTime<Tz>,
    pub channel: BookingChannel,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl NewReservation {
    pub fn new(
        name: impl Into<String>,
        party_size: u32,
        scheduled_at: DateTime<Tz>,
        channel: BookingChannel,
    ) -> Self {
        Self {
            name: name.into(),
            party_size,
            scheduled_at,
            channel,
            phone: None,
            email: None,
        }
    }

    pub fn with_phone(mut self, phone: Option<String>) -> Self {
        self.phone = phone.filter(|p| !p.trim().is_empty());
        self
    }

    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.email = email.filter(|e| !e.trim().is_empty());
        self
    }
}

/// Parse a stored row. Rows without a readable `DateTime` are skipped;
/// an unreadable `PartySize` counts as 0 seats, an oversized one as
/// [`MAX_PARTY_SIZE`].
pub fn record_from_row(row_index: usize, row: &StoreRow, tz: Tz) -> Option<ReservationRecord> {
    let scheduled_at = time::parse_instant(row.get(columns::DATE_TIME)?, tz)?.fixed_offset();
    let party_size = row.get(columns::PARTY_SIZE).map_or(0, parse_party_size);

    Some(ReservationRecord {
        row_index: Some(row_index),
        created_at: row.get(columns::TIMESTAMP).unwrap_or_default().to_string(),
        name: row.get(columns::NAME).unwrap_or_default().to_string(),
        party_size,
        scheduled_at,
        source: row.get(columns::SOURCE).unwrap_or_default().to_string(),
        phone: row.get(columns::PHONE_NUMBER).map(str::to_string),
        email: row.get(columns::EMAIL).map(str::to_string),
        arrived: row.get(columns::ARRIVED).map(parse_arrived),
    })
}

/// Hand-edited cells: digits only, clamped to [`MAX_PARTY_SIZE`]
fn parse_party_size(value: &str) -> u32 {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return 0;
    }
    value
        .parse::<u32>()
        .map_or(MAX_PARTY_SIZE, |n| n.min(MAX_PARTY_SIZE))
}

/// Build the row for a new reservation. Optional columns are only
/// written when the store schema has them.
pub fn row_for(
    reservation: &NewReservation,
    created_at: &str,
    caps: SchemaCapabilities,
) -> StoreRow {
    let mut row = StoreRow::new()
        .with(columns::TIMESTAMP, created_at)
        .with(columns::NAME, reservation.name.as_str())
        .with(columns::PARTY_SIZE, reservation.party_size.to_string())
        .with(columns::DATE_TIME, time::to_store_string(&reservation.scheduled_at))
        .with(columns::SOURCE, reservation.channel.as_source());

    if caps.phone_email {
        row.set(columns::PHONE_NUMBER, reservation.phone.clone().unwrap_or_default());
        row.set(columns::EMAIL, reservation.email.clone().unwrap_or_default());
    }
    if caps.arrival {
        row.set(columns::ARRIVED, shared::format_arrived(false));
    }
    row
}
