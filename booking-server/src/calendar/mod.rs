//! 日历镜像 (calendar mirror)
//!
//! 预订写入存储后，尽力 (best-effort) 在日历上创建对应事件。
//! 日历失败只记录日志，不回滚存储写入。

mod google;
mod memory;

pub use google::GoogleCalendar;
pub use memory::MemoryCalendar;

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset};
use chrono_tz::Tz;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::google::GoogleAuthError;

#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("Calendar mirror disabled")]
    Disabled,

    #[error("Calendar unavailable: {0}")]
    Unavailable(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Authentication failed: {0}")]
    Auth(#[from] GoogleAuthError),

    #[error("Calendar API error ({status}): {message}")]
    Api { status: u16, message: String },
}

pub type CalendarResult<T> = Result<T, CalendarError>;

const EMBED_URL: &str = "https://calendar.google.com/calendar/embed";

/// Browser link to the whole calendar, shown in the business timezone
pub fn embed_url(calendar_id: &str, tz: Tz) -> Option<String> {
    Url::parse_with_params(EMBED_URL, &[("src", calendar_id), ("ctz", tz.name())])
        .ok()
        .map(String::from)
}

/// Event to create
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub summary: String,
    pub description: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    /// IANA zone name sent alongside start/end
    pub time_zone: String,
}

impl CalendarEvent {
    /// Mirror event for a reservation: `[start, start + duration)`
    #[allow(clippy::too_many_arguments)]
    pub fn for_reservation(
        name: &str,
        party_size: u32,
        start: DateTime<FixedOffset>,
        duration: Duration,
        source: &str,
        phone: Option<&str>,
        email: Option<&str>,
        time_zone: &str,
    ) -> Self {
        let mut description = format!("Party size: {party_size}\nSource: {source}");
        if let Some(phone) = phone {
            description.push_str(&format!("\nPhone: {phone}"));
        }
        if let Some(email) = email {
            description.push_str(&format!("\nEmail: {email}"));
        }

        Self {
            summary: format!("Réservation: {name} ({party_size} pers.)"),
            description,
            start,
            end: start + duration,
            time_zone: time_zone.to_string(),
        }
    }
}

/// Event as read back from the calendar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEntry {
    pub id: String,
    pub summary: String,
    pub description: Option<String>,
    pub start: DateTime<FixedOffset>,
}

#[async_trait]
pub trait CalendarService: Send + Sync + std::fmt::Debug {
    /// Create an event, returning its id
    async fn insert_event(&self, event: CalendarEvent) -> CalendarResult<String>;

    /// Events starting in `[from, to)`, ordered by start
    async fn list_events(
        &self,
        from: DateTime<FixedOffset>,
        to: DateTime<FixedOffset>,
    ) -> CalendarResult<Vec<CalendarEntry>>;

    /// Whether a real calendar is configured
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Used when no calendar id is configured
#[derive(Debug, Default)]
pub struct DisabledCalendar;

#[async_trait]
impl CalendarService for DisabledCalendar {
    async fn insert_event(&self, _event: CalendarEvent) -> CalendarResult<String> {
        Err(CalendarError::Disabled)
    }

    async fn list_events(
        &self,
        _from: DateTime<FixedOffset>,
        _to: DateTime<FixedOffset>,
    ) -> CalendarResult<Vec<CalendarEntry>> {
        Err(CalendarError::Disabled)
    }

    fn is_enabled(&self) -> bool {
        false
    }
}
