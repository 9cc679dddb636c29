//! Google Calendar adapter (Calendar REST API v3)

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};
use reqwest::Url;
use serde::Deserialize;
use serde_json::json;

use super::{CalendarEntry, CalendarError, CalendarEvent, CalendarResult, CalendarService};
use crate::google::ServiceAccountAuth;

const CALENDAR_API: &str = "https://www.googleapis.com/calendar/v3/calendars/";

#[derive(Debug, Deserialize)]
struct InsertedEvent {
    id: String,
}

#[derive(Debug, Deserialize)]
struct EventList {
    #[serde(default)]
    items: Vec<EventItem>,
}

#[derive(Debug, Deserialize)]
struct EventItem {
    id: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    description: Option<String>,
    start: EventTime,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventTime {
    #[serde(default)]
    date_time: Option<String>,
    /// All-day events carry only a date
    #[serde(default)]
    date: Option<String>,
}

impl EventTime {
    fn to_instant(&self) -> Option<DateTime<FixedOffset>> {
        if let Some(dt) = &self.date_time {
            return DateTime::parse_from_rfc3339(dt).ok();
        }
        let date = NaiveDate::parse_from_str(self.date.as_deref()?, "%Y-%m-%d").ok()?;
        FixedOffset::east_opt(0)?
            .from_local_datetime(&date.and_hms_opt(0, 0, 0)?)
            .single()
    }
}

#[derive(Debug)]
pub struct GoogleCalendar {
    http: reqwest::Client,
    auth: Arc<ServiceAccountAuth>,
    calendar_id: String,
}

impl GoogleCalendar {
    pub fn new(
        http: reqwest::Client,
        auth: Arc<ServiceAccountAuth>,
        calendar_id: impl Into<String>,
    ) -> Self {
        Self {
            http,
            auth,
            calendar_id: calendar_id.into(),
        }
    }

    fn events_url(&self) -> CalendarResult<Url> {
        let mut url = Url::parse(CALENDAR_API)
            .map_err(|e| CalendarError::Unavailable(format!("bad calendar url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| CalendarError::Unavailable("calendar url cannot be a base".into()))?
            .pop_if_empty()
            .push(&self.calendar_id)
            .push("events");
        Ok(url)
    }
}

async fn check(resp: reqwest::Response) -> CalendarResult<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = resp.text().await.unwrap_or_default();
    Err(CalendarError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl CalendarService for GoogleCalendar {
    async fn insert_event(&self, event: CalendarEvent) -> CalendarResult<String> {
        let body = json!({
            "summary": event.summary,
            "description": event.description,
            "start": { "dateTime": event.start.to_rfc3339(), "timeZone": event.time_zone },
            "end": { "dateTime": event.end.to_rfc3339(), "timeZone": event.time_zone },
        });

        let token = self.auth.access_token().await?;
        let resp = self
            .http
            .post(self.events_url()?)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        let inserted: InsertedEvent = check(resp).await?.json().await?;
        Ok(inserted.id)
    }

    async fn list_events(
        &self,
        from: DateTime<FixedOffset>,
        to: DateTime<FixedOffset>,
    ) -> CalendarResult<Vec<CalendarEntry>> {
        let mut url = self.events_url()?;
        url.query_pairs_mut()
            .append_pair("timeMin", &from.to_rfc3339())
            .append_pair("timeMax", &to.to_rfc3339())
            .append_pair("singleEvents", "true")
            .append_pair("orderBy", "startTime");

        let token = self.auth.access_token().await?;
        let resp = self.http.get(url).bearer_auth(token).send().await?;
        let list: EventList = check(resp).await?.json().await?;

        Ok(list
            .items
            .into_iter()
            .filter_map(|item| {
                let start = item.start.to_instant()?;
                Some(CalendarEntry {
                    id: item.id,
                    summary: item.summary.unwrap_or_default(),
                    description: item.description,
                    start,
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_time_parsing() {
        let timed: EventTime =
            serde_json::from_str(r#"{"dateTime":"2026-10-18T19:30:00+02:00"}"#).unwrap();
        assert_eq!(
            timed.to_instant().unwrap().to_rfc3339(),
            "2026-10-18T19:30:00+02:00"
        );

        let all_day: EventTime = serde_json::from_str(r#"{"date":"2026-10-18"}"#).unwrap();
        assert_eq!(
            all_day.to_instant().unwrap().date_naive(),
            NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
        );

        let empty: EventTime = serde_json::from_str("{}").unwrap();
        assert!(empty.to_instant().is_none());
    }
}
