//! Inline button payloads
//!
//! 按钮回调数据 (callback_data) 的解析与生成，两个方向必须一致。

use chrono::{NaiveDate, NaiveTime};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    Date(NaiveDate),
    Time(NaiveTime),
    Party(u32),
    BackToCalendar,
    BackToTime,
    ToggleArrival { window: String, row: usize },
    ArrivalStats(String),
    RefreshArrivals(String),
    Manage(String),
    ToggleService(String),
    EditCapacity(String),
    CapacityStatus,
    WaitlistView,
    BackMain,
    /// Spacer buttons
    Noop,
}

impl CallbackAction {
    pub fn parse(data: &str) -> Option<Self> {
        let action = match data {
            "back_to_calendar" => Self::BackToCalendar,
            "back_to_time" => Self::BackToTime,
            "capacity_status" => Self::CapacityStatus,
            "waitlist_view" => Self::WaitlistView,
            "back_main" => Self::BackMain,
            "noop" => Self::Noop,
            _ => return Self::parse_prefixed(data),
        };
        Some(action)
    }

    fn parse_prefixed(data: &str) -> Option<Self> {
        if let Some(rest) = data.strip_prefix("toggle_arrival_") {
            let (window, row) = rest.rsplit_once('_')?;
            return Some(Self::ToggleArrival {
                window: non_empty(window)?,
                row: row.parse().ok()?,
            });
        }
        if let Some(window) = data.strip_prefix("arrival_stats_") {
            return Some(Self::ArrivalStats(non_empty(window)?));
        }
        if let Some(window) = data.strip_prefix("refresh_arrivals_") {
            return Some(Self::RefreshArrivals(non_empty(window)?));
        }
        if let Some(window) = data.strip_prefix("toggle_service_") {
            return Some(Self::ToggleService(non_empty(window)?));
        }
        if let Some(window) = data.strip_prefix("edit_capacity_") {
            return Some(Self::EditCapacity(non_empty(window)?));
        }
        if let Some(window) = data.strip_prefix("manage_") {
            return Some(Self::Manage(non_empty(window)?));
        }
        if let Some(date) = data.strip_prefix("date_") {
            return NaiveDate::parse_from_str(date, "%Y-%m-%d").ok().map(Self::Date);
        }
        if let Some(time) = data.strip_prefix("time_") {
            return NaiveTime::parse_from_str(time, "%H:%M").ok().map(Self::Time);
        }
        if let Some(n) = data.strip_prefix("party_") {
            return n.parse().ok().filter(|n| *n > 0).map(Self::Party);
        }
        None
    }

    pub fn to_payload(&self) -> String {
        match self {
            Self::Date(d) => format!("date_{}", d.format("%Y-%m-%d")),
            Self::Time(t) => format!("time_{}", t.format("%H:%M")),
            Self::Party(n) => format!("party_{n}"),
            Self::BackToCalendar => "back_to_calendar".into(),
            Self::BackToTime => "back_to_time".into(),
            Self::ToggleArrival { window, row } => format!("toggle_arrival_{window}_{row}"),
            Self::ArrivalStats(w) => format!("arrival_stats_{w}"),
            Self::RefreshArrivals(w) => format!("refresh_arrivals_{w}"),
            Self::Manage(w) => format!("manage_{w}"),
            Self::ToggleService(w) => format!("toggle_service_{w}"),
            Self::EditCapacity(w) => format!("edit_capacity_{w}"),
            Self::CapacityStatus => "capacity_status".into(),
            Self::WaitlistView => "waitlist_view".into(),
            Self::BackMain => "back_main".into(),
            Self::Noop => "noop".into(),
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_booking_payloads() {
        assert_eq!(
            CallbackAction::parse("date_2026-10-18"),
            Some(CallbackAction::Date(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()))
        );
        assert_eq!(
            CallbackAction::parse("time_19:30"),
            Some(CallbackAction::Time(NaiveTime::from_hms_opt(19, 30, 0).unwrap()))
        );
        assert_eq!(CallbackAction::parse("party_8"), Some(CallbackAction::Party(8)));
        assert_eq!(CallbackAction::parse("party_0"), None);
        assert_eq!(CallbackAction::parse("date_2026-02-30"), None);
    }

    #[test]
    fn test_parse_window_payloads() {
        assert_eq!(
            CallbackAction::parse("toggle_arrival_dinner_12"),
            Some(CallbackAction::ToggleArrival {
                window: "dinner".into(),
                row: 12
            })
        );
        assert_eq!(
            CallbackAction::parse("toggle_arrival_late_night_3"),
            Some(CallbackAction::ToggleArrival {
                window: "late_night".into(),
                row: 3
            })
        );
        assert_eq!(CallbackAction::parse("toggle_arrival_dinner_x"), None);
        assert_eq!(
            CallbackAction::parse("toggle_service_lunch"),
            Some(CallbackAction::ToggleService("lunch".into()))
        );
        assert_eq!(CallbackAction::parse("manage_"), None);
    }

    #[test]
    fn test_unknown_payload() {
        assert_eq!(CallbackAction::parse("reboot"), None);
        assert_eq!(CallbackAction::parse(""), None);
    }

    #[test]
    fn test_payload_format_parses_back() {
        let actions = [
            CallbackAction::Date(NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()),
            CallbackAction::Time(NaiveTime::from_hms_opt(12, 0, 0).unwrap()),
            CallbackAction::ToggleArrival {
                window: "lunch".into(),
                row: 0,
            },
            CallbackAction::EditCapacity("dinner".into()),
            CallbackAction::Noop,
        ];
        for action in actions {
            assert_eq!(CallbackAction::parse(&action.to_payload()), Some(action));
        }
    }
}
