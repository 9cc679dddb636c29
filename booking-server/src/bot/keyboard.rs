//! Keyboards
//!
//! 序列化结果直接作为 Telegram `reply_markup`。

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use serde::Serialize;
use shared::{ReservationRecord, ServiceWindow};

use super::callback::CallbackAction;

const DATES_PER_ROW: usize = 4;
const TIMES_PER_ROW: usize = 3;
const PARTY_PER_ROW: usize = 4;
const MAX_PARTY_BUTTON: u32 = 8;
const SLOT_MINUTES: i64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineButton {
    pub text: String,
    pub callback_data: String,
}

impl InlineButton {
    pub fn new(text: impl Into<String>, action: &CallbackAction) -> Self {
        Self {
            text: text.into(),
            callback_data: action.to_payload(),
        }
    }

    fn spacer(text: impl Into<String>) -> Self {
        Self::new(text, &CallbackAction::Noop)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplyButton {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Keyboard {
    Inline {
        inline_keyboard: Vec<Vec<InlineButton>>,
    },
    Reply {
        keyboard: Vec<Vec<ReplyButton>>,
        resize_keyboard: bool,
    },
}

impl Keyboard {
    pub fn inline(rows: Vec<Vec<InlineButton>>) -> Self {
        Self::Inline {
            inline_keyboard: rows,
        }
    }

    /// Inline buttons, flattened (handy in tests)
    pub fn buttons(&self) -> Vec<&InlineButton> {
        match self {
            Self::Inline { inline_keyboard } => inline_keyboard.iter().flatten().collect(),
            Self::Reply { .. } => Vec::new(),
        }
    }
}

/// Main reply-keyboard entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuItem {
    NewBooking,
    TodayBookings,
    WeekOverview,
    MonthCalendar,
    RemainingSeats,
    ManageCapacity,
    DebugSheet,
    Arrivals(String),
    SetOnlineBlocked(bool),
}

const NEW_BOOKING: &str = "📅 New booking";
const TODAY_BOOKINGS: &str = "📋 Today's bookings";
const WEEK_OVERVIEW: &str = "🗓 This week";
const MONTH_CALENDAR: &str = "📅 This month";
const REMAINING_SEATS: &str = "🪑 Remaining seats";
const MANAGE_CAPACITY: &str = "⚙️ Manage capacity";
const DEBUG_SHEET: &str = "🔍 Debug sheet";
const ARRIVALS_PREFIX: &str = "✅ Arrivals: ";
const BLOCK_ONLINE: &str = "🚫 Block online bookings";
const UNBLOCK_ONLINE: &str = "🟢 Unblock online bookings";

impl MenuItem {
    pub fn label(&self, windows: &[ServiceWindow]) -> String {
        match self {
            Self::NewBooking => NEW_BOOKING.into(),
            Self::TodayBookings => TODAY_BOOKINGS.into(),
            Self::WeekOverview => WEEK_OVERVIEW.into(),
            Self::MonthCalendar => MONTH_CALENDAR.into(),
            Self::RemainingSeats => REMAINING_SEATS.into(),
            Self::ManageCapacity => MANAGE_CAPACITY.into(),
            Self::DebugSheet => DEBUG_SHEET.into(),
            Self::Arrivals(name) => {
                let label = windows
                    .iter()
                    .find(|w| &w.name == name)
                    .map(|w| w.label())
                    .unwrap_or_else(|| name.clone());
                format!("{ARRIVALS_PREFIX}{label}")
            }
            Self::SetOnlineBlocked(true) => BLOCK_ONLINE.into(),
            Self::SetOnlineBlocked(false) => UNBLOCK_ONLINE.into(),
        }
    }

    pub fn parse(text: &str, windows: &[ServiceWindow]) -> Option<Self> {
        let text = text.trim();
        let item = match text {
            NEW_BOOKING => Self::NewBooking,
            TODAY_BOOKINGS => Self::TodayBookings,
            WEEK_OVERVIEW => Self::WeekOverview,
            MONTH_CALENDAR => Self::MonthCalendar,
            REMAINING_SEATS => Self::RemainingSeats,
            MANAGE_CAPACITY => Self::ManageCapacity,
            DEBUG_SHEET => Self::DebugSheet,
            BLOCK_ONLINE => Self::SetOnlineBlocked(true),
            UNBLOCK_ONLINE => Self::SetOnlineBlocked(false),
            _ => {
                let label = text.strip_prefix(ARRIVALS_PREFIX)?;
                let window = windows
                    .iter()
                    .find(|w| w.label().eq_ignore_ascii_case(label) || w.name == label)?;
                Self::Arrivals(window.name.clone())
            }
        };
        Some(item)
    }
}

/// Main menu; the online toggle shows the action currently available
pub fn main_menu(windows: &[ServiceWindow], online_blocked: bool) -> Keyboard {
    let reply = |item: MenuItem| ReplyButton {
        text: item.label(windows),
    };

    let mut rows = vec![
        vec![reply(MenuItem::NewBooking), reply(MenuItem::TodayBookings)],
        vec![reply(MenuItem::WeekOverview), reply(MenuItem::MonthCalendar)],
        vec![reply(MenuItem::RemainingSeats), reply(MenuItem::DebugSheet)],
    ];
    let arrivals: Vec<_> = windows
        .iter()
        .map(|w| reply(MenuItem::Arrivals(w.name.clone())))
        .collect();
    if !arrivals.is_empty() {
        rows.push(arrivals);
    }
    rows.push(vec![
        reply(MenuItem::ManageCapacity),
        reply(MenuItem::SetOnlineBlocked(!online_blocked)),
    ]);

    Keyboard::Reply {
        keyboard: rows,
        resize_keyboard: true,
    }
}

/// Dates from `today` to the end of next month.
/// Closed weekdays are hidden, except today and tomorrow.
pub fn date_picker(today: NaiveDate, closed: &[Weekday]) -> Keyboard {
    let tomorrow = today + Duration::days(1);
    let last = end_of_next_month(today);

    let mut rows = Vec::new();
    let mut current_month = None;
    let mut row: Vec<InlineButton> = Vec::new();

    let mut date = today;
    while date <= last {
        let open = date == today || date == tomorrow || !closed.contains(&date.weekday());
        if open {
            if current_month != Some(date.month()) {
                if !row.is_empty() {
                    rows.push(std::mem::take(&mut row));
                }
                rows.push(vec![InlineButton::spacer(date.format("%B %Y").to_string())]);
                current_month = Some(date.month());
            }
            row.push(InlineButton::new(
                date.format("%a %d").to_string(),
                &CallbackAction::Date(date),
            ));
            if row.len() == DATES_PER_ROW {
                rows.push(std::mem::take(&mut row));
            }
        }
        date += Duration::days(1);
    }
    if !row.is_empty() {
        rows.push(row);
    }
    Keyboard::inline(rows)
}

fn end_of_next_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = match date.month() {
        11 => (date.year() + 1, 1),
        12 => (date.year() + 1, 2),
        m => (date.year(), m + 2),
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.pred_opt())
        .unwrap_or(date)
}

/// Half-hour slots from each open window's start hour through `end_hour:00`
pub fn time_slots(window: &ServiceWindow) -> Vec<NaiveTime> {
    let (Some(start), Some(end)) = (
        NaiveTime::from_hms_opt(window.start_hour, 0, 0),
        NaiveTime::from_hms_opt(window.end_hour, 0, 0),
    ) else {
        return Vec::new();
    };

    let mut slots = Vec::new();
    let mut slot = start;
    while slot <= end {
        slots.push(slot);
        let next = slot + Duration::minutes(SLOT_MINUTES);
        if next <= slot {
            break;
        }
        slot = next;
    }
    slots
}

pub fn time_picker(windows: &[ServiceWindow]) -> Keyboard {
    let mut rows = Vec::new();
    for window in windows.iter().filter(|w| !w.blocked) {
        rows.push(vec![InlineButton::spacer(window.label())]);
        for chunk in time_slots(window).chunks(TIMES_PER_ROW) {
            rows.push(
                chunk
                    .iter()
                    .map(|t| InlineButton::new(t.format("%H:%M").to_string(), &CallbackAction::Time(*t)))
                    .collect(),
            );
        }
    }
    rows.push(vec![InlineButton::new("« Back", &CallbackAction::BackToCalendar)]);
    Keyboard::inline(rows)
}

pub fn party_picker() -> Keyboard {
    let buttons: Vec<_> = (1..=MAX_PARTY_BUTTON)
        .map(|n| {
            let text = if n == MAX_PARTY_BUTTON {
                format!("{n}+")
            } else {
                n.to_string()
            };
            InlineButton::new(text, &CallbackAction::Party(n))
        })
        .collect();

    let mut rows: Vec<Vec<_>> = buttons.chunks(PARTY_PER_ROW).map(<[_]>::to_vec).collect();
    rows.push(vec![InlineButton::new("« Back", &CallbackAction::BackToTime)]);
    Keyboard::inline(rows)
}

/// One toggle button per reservation, then stats / refresh
pub fn arrivals_keyboard(window: &str, records: &[ReservationRecord]) -> Keyboard {
    let mut rows: Vec<Vec<InlineButton>> = records
        .iter()
        .filter_map(|r| {
            let row = r.row_index?;
            let mark = if r.has_arrived() { "✅" } else { "⬜" };
            let text = format!(
                "{mark} {} {} ({})",
                r.scheduled_at.format("%H:%M"),
                r.name,
                r.party_size
            );
            Some(vec![InlineButton::new(
                text,
                &CallbackAction::ToggleArrival {
                    window: window.to_string(),
                    row,
                },
            )])
        })
        .collect();

    rows.push(vec![
        InlineButton::new("📊 Stats", &CallbackAction::ArrivalStats(window.to_string())),
        InlineButton::new("🔄 Refresh", &CallbackAction::RefreshArrivals(window.to_string())),
    ]);
    Keyboard::inline(rows)
}

pub fn capacity_menu(windows: &[ServiceWindow]) -> Keyboard {
    let mut rows: Vec<Vec<InlineButton>> = windows
        .iter()
        .map(|w| {
            let state = if w.blocked { "🔒" } else { "🔓" };
            vec![InlineButton::new(
                format!("{state} {} ({} seats)", w.label(), w.max_capacity),
                &CallbackAction::Manage(w.name.clone()),
            )]
        })
        .collect();
    rows.push(vec![
        InlineButton::new("📊 Status", &CallbackAction::CapacityStatus),
        InlineButton::new("📝 Waitlist", &CallbackAction::WaitlistView),
    ]);
    Keyboard::inline(rows)
}

pub fn window_menu(window: &ServiceWindow) -> Keyboard {
    let toggle = if window.blocked {
        "🔓 Open service"
    } else {
        "🔒 Close service"
    };
    Keyboard::inline(vec![
        vec![InlineButton::new(toggle, &CallbackAction::ToggleService(window.name.clone()))],
        vec![InlineButton::new(
            "✏️ Edit capacity",
            &CallbackAction::EditCapacity(window.name.clone()),
        )],
        vec![InlineButton::new("« Back", &CallbackAction::BackMain)],
    ])
}
