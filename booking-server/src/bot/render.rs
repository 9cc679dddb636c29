//! Message text (Telegram HTML parse mode)

use std::collections::BTreeMap;

use chrono::NaiveDate;
use chrono_tz::Tz;
use shared::{
    ArrivalStats, CapacitySnapshot, ReservationRecord, ServiceWindow, WaitlistEntry, columns,
};

use crate::calendar::CalendarEntry;
use crate::reservations::SchemaCapabilities;
use crate::store::StoreRow;

const DEBUG_RECENT_ROWS: usize = 5;

/// Escape user-provided text for HTML parse mode
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

fn reservation_line(record: &ReservationRecord, tz: Tz) -> String {
    let mut line = format!(
        "{} · {} · {} pers. · {}",
        record.scheduled_at.with_timezone(&tz).format("%H:%M"),
        escape(&record.name),
        record.party_size,
        escape(&record.source)
    );
    if let Some(phone) = &record.phone {
        line.push_str(&format!(" · {}", escape(phone)));
    }
    line
}

pub fn booking_confirmation(
    record: &ReservationRecord,
    service: Option<&str>,
    remaining: Option<u32>,
    tz: Tz,
) -> String {
    let at = record.scheduled_at.with_timezone(&tz);
    let mut text = format!(
        "✅ <b>Booking confirmed</b>\n\n👤 {}\n📅 {}\n🕐 {}\n👥 {} pers.",
        escape(&record.name),
        at.format("%A %d %B %Y"),
        at.format("%H:%M"),
        record.party_size
    );
    if let (Some(service), Some(remaining)) = (service, remaining) {
        text.push_str(&format!("\n\n🪑 {remaining} seats left for {}", escape(service)));
    }
    text
}

/// Staff-chat notice for a new booking from any channel
pub fn staff_new_booking(record: &ReservationRecord, tz: Tz) -> String {
    let at = record.scheduled_at.with_timezone(&tz);
    let mut text = format!(
        "🔔 <b>New booking</b> ({})\n👤 {}\n📅 {}\n👥 {} pers.",
        escape(&record.source),
        escape(&record.name),
        at.format("%d/%m/%Y %H:%M"),
        record.party_size
    );
    if let Some(phone) = &record.phone {
        text.push_str(&format!("\n📞 {}", escape(phone)));
    }
    if let Some(email) = &record.email {
        text.push_str(&format!("\n✉️ {}", escape(email)));
    }
    text
}

pub fn reservation_list(title: &str, records: &[ReservationRecord], tz: Tz) -> String {
    if records.is_empty() {
        return format!("<b>{}</b>\n\nNo reservations.", escape(title));
    }
    let total: u32 = records.iter().map(|r| r.party_size).sum();
    let lines: Vec<_> = records.iter().map(|r| reservation_line(r, tz)).collect();
    format!(
        "<b>{}</b> ({} bookings, {total} guests)\n\n{}",
        escape(title),
        records.len(),
        lines.join("\n")
    )
}

pub fn capacity_status(
    snapshots: &[CapacitySnapshot],
    windows: &[ServiceWindow],
    online_blocked: bool,
    waitlist_len: usize,
) -> String {
    let mut text = String::from("🪑 <b>Remaining seats today</b>\n");
    for snapshot in snapshots {
        let label = windows
            .iter()
            .find(|w| w.name == snapshot.service)
            .map(|w| w.label())
            .unwrap_or_else(|| snapshot.service.clone());
        let state = if snapshot.blocked { " 🔒 closed" } else { "" };
        text.push_str(&format!(
            "\n<b>{}</b>{state}\n{} / {} seats left ({}% full)\n",
            escape(&label),
            snapshot.remaining_seats,
            snapshot.max_capacity,
            snapshot.percentage_full
        ));
    }
    if online_blocked {
        text.push_str("\n🚫 Online bookings are blocked");
    }
    text.push_str(&format!("\n📝 Waitlist: {waitlist_len}"));
    text
}

pub fn arrivals_header(window: &ServiceWindow, records: &[ReservationRecord]) -> String {
    let arrived = records.iter().filter(|r| r.has_arrived()).count();
    format!(
        "✅ <b>Arrivals · {}</b>\n{arrived}/{} arrived. Tap a booking to toggle.",
        escape(&window.label()),
        records.len()
    )
}

pub fn arrival_stats(window: &ServiceWindow, stats: &ArrivalStats) -> String {
    format!(
        "📊 <b>{} · arrivals</b>\n\nBookings: {}/{} ({}%)\nGuests: {}/{} ({}%)",
        escape(&window.label()),
        stats.arrived_reservations,
        stats.total_reservations,
        stats.reservation_rate.round(),
        stats.arrived_people,
        stats.total_people,
        stats.people_rate.round()
    )
}

/// Calendar entries grouped by local day
pub fn week_overview(entries: &[CalendarEntry], tz: Tz) -> String {
    events_by_day("🗓 <b>This week</b>", entries, tz)
}

/// Rest of the month, with a link to the full calendar when known
pub fn month_overview(entries: &[CalendarEntry], tz: Tz, link: Option<&str>) -> String {
    let mut text = events_by_day("📅 <b>This month</b>", entries, tz);
    if let Some(link) = link {
        text.truncate(text.trim_end().len());
        text.push_str(&format!("\n\n<a href=\"{}\">📅 Full calendar</a>", escape(link)));
    }
    text
}

fn events_by_day(title: &str, entries: &[CalendarEntry], tz: Tz) -> String {
    if entries.is_empty() {
        return format!("{title}\n\nNo reservations.");
    }
    let mut days: BTreeMap<NaiveDate, Vec<String>> = BTreeMap::new();
    for entry in entries {
        let local = entry.start.with_timezone(&tz);
        days.entry(local.date_naive()).or_default().push(format!(
            "  {} {}",
            local.format("%H:%M"),
            escape(&entry.summary)
        ));
    }

    let mut text = format!("{title}\n");
    for (day, lines) in days {
        text.push_str(&format!("\n<b>{}</b>\n{}\n", day.format("%A %d/%m"), lines.join("\n")));
    }
    text
}

/// Raw view of the sheet for operators: headers, size, detected columns
/// and the most recent rows as stored.
pub fn debug_sheet(headers: &[String], rows: &[StoreRow], caps: SchemaCapabilities) -> String {
    let on_off = |on: bool| if on { "ON" } else { "OFF" };
    let mut text = format!(
        "🔍 <b>Sheet debug</b>\n\n📊 Rows: {}\n📋 Headers: {}\n🔧 Phone/email: {}\n👥 Arrival tracking: {}\n",
        rows.len(),
        escape(&headers.join(", ")),
        on_off(caps.phone_email),
        on_off(caps.arrival)
    );
    if rows.is_empty() {
        return text;
    }

    let start = rows.len().saturating_sub(DEBUG_RECENT_ROWS);
    text.push_str(&format!("\n<b>Recent rows ({})</b>\n", rows.len() - start));
    for (i, row) in rows[start..].iter().enumerate() {
        let cell = |column: &str| escape(row.get(column).unwrap_or("N/A"));
        text.push_str(&format!(
            "\n<b>{}.</b> {}\n  📅 {}\n  👥 {}\n  📱 {}\n",
            start + i + 1,
            cell(columns::NAME),
            cell(columns::DATE_TIME),
            cell(columns::PARTY_SIZE),
            cell(columns::SOURCE)
        ));
        if caps.phone_email {
            text.push_str(&format!(
                "  📞 {}\n  ✉️ {}\n",
                cell(columns::PHONE_NUMBER),
                cell(columns::EMAIL)
            ));
        }
        if caps.arrival {
            text.push_str(&format!("  ✅ Arrived: {}\n", cell(columns::ARRIVED)));
        }
        text.push_str(&format!("  ⏰ {}\n", cell(columns::TIMESTAMP)));
    }
    text
}

pub fn waitlist(entries: &[WaitlistEntry], tz: Tz) -> String {
    if entries.is_empty() {
        return "📝 <b>Waitlist</b>\n\nEmpty.".into();
    }
    let lines: Vec<_> = entries
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let mut line = format!(
                "{}. {} · {} pers. · {} · {}",
                i + 1,
                escape(&e.customer_name),
                e.party_size,
                e.requested_at.with_timezone(&tz).format("%d/%m %H:%M"),
                e.source
            );
            if let Some(phone) = &e.phone {
                line.push_str(&format!(" · {}", escape(phone)));
            }
            line
        })
        .collect();
    format!("📝 <b>Waitlist</b> ({})\n\n{}", entries.len(), lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use chrono_tz::Europe::Paris;

    fn record(name: &str, at: &str, party: u32, arrived: Option<bool>) -> ReservationRecord {
        ReservationRecord {
            row_index: Some(0),
            created_at: String::new(),
            name: name.into(),
            party_size: party,
            scheduled_at: DateTime::parse_from_rfc3339(at).unwrap(),
            source: "Phone".into(),
            phone: None,
            email: None,
            arrived,
        }
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("Tom & <Jerry>"), "Tom &amp; &lt;Jerry&gt;");
    }

    #[test]
    fn test_reservation_list_totals() {
        let records = vec![
            record("Ada", "2026-10-18T12:00:00+02:00", 4, None),
            record("Bob", "2026-10-18T19:30:00+02:00", 2, None),
        ];
        let text = reservation_list("Today", &records, Paris);
        assert!(text.contains("2 bookings, 6 guests"));
        assert!(text.contains("19:30 · Bob · 2 pers. · Phone"));
        assert!(reservation_list("Today", &[], Paris).contains("No reservations"));
    }

    #[test]
    fn test_capacity_status() {
        let windows = vec![ServiceWindow::new("lunch", 12, 14, 60)];
        let snapshot = CapacitySnapshot::compute(&windows[0], 45);
        let text = capacity_status(&[snapshot], &windows, true, 2);
        assert!(text.contains("15 / 60 seats left (75% full)"));
        assert!(text.contains("Online bookings are blocked"));
        assert!(text.contains("Waitlist: 2"));
    }

    #[test]
    fn test_arrival_stats_shows_both_rates() {
        let window = ServiceWindow::new("lunch", 12, 14, 60);
        let stats = ArrivalStats::from_parties([(2, true), (2, true), (2, true), (10, false)]);
        let text = arrival_stats(&window, &stats);
        assert!(text.contains("Bookings: 3/4 (75%)"));
        assert!(text.contains("Guests: 6/16 (38%)"));
    }

    #[test]
    fn test_week_overview_groups_by_day() {
        let entry = |id: &str, at: &str| CalendarEntry {
            id: id.into(),
            summary: format!("Réservation: {id} (2 pers.)"),
            description: None,
            start: DateTime::parse_from_rfc3339(at).unwrap(),
        };
        let text = week_overview(
            &[
                entry("A", "2026-10-20T12:00:00+02:00"),
                entry("B", "2026-10-20T19:00:00+02:00"),
                entry("C", "2026-10-22T12:30:00+02:00"),
            ],
            Paris,
        );
        assert_eq!(text.matches("<b>Tuesday 20/10</b>").count(), 1);
        assert!(text.contains("<b>Thursday 22/10</b>"));
    }

    #[test]
    fn test_month_overview_link() {
        let link = "https://calendar.google.com/calendar/embed?src=a%40b&ctz=Europe%2FParis";
        let empty = month_overview(&[], Paris, Some(link));
        assert!(empty.contains("No reservations."));
        assert!(empty.contains("href=\"https://calendar.google.com/calendar/embed?src=a%40b&amp;ctz=Europe%2FParis\""));
        assert!(!month_overview(&[], Paris, None).contains("href"));
    }

    #[test]
    fn test_debug_sheet_shows_last_rows() {
        let headers: Vec<String> = columns::REQUIRED.iter().map(|h| h.to_string()).collect();
        let rows: Vec<StoreRow> = (1..=7)
            .map(|i| {
                StoreRow::new()
                    .with(columns::NAME, format!("Guest{i}"))
                    .with(columns::PARTY_SIZE, "2")
            })
            .collect();
        let text = debug_sheet(&headers, &rows, SchemaCapabilities::default());

        assert!(text.contains("Rows: 7"));
        assert!(text.contains("Headers: Timestamp, Name, PartySize, DateTime, Source"));
        assert!(text.contains("Phone/email: OFF"));
        assert!(text.contains("Recent rows (5)"));
        assert!(!text.contains("Guest2\n"));
        assert!(text.contains("<b>3.</b> Guest3"));
        assert!(text.contains("<b>7.</b> Guest7"));
        assert!(text.contains("📅 N/A"));
        assert!(!text.contains("Arrived"));

        let caps = SchemaCapabilities { phone_email: true, arrival: true };
        let text = debug_sheet(&headers, &rows[..1], caps);
        assert!(text.contains("Recent rows (1)"));
        assert!(text.contains("Arrived: N/A"));
        assert!(text.contains("📞 N/A"));
    }
}
