//! Bot router
//!
//! 平台无关：输入 [`Incoming`]，输出 [`Outgoing`]；员工通知通过
//! [`Notifier`](super::Notifier) 旁路发送。

use chrono::{NaiveDate, NaiveTime, Utc};
use shared::{BookingChannel, MAX_PARTY_SIZE, ServiceWindow};

use super::callback::CallbackAction;
use super::keyboard::{self, Keyboard, MenuItem};
use super::render;
use super::session::{SessionError, SessionEvent, SessionState, Step, UserId};
use super::ChatId;
use crate::booking::{Booked, BookingError};
use crate::calendar::embed_url;
use crate::core::ServerState;
use crate::reservations::{ArrivalError, NewReservation};
use crate::store::ReservationStore;
use crate::utils::time;

const NEW_USAGE: &str = "Usage: <code>/new YYYY-MM-DD HH:MM guests Name</code>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    Command {
        chat: ChatId,
        user: UserId,
        /// Lowercase, without `/` or `@bot`
        name: String,
        args: String,
    },
    Text {
        chat: ChatId,
        user: UserId,
        text: String,
    },
    Callback {
        chat: ChatId,
        user: UserId,
        message_id: i64,
        callback_id: String,
        data: String,
    },
}

impl Incoming {
    fn chat(&self) -> ChatId {
        match self {
            Self::Command { chat, .. } | Self::Text { chat, .. } | Self::Callback { chat, .. } => *chat,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outgoing {
    Send {
        chat: ChatId,
        text: String,
        keyboard: Option<Keyboard>,
    },
    Edit {
        chat: ChatId,
        message_id: i64,
        text: String,
        keyboard: Option<Keyboard>,
    },
    Answer {
        callback_id: String,
        text: Option<String>,
    },
}

impl Outgoing {
    fn send(chat: ChatId, text: impl Into<String>) -> Self {
        Self::Send {
            chat,
            text: text.into(),
            keyboard: None,
        }
    }

    fn send_with(chat: ChatId, text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self::Send {
            chat,
            text: text.into(),
            keyboard: Some(keyboard),
        }
    }

    fn answer(callback_id: &str, text: Option<&str>) -> Self {
        Self::Answer {
            callback_id: callback_id.to_string(),
            text: text.map(str::to_string),
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Send { text, .. } | Self::Edit { text, .. } => Some(text),
            Self::Answer { text, .. } => text.as_deref(),
        }
    }
}

/// Where a reply goes: a fresh message, or an edit of the pressed one
#[derive(Clone, Copy)]
enum Reply {
    New(ChatId),
    Edit(ChatId, i64),
}

impl Reply {
    fn chat(self) -> ChatId {
        match self {
            Self::New(chat) | Self::Edit(chat, _) => chat,
        }
    }

    fn with(self, text: impl Into<String>, keyboard: Option<Keyboard>) -> Outgoing {
        match self {
            Self::New(chat) => Outgoing::Send {
                chat,
                text: text.into(),
                keyboard,
            },
            Self::Edit(chat, message_id) => Outgoing::Edit {
                chat,
                message_id,
                text: text.into(),
                keyboard,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct BotRouter {
    state: ServerState,
}

impl BotRouter {
    pub fn new(state: ServerState) -> Self {
        Self { state }
    }

    pub async fn handle(&self, incoming: Incoming) -> Vec<Outgoing> {
        if !self.is_allowed(incoming.chat()) {
            tracing::debug!(chat = incoming.chat(), "Ignoring chat outside the staff group");
            return match incoming {
                Incoming::Callback { callback_id, .. } => {
                    vec![Outgoing::answer(&callback_id, Some("Not allowed"))]
                }
                other => vec![Outgoing::send(other.chat(), "This bot is private.")],
            };
        }

        match incoming {
            Incoming::Command {
                chat,
                user,
                name,
                args,
            } => self.on_command(chat, user, &name, &args).await,
            Incoming::Text { chat, user, text } => self.on_text(chat, user, &text).await,
            Incoming::Callback {
                chat,
                user,
                message_id,
                callback_id,
                data,
            } => self.on_callback(chat, user, message_id, &callback_id, &data).await,
        }
    }

    #[cfg(test)]
    fn settings_for_test(&self) -> &crate::capacity::CapacitySettings {
        &self.state.settings
    }

    fn is_allowed(&self, chat: ChatId) -> bool {
        let config = &self.state.config;
        !config.telegram_restrict_chat || config.telegram_chat_id == Some(chat)
    }

    fn windows(&self) -> Vec<ServiceWindow> {
        self.state.settings.windows()
    }

    fn main_menu(&self) -> Keyboard {
        keyboard::main_menu(&self.windows(), self.state.settings.online_booking_blocked())
    }

    fn today(&self) -> NaiveDate {
        time::today(self.state.tz())
    }

    // ========== Commands ==========

    async fn on_command(&self, chat: ChatId, user: UserId, name: &str, args: &str) -> Vec<Outgoing> {
        match name {
            "start" => {
                self.state.sessions.remove(user);
                vec![Outgoing::send_with(
                    chat,
                    "👋 <b>Reservations</b>\nUse the menu below.",
                    self.main_menu(),
                )]
            }
            "new" => self.quick_booking(chat, args).await,
            "list" => vec![self.today_bookings(chat).await],
            "refresh" => vec![self.refresh_schema(chat).await],
            "waitlist" => vec![Outgoing::send(
                chat,
                render::waitlist(&self.state.waitlist().list(), self.state.tz()),
            )],
            _ => vec![Outgoing::send(chat, "Unknown command. Try /start.")],
        }
    }

    /// `/new YYYY-MM-DD HH:MM N Name...`, bypasses capacity
    async fn quick_booking(&self, chat: ChatId, args: &str) -> Vec<Outgoing> {
        let Some((date, time, party_size, name)) = parse_quick_booking(args) else {
            return vec![Outgoing::send(chat, NEW_USAGE)];
        };

        let at = time::at(date, time, self.state.tz());
        let reservation = NewReservation::new(name, party_size, at, BookingChannel::Manual);
        let caps = self.state.schema.current();
        match self.state.booking.book(reservation, caps).await {
            Ok(booked) => {
                self.notify_booked(&booked).await;
                vec![Outgoing::send(chat, self.confirmation(&booked))]
            }
            Err(e) => vec![Outgoing::send(chat, booking_error_text(&e))],
        }
    }

    async fn refresh_schema(&self, chat: ChatId) -> Outgoing {
        match self.state.schema.refresh().await {
            Ok(change) => {
                let caps = change.current;
                let flag = |on: bool| if on { "yes" } else { "no" };
                let status = if change.changed() { "Schema updated" } else { "Schema unchanged" };
                Outgoing::send(
                    chat,
                    format!(
                        "🔄 {status}\nPhone/Email columns: {}\nArrived column: {}",
                        flag(caps.phone_email),
                        flag(caps.arrival)
                    ),
                )
            }
            Err(e) => {
                tracing::error!(error = %e, "Schema refresh failed");
                Outgoing::send(chat, "⚠️ Could not read the reservation sheet.")
            }
        }
    }

    // ========== Free text ==========

    async fn on_text(&self, chat: ChatId, user: UserId, text: &str) -> Vec<Outgoing> {
        let windows = self.windows();
        if let Some(item) = MenuItem::parse(text, &windows) {
            return self.on_menu(chat, user, item).await;
        }

        let state = match self.state.sessions.get(user) {
            Ok(state) => state,
            Err(SessionError::Expired) => {
                return vec![Outgoing::send_with(
                    chat,
                    "⌛ Your session expired. Please start again.",
                    self.main_menu(),
                )];
            }
            Err(_) => {
                return vec![Outgoing::send_with(chat, "Please use the menu below.", self.main_menu())];
            }
        };

        self.advance(Reply::New(chat), user, &state, SessionEvent::Text(text.to_string()))
            .await
    }

    async fn on_menu(&self, chat: ChatId, user: UserId, item: MenuItem) -> Vec<Outgoing> {
        match item {
            MenuItem::NewBooking => {
                let state = SessionState::AwaitingDate;
                let (text, keyboard) = self.prompt(&state);
                self.state.sessions.set(user, state);
                vec![Reply::New(chat).with(text, keyboard)]
            }
            MenuItem::TodayBookings => vec![self.today_bookings(chat).await],
            MenuItem::WeekOverview => vec![self.week_overview(chat).await],
            MenuItem::MonthCalendar => vec![self.month_calendar(chat).await],
            MenuItem::RemainingSeats => vec![Outgoing::send(chat, self.capacity_status().await)],
            MenuItem::DebugSheet => vec![self.debug_sheet(chat).await],
            MenuItem::ManageCapacity => vec![Outgoing::send_with(
                chat,
                "⚙️ <b>Capacity management</b>",
                keyboard::capacity_menu(&self.windows()),
            )],
            MenuItem::Arrivals(window) => vec![self.arrivals_view(Reply::New(chat), &window).await],
            MenuItem::SetOnlineBlocked(blocked) => {
                self.state.settings.set_online_booking_blocked(blocked);
                tracing::info!(blocked, "Online booking switch changed");
                let text = if blocked {
                    "🚫 Online bookings are now blocked."
                } else {
                    "🟢 Online bookings are open again."
                };
                self.state.notifier.notify(text).await;
                vec![Outgoing::send_with(chat, text, self.main_menu())]
            }
        }
    }

    // ========== Callbacks ==========

    async fn on_callback(
        &self,
        chat: ChatId,
        user: UserId,
        message_id: i64,
        callback_id: &str,
        data: &str,
    ) -> Vec<Outgoing> {
        let Some(action) = CallbackAction::parse(data) else {
            tracing::debug!(data, "Unknown callback payload");
            return vec![Outgoing::answer(callback_id, Some("Unknown action"))];
        };
        let reply = Reply::Edit(chat, message_id);

        let event = match &action {
            CallbackAction::Noop => return vec![Outgoing::answer(callback_id, None)],
            CallbackAction::Date(d) => Some(SessionEvent::Date(*d)),
            CallbackAction::Time(t) => Some(SessionEvent::Time(*t)),
            CallbackAction::Party(n) => Some(SessionEvent::PartySize(*n)),
            CallbackAction::BackToCalendar => Some(SessionEvent::BackToCalendar),
            CallbackAction::BackToTime => Some(SessionEvent::BackToTime),
            _ => None,
        };

        let mut out = vec![Outgoing::answer(callback_id, None)];
        if let Some(event) = event {
            match self.state.sessions.get(user) {
                Ok(state) => out.extend(self.advance(reply, user, &state, event).await),
                Err(_) => out.push(reply.with("⌛ This booking session has expired. Tap 📅 New booking to start again.", None)),
            }
            return out;
        }

        match action {
            CallbackAction::ToggleArrival { window, row } => {
                out.clear();
                match self.state.arrivals.toggle(row).await {
                    Ok(arrived) => {
                        let note = if arrived { "Marked as arrived" } else { "Marked as not arrived" };
                        out.push(Outgoing::answer(callback_id, Some(note)));
                        out.push(self.arrivals_view(reply, &window).await);
                    }
                    Err(e) => out.push(Outgoing::answer(callback_id, Some(arrival_error_text(&e).as_str()))),
                }
            }
            CallbackAction::RefreshArrivals(window) => out.push(self.arrivals_view(reply, &window).await),
            CallbackAction::ArrivalStats(window) => {
                let text = match (self.state.settings.window(&window), self.state.arrivals.stats_today(&window).await) {
                    (Some(w), Ok(stats)) => render::arrival_stats(&w, &stats),
                    (_, Err(e)) => arrival_error_text(&e),
                    (None, _) => "Unknown service.".into(),
                };
                out.push(Outgoing::send(chat, text));
            }
            CallbackAction::Manage(window) => match self.state.settings.window(&window) {
                Some(w) => out.push(reply.with(window_summary(&w), Some(keyboard::window_menu(&w)))),
                None => out.push(Outgoing::send(chat, "Unknown service.")),
            },
            CallbackAction::ToggleService(window) => match self.state.settings.toggle_blocked(&window) {
                Ok(blocked) => {
                    let label = self.state.settings.window(&window).map(|w| w.label()).unwrap_or(window.clone());
                    let text = if blocked {
                        format!("🔒 {label} service closed for bookings.")
                    } else {
                        format!("🔓 {label} service open for bookings.")
                    };
                    tracing::info!(window = %window, blocked, "Service window toggled");
                    self.state.notifier.notify(&text).await;
                    if let Some(w) = self.state.settings.window(&window) {
                        out.push(reply.with(window_summary(&w), Some(keyboard::window_menu(&w))));
                    }
                    out.push(Outgoing::send(chat, text));
                }
                Err(e) => out.push(Outgoing::send(chat, e.to_string())),
            },
            CallbackAction::EditCapacity(window) => match self.state.settings.window(&window) {
                Some(w) => {
                    let state = SessionState::AwaitingCapacity { window: w.name.clone() };
                    let (text, keyboard) = self.prompt(&state);
                    self.state.sessions.set(user, state);
                    out.push(Reply::New(chat).with(text, keyboard));
                }
                None => out.push(Outgoing::send(chat, "Unknown service.")),
            },
            CallbackAction::CapacityStatus => out.push(Outgoing::send(chat, self.capacity_status().await)),
            CallbackAction::WaitlistView => out.push(Outgoing::send(
                chat,
                render::waitlist(&self.state.waitlist().list(), self.state.tz()),
            )),
            CallbackAction::BackMain => {
                out.push(reply.with("⚙️ <b>Capacity management</b>", Some(keyboard::capacity_menu(&self.windows()))));
            }
            // handled above
            CallbackAction::Noop
            | CallbackAction::Date(_)
            | CallbackAction::Time(_)
            | CallbackAction::Party(_)
            | CallbackAction::BackToCalendar
            | CallbackAction::BackToTime => {}
        }
        out
    }

    // ========== Session flow ==========

    async fn advance(
        &self,
        reply: Reply,
        user: UserId,
        state: &SessionState,
        event: SessionEvent,
    ) -> Vec<Outgoing> {
        let caps = self.state.schema.current();
        match state.advance(event, caps) {
            Ok(Step::Continue(next)) => {
                let (text, keyboard) = self.prompt(&next);
                self.state.sessions.set(user, next);
                vec![reply.with(text, keyboard)]
            }
            Ok(Step::Commit(draft)) => {
                self.state.sessions.remove(user);
                let at = time::at(draft.date, draft.time, self.state.tz());
                let reservation = NewReservation::new(draft.name, draft.party_size, at, BookingChannel::Chat)
                    .with_phone(draft.phone);
                let chat = reply.chat();
                match self.state.booking.book(reservation, caps).await {
                    Ok(booked) => {
                        self.notify_booked(&booked).await;
                        vec![Outgoing::send_with(chat, self.confirmation(&booked), self.main_menu())]
                    }
                    Err(e) => vec![Outgoing::send_with(chat, booking_error_text(&e), self.main_menu())],
                }
            }
            Ok(Step::CapacityEntered { window, capacity }) => {
                self.state.sessions.remove(user);
                let chat = reply.chat();
                match self.state.settings.set_max_capacity(&window, capacity) {
                    Ok(previous) => {
                        tracing::info!(window = %window, previous, capacity, "Capacity changed");
                        let label = self.state.settings.window(&window).map(|w| w.label()).unwrap_or(window);
                        let text = format!("✏️ {label} capacity: {previous} → {capacity} seats.");
                        self.state.notifier.notify(&text).await;
                        vec![Outgoing::send_with(chat, text, self.main_menu())]
                    }
                    Err(e) => vec![Outgoing::send(chat, e.to_string())],
                }
            }
            Err(SessionError::Unexpected) => {
                vec![reply.with("That step is no longer active. Tap 📅 New booking to start again.", None)]
            }
            Err(e) => {
                // invalid input: stay on the same step
                let (text, keyboard) = self.prompt(state);
                vec![Reply::New(reply.chat()).with(format!("⚠️ {e}\n\n{text}"), keyboard)]
            }
        }
    }

    fn prompt(&self, state: &SessionState) -> (String, Option<Keyboard>) {
        match state {
            SessionState::AwaitingDate => (
                "📅 Choose a date:".into(),
                Some(keyboard::date_picker(self.today(), &self.state.config.closed_weekdays)),
            ),
            SessionState::AwaitingTime { date } => {
                let windows = self.windows();
                if windows.iter().all(|w| w.blocked) {
                    return (
                        "All services are closed for bookings.".into(),
                        Some(Keyboard::inline(vec![vec![keyboard::InlineButton::new(
                            "« Back",
                            &CallbackAction::BackToCalendar,
                        )]])),
                    );
                }
                (
                    format!("🕐 {}: choose a time:", date.format("%A %d %B")),
                    Some(keyboard::time_picker(&windows)),
                )
            }
            SessionState::AwaitingPartySize { date, time } => (
                format!("👥 {} at {}: how many guests?", date.format("%d/%m"), time.format("%H:%M")),
                Some(keyboard::party_picker()),
            ),
            SessionState::AwaitingName { party_size, .. } => {
                (format!("✍️ {party_size} guests. Name for the booking?"), None)
            }
            SessionState::AwaitingPhone { name, .. } => (
                format!("📞 Phone number for {}? Send <code>-</code> to skip.", render::escape(name)),
                None,
            ),
            SessionState::AwaitingCapacity { window } => {
                let current = self.state.settings.window(window).map(|w| w.max_capacity).unwrap_or(0);
                (
                    format!("✏️ Send the new capacity for {} (currently {current}):", render::escape(window)),
                    None,
                )
            }
        }
    }

    // ========== Views ==========

    async fn today_bookings(&self, chat: ChatId) -> Outgoing {
        match self.state.ledger.records_on(self.today()).await {
            Ok(mut records) => {
                records.sort_by_key(|r| r.scheduled_at);
                Outgoing::send(chat, render::reservation_list("📋 Today's bookings", &records, self.state.tz()))
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to list today's bookings");
                Outgoing::send(chat, "⚠️ Could not read the reservation sheet.")
            }
        }
    }

    async fn week_overview(&self, chat: ChatId) -> Outgoing {
        let calendar = self.state.calendar();
        if !calendar.is_enabled() {
            return Outgoing::send(chat, "🗓 No calendar configured.");
        }
        let (from, to) = time::week_bounds(self.today(), self.state.tz());
        match calendar.list_events(from, to).await {
            Ok(entries) => Outgoing::send(chat, render::week_overview(&entries, self.state.tz())),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read calendar");
                Outgoing::send(chat, "⚠️ Could not read the calendar.")
            }
        }
    }

    async fn month_calendar(&self, chat: ChatId) -> Outgoing {
        let calendar = self.state.calendar();
        if !calendar.is_enabled() {
            return Outgoing::send(chat, "📅 No calendar configured.");
        }
        let tz = self.state.tz();
        let link = self
            .state
            .config
            .calendar_id
            .as_deref()
            .and_then(|id| embed_url(id, tz));

        let now = Utc::now().with_timezone(&tz);
        let to = time::month_end(now.date_naive(), tz);
        match calendar.list_events(now.fixed_offset(), to).await {
            Ok(entries) => Outgoing::send(chat, render::month_overview(&entries, tz, link.as_deref())),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read calendar");
                let mut text = String::from("⚠️ Could not read the calendar.");
                if let Some(link) = &link {
                    text.push_str(&format!("\n\n<a href=\"{}\">📅 Full calendar</a>", render::escape(link)));
                }
                Outgoing::send(chat, text)
            }
        }
    }

    async fn debug_sheet(&self, chat: ChatId) -> Outgoing {
        let store = &self.state.store;
        match tokio::try_join!(store.headers(), store.rows()) {
            Ok((headers, rows)) => Outgoing::send(
                chat,
                render::debug_sheet(&headers, &rows, self.state.schema.current()),
            ),
            Err(e) => {
                tracing::error!(error = %e, "Failed to read sheet for debug view");
                Outgoing::send(chat, format!("⚠️ Could not read the sheet: {}", render::escape(&e.to_string())))
            }
        }
    }

    async fn capacity_status(&self) -> String {
        let today = self.today();
        let windows = self.windows();
        let mut snapshots = Vec::with_capacity(windows.len());
        for window in &windows {
            snapshots.push(self.state.ledger.snapshot(today, window).await);
        }
        render::capacity_status(
            &snapshots,
            &windows,
            self.state.settings.online_booking_blocked(),
            self.state.waitlist().len(),
        )
    }

    async fn arrivals_view(&self, reply: Reply, window: &str) -> Outgoing {
        let Some(w) = self.state.settings.window(window) else {
            return reply.with("Unknown service.", None);
        };
        if !self.state.arrivals.is_supported() {
            return reply.with(
                "Arrival tracking needs an <b>Arrived</b> column in the sheet. Add it, then /refresh.",
                None,
            );
        }
        match self.state.arrivals.list_today(window).await {
            Ok(records) => reply.with(
                render::arrivals_header(&w, &records),
                Some(keyboard::arrivals_keyboard(window, &records)),
            ),
            Err(e) => reply.with(arrival_error_text(&e), None),
        }
    }

    fn confirmation(&self, booked: &Booked) -> String {
        render::booking_confirmation(
            &booked.record,
            booked.service.as_deref(),
            booked.remaining,
            self.state.tz(),
        )
    }

    async fn notify_booked(&self, booked: &Booked) {
        self.state
            .notifier
            .notify(&render::staff_new_booking(&booked.record, self.state.tz()))
            .await;
    }
}

fn window_summary(window: &ServiceWindow) -> String {
    format!(
        "<b>{}</b> {:02}:00–{:02}:59\nCapacity: {} seats\nStatus: {}",
        render::escape(&window.label()),
        window.start_hour,
        window.end_hour,
        window.max_capacity,
        if window.blocked { "🔒 closed" } else { "🔓 open" }
    )
}

/// `2026-10-20 19:30 4 Ada Lovelace`
fn parse_quick_booking(args: &str) -> Option<(NaiveDate, NaiveTime, u32, String)> {
    let mut parts = args.split_whitespace();
    let date = NaiveDate::parse_from_str(parts.next()?, "%Y-%m-%d").ok()?;
    let time = NaiveTime::parse_from_str(parts.next()?, "%H:%M").ok()?;
    let party_size = parts
        .next()?
        .parse::<u32>()
        .ok()
        .filter(|n| (1..=MAX_PARTY_SIZE).contains(n))?;
    let name = parts.collect::<Vec<_>>().join(" ");
    (!name.is_empty()).then_some((date, time, party_size, name))
}

fn booking_error_text(error: &BookingError) -> String {
    match error {
        BookingError::Waitlisted { rejection, .. } => format!(
            "❌ {}\n\n📝 Your request has been added to the waitlist. We will contact you if a table frees up.",
            render::escape(&rejection.message())
        ),
        BookingError::Rejected(rejection) => format!("❌ {}", render::escape(&rejection.message())),
        BookingError::OnlineBookingClosed => "❌ Online bookings are currently closed.".into(),
        BookingError::Invalid(msg) => format!("⚠️ {}", render::escape(msg)),
        BookingError::Write(_) => "⚠️ Could not save the booking. Please try again.".into(),
    }
}

fn arrival_error_text(error: &ArrivalError) -> String {
    match error {
        ArrivalError::NotSupported => "Arrival tracking is not enabled for this sheet.".into(),
        ArrivalError::UnknownWindow(_) => "Unknown service.".into(),
        ArrivalError::RowNotFound(_) => "Booking not found. Refresh the list.".into(),
        ArrivalError::Store(_) | ArrivalError::Ledger(_) => {
            tracing::error!(error = %error, "Arrival tracking failed");
            "⚠️ Could not read the reservation sheet.".into()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::bot::notifier::testing::RecordingTransport;
    use crate::calendar::MemoryCalendar;
    use crate::core::Config;
    use crate::store::MemoryStore;

    const STAFF: ChatId = -100;

    async fn router(restrict: bool) -> (BotRouter, Arc<MemoryStore>, Arc<RecordingTransport>) {
        let mut config = Config::for_memory().unwrap();
        config.telegram_chat_id = Some(STAFF);
        config.telegram_restrict_chat = restrict;
        let store = Arc::new(MemoryStore::full());
        let transport = Arc::new(RecordingTransport::default());
        let state = ServerState::with_components(
            config,
            store.clone(),
            Arc::new(MemoryCalendar::new()),
            Some(transport.clone()),
        )
        .await
        .unwrap();
        (BotRouter::new(state), store, transport)
    }

    fn command(chat: ChatId, name: &str, args: &str) -> Incoming {
        Incoming::Command {
            chat,
            user: 7,
            name: name.into(),
            args: args.into(),
        }
    }

    #[tokio::test]
    async fn test_restricted_router_ignores_other_chats() {
        let (router, store, _) = router(true).await;
        let out = router.handle(command(42, "new", "2026-10-20 19:30 4 Ada")).await;
        assert_eq!(out, vec![Outgoing::send(42, "This bot is private.")]);
        assert!(store.is_empty());

        let out = router.handle(command(STAFF, "start", "")).await;
        assert!(out[0].text().unwrap().contains("Reservations"));
    }

    #[tokio::test]
    async fn test_quick_booking_bypasses_capacity() {
        let (router, store, transport) = router(false).await;
        router.settings_for_test().set_blocked("dinner", true).unwrap();

        let out = router.handle(command(1, "new", "2026-10-20 19:30 80 Banquet Party")).await;
        assert!(out[0].text().unwrap().contains("Booking confirmed"), "{out:?}");
        assert_eq!(store.len(), 1);
        assert_eq!(transport.sent.lock().len(), 1);

        let out = router.handle(command(1, "new", "tomorrow 4 Ada")).await;
        assert_eq!(out[0].text(), Some(NEW_USAGE));
    }

    #[tokio::test]
    async fn test_online_switch_from_menu_notifies_staff() {
        let (router, _, transport) = router(false).await;
        let text = Incoming::Text {
            chat: 1,
            user: 7,
            text: "🚫 Block online bookings".into(),
        };
        router.handle(text).await;
        assert!(router.settings_for_test().online_booking_blocked());

        let sent = transport.sent.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, STAFF);
    }

    #[tokio::test]
    async fn test_unknown_callback_is_answered() {
        let (router, _, _) = router(false).await;
        let out = router
            .handle(Incoming::Callback {
                chat: 1,
                user: 7,
                message_id: 10,
                callback_id: "cb".into(),
                data: "bogus".into(),
            })
            .await;
        assert_eq!(out, vec![Outgoing::answer("cb", Some("Unknown action"))]);
    }

    #[tokio::test]
    async fn test_text_without_session_shows_menu() {
        let (router, _, _) = router(false).await;
        let out = router
            .handle(Incoming::Text {
                chat: 1,
                user: 7,
                text: "hello".into(),
            })
            .await;
        assert!(matches!(&out[0], Outgoing::Send { keyboard: Some(Keyboard::Reply { .. }), .. }));
    }

    fn menu(text: &str) -> Incoming {
        Incoming::Text {
            chat: 1,
            user: 7,
            text: text.into(),
        }
    }

    #[tokio::test]
    async fn test_month_calendar_lists_upcoming_events_with_link() {
        use crate::calendar::{CalendarEvent, CalendarService};
        use chrono::Duration;

        let mut config = Config::for_memory().unwrap();
        config.calendar_id = Some("abc@group.calendar.google.com".into());
        let tz = config.timezone;
        let calendar = Arc::new(MemoryCalendar::new());
        let now = Utc::now().with_timezone(&tz);
        let event = |name: &str, at: chrono::DateTime<chrono_tz::Tz>| {
            CalendarEvent::for_reservation(
                name,
                2,
                at.fixed_offset(),
                Duration::minutes(120),
                "Phone",
                None,
                None,
                tz.name(),
            )
        };
        let soon = now + Duration::minutes(1);
        calendar.insert_event(event("Ada", soon)).await.unwrap();
        calendar.insert_event(event("Yesterday", now - Duration::days(1))).await.unwrap();

        let state = ServerState::with_components(
            config,
            Arc::new(MemoryStore::full()),
            calendar.clone(),
            None,
        )
        .await
        .unwrap();
        let router = BotRouter::new(state);

        let out = router.handle(menu("📅 This month")).await;
        let text = out[0].text().unwrap();
        assert!(text.contains("This month"));
        assert!(text.contains("src=abc%40group.calendar.google.com"));
        assert!(!text.contains("Yesterday"));
        if soon.fixed_offset() < time::month_end(now.date_naive(), tz) {
            assert!(text.contains("Réservation: Ada (2 pers.)"), "{text}");
        }

        calendar.set_failing(true);
        let out = router.handle(menu("📅 This month")).await;
        let text = out[0].text().unwrap();
        assert!(text.contains("Could not read the calendar"));
        assert!(text.contains("Full calendar"));
    }

    #[tokio::test]
    async fn test_debug_sheet_view() {
        use crate::store::StoreRow;
        use shared::columns;

        let (router, store, _) = router(false).await;
        store.push_raw(
            StoreRow::new()
                .with(columns::NAME, "Ada <3")
                .with(columns::PARTY_SIZE, "4")
                .with(columns::SOURCE, "Manual"),
        );

        let out = router.handle(menu("🔍 Debug sheet")).await;
        let text = out[0].text().unwrap();
        assert!(text.contains("Rows: 1"));
        assert!(text.contains("Phone/email: ON"));
        assert!(text.contains("Arrival tracking: ON"));
        assert!(text.contains("Ada &lt;3"));

        store.set_unavailable(true);
        let out = router.handle(menu("🔍 Debug sheet")).await;
        assert!(out[0].text().unwrap().contains("Could not read the sheet"));
    }

    #[test]
    fn test_parse_quick_booking() {
        assert_eq!(
            parse_quick_booking("2026-10-20 19:30 4 Ada  Lovelace"),
            Some((
                NaiveDate::from_ymd_opt(2026, 10, 20).unwrap(),
                NaiveTime::from_hms_opt(19, 30, 0).unwrap(),
                4,
                "Ada Lovelace".to_string()
            ))
        );
        assert!(parse_quick_booking("2026-10-20 19:30 4").is_none());
        assert!(parse_quick_booking("2026-10-20 7pm 4 Ada").is_none());
        assert!(parse_quick_booking("2026-10-20 19:30 0 Ada").is_none());
        assert!(parse_quick_booking("2026-10-20 19:30 4294967295 Ada").is_none());
        assert!(parse_quick_booking("2026-10-20 19:30 1001 Ada").is_none());
        assert!(parse_quick_booking("").is_none());
    }

    #[test]
    fn test_window_summary() {
        let mut window = ServiceWindow::new("dinner", 19, 22, 70);
        window.blocked = true;
        let text = window_summary(&window);
        assert!(text.contains("19:00–22:59"));
        assert!(text.contains("🔒 closed"));
    }
}
