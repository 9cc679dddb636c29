//! Conversational booking through the bot router with in-memory adapters

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use booking_server::bot::{BotRouter, ChatTransport, Incoming, Keyboard, Outgoing};
use booking_server::bot::{ChatError, ChatId};
use booking_server::calendar::MemoryCalendar;
use booking_server::store::{MemoryStore, ReservationStore, StoreRow};
use booking_server::{Config, ServerState};
use parking_lot::Mutex;
use shared::columns;

const STAFF: ChatId = -500;
const GUEST: ChatId = 11;
const USER: i64 = 11;

#[derive(Debug, Default)]
struct StaffChat {
    sent: Mutex<Vec<String>>,
}

#[async_trait]
impl ChatTransport for StaffChat {
    async fn send_message(&self, _chat: ChatId, text: &str, _keyboard: Option<&Keyboard>) -> Result<(), ChatError> {
        self.sent.lock().push(text.to_string());
        Ok(())
    }

    async fn edit_message(
        &self,
        _chat: ChatId,
        _message_id: i64,
        text: &str,
        _keyboard: Option<&Keyboard>,
    ) -> Result<(), ChatError> {
        self.sent.lock().push(text.to_string());
        Ok(())
    }

    async fn answer_callback(&self, _callback_id: &str, _text: Option<&str>) -> Result<(), ChatError> {
        Ok(())
    }
}

struct Harness {
    router: BotRouter,
    state: ServerState,
    store: Arc<MemoryStore>,
    staff: Arc<StaffChat>,
}

impl Harness {
    async fn new() -> Self {
        Self::with_ttl(Duration::from_secs(1800)).await
    }

    async fn with_ttl(ttl: Duration) -> Self {
        let mut config = Config::for_memory().unwrap();
        config.telegram_chat_id = Some(STAFF);
        config.session_ttl = ttl;
        let store = Arc::new(MemoryStore::full());
        let staff = Arc::new(StaffChat::default());
        let state = ServerState::with_components(
            config,
            store.clone(),
            Arc::new(MemoryCalendar::new()),
            Some(staff.clone()),
        )
        .await
        .unwrap();
        Self {
            router: BotRouter::new(state.clone()),
            state,
            store,
            staff,
        }
    }

    async fn text(&self, text: &str) -> Vec<Outgoing> {
        self.router
            .handle(Incoming::Text {
                chat: GUEST,
                user: USER,
                text: text.into(),
            })
            .await
    }

    async fn press(&self, data: &str) -> Vec<Outgoing> {
        self.router
            .handle(Incoming::Callback {
                chat: GUEST,
                user: USER,
                message_id: 99,
                callback_id: format!("cb-{data}"),
                data: data.into(),
            })
            .await
    }

    /// Walk the menus up to the name prompt
    async fn pick(&self, date: &str, time: &str, party: u32) {
        self.text("📅 New booking").await;
        self.press(&format!("date_{date}")).await;
        self.press(&format!("time_{time}")).await;
        self.press(&format!("party_{party}")).await;
    }
}

fn last_text(out: &[Outgoing]) -> &str {
    out.iter().rev().find_map(Outgoing::text).unwrap_or_default()
}

fn seated(store: &MemoryStore, party: u32, at: &str, arrived: &str) {
    store.push_raw(
        StoreRow::new()
            .with(columns::TIMESTAMP, "2026-10-01T10:00:00.000Z")
            .with(columns::NAME, "Existing")
            .with(columns::PARTY_SIZE, party.to_string())
            .with(columns::DATE_TIME, at)
            .with(columns::SOURCE, "Phone")
            .with(columns::ARRIVED, arrived),
    );
}

#[tokio::test]
async fn test_full_conversation_books_a_table() {
    let h = Harness::new().await;

    let out = h.text("📅 New booking").await;
    assert!(matches!(&out[0], Outgoing::Send { keyboard: Some(Keyboard::Inline { .. }), .. }));

    let out = h.press("date_2026-10-20").await;
    assert!(matches!(&out[0], Outgoing::Answer { .. }));
    assert!(matches!(&out[1], Outgoing::Edit { message_id: 99, .. }));
    assert!(last_text(&out).contains("choose a time"));

    let out = h.press("time_19:30").await;
    assert!(last_text(&out).contains("how many guests"));

    let out = h.press("party_4").await;
    assert!(last_text(&out).contains("Name for the booking"));

    let out = h.text("Ada Lovelace").await;
    assert!(last_text(&out).contains("Phone number"));

    let out = h.text("06 12 34 56 78").await;
    let confirmation = last_text(&out);
    assert!(confirmation.contains("Booking confirmed"), "{confirmation}");
    assert!(confirmation.contains("66 seats left for dinner"), "{confirmation}");

    let rows = h.store.rows().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get(columns::NAME), Some("Ada Lovelace"));
    assert_eq!(rows[0].get(columns::PARTY_SIZE), Some("4"));
    assert_eq!(rows[0].get(columns::SOURCE), Some("Phone"));
    assert_eq!(rows[0].get(columns::PHONE_NUMBER), Some("06 12 34 56 78"));

    assert_eq!(h.staff.sent.lock().len(), 1);
    assert!(h.state.sessions.is_empty());
}

#[tokio::test]
async fn test_full_service_puts_guest_on_waitlist() {
    let h = Harness::new().await;
    seated(&h.store, 70, "2026-10-20T20:00:00+02:00", "No");

    h.pick("2026-10-20", "19:30", 2).await;
    h.text("Grace").await;
    let out = h.text("skip").await;

    assert!(last_text(&out).contains("waitlist"), "{}", last_text(&out));
    assert_eq!(h.store.len(), 1);
    let waitlist = h.state.waitlist().list();
    assert_eq!(waitlist.len(), 1);
    assert_eq!(waitlist[0].customer_name, "Grace");
    assert!(h.staff.sent.lock().is_empty());
}

#[tokio::test]
async fn test_party_size_can_be_typed() {
    let h = Harness::new().await;
    h.text("📅 New booking").await;
    h.press("date_2026-10-20").await;
    h.press("time_12:30").await;

    let out = h.text("twelve").await;
    assert!(last_text(&out).contains("Party size must be between 1 and"));

    let out = h.text("12").await;
    assert!(last_text(&out).contains("12 guests"));
}

#[tokio::test]
async fn test_back_buttons_step_back() {
    let h = Harness::new().await;
    h.text("📅 New booking").await;
    h.press("date_2026-10-20").await;
    h.press("time_19:30").await;

    let out = h.press("back_to_time").await;
    assert!(last_text(&out).contains("choose a time"));
    let out = h.press("back_to_calendar").await;
    assert!(last_text(&out).contains("Choose a date"));
}

#[tokio::test]
async fn test_expired_session_asks_to_restart() {
    let h = Harness::with_ttl(Duration::ZERO).await;
    h.text("📅 New booking").await;

    let out = h.press("date_2026-10-20").await;
    assert!(last_text(&out).contains("expired"));

    let out = h.text("Ada").await;
    assert!(last_text(&out).contains("menu"));
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn test_operator_edits_capacity() {
    let h = Harness::new().await;

    let out = h.press("edit_capacity_dinner").await;
    assert!(last_text(&out).contains("currently 70"));

    let out = h.text("0").await;
    assert!(last_text(&out).contains("positive integer"));

    let out = h.text("85").await;
    assert!(last_text(&out).contains("70 → 85"));
    assert_eq!(h.state.settings.window("dinner").unwrap().max_capacity, 85);
    assert_eq!(h.staff.sent.lock().len(), 1);
}

#[tokio::test]
async fn test_operator_closes_a_service() {
    let h = Harness::new().await;

    let out = h.press("toggle_service_lunch").await;
    assert!(last_text(&out).contains("closed for bookings"));
    assert!(h.state.settings.window("lunch").unwrap().blocked);

    h.pick("2026-10-20", "12:30", 2).await;
    h.text("Ada").await;
    let out = h.text("-").await;
    assert!(last_text(&out).contains("closed"));
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn test_arrivals_toggle_marks_row() {
    let h = Harness::new().await;
    let today = booking_server::utils::time::today(h.state.tz());
    seated(&h.store, 4, &format!("{today}T19:30:00"), "No");
    seated(&h.store, 2, &format!("{today}T20:00:00"), "Yes");

    let out = h.text("✅ Arrivals: Dinner").await;
    let Outgoing::Send { keyboard: Some(keyboard), .. } = &out[0] else {
        panic!("expected arrivals keyboard, got {out:?}");
    };
    assert!(keyboard.buttons().iter().any(|b| b.callback_data == "toggle_arrival_dinner_0"));

    h.press("toggle_arrival_dinner_0").await;
    let rows = h.store.rows().await.unwrap();
    assert_eq!(rows[0].get(columns::ARRIVED), Some("Yes"));

    let stats = h.state.arrivals.stats_today("dinner").await.unwrap();
    assert_eq!(stats.arrived_reservations, 2);
    assert_eq!(stats.total_reservations, 2);
}

#[tokio::test]
async fn test_quick_command_and_lists() {
    let h = Harness::new().await;
    let out = h
        .router
        .handle(Incoming::Command {
            chat: GUEST,
            user: USER,
            name: "new".into(),
            args: "2026-10-20 19:00 3 Walk In".into(),
        })
        .await;
    assert!(last_text(&out).contains("Booking confirmed"));
    assert_eq!(h.store.rows().await.unwrap()[0].get(columns::SOURCE), Some("Manual"));

    let out = h
        .router
        .handle(Incoming::Command {
            chat: GUEST,
            user: USER,
            name: "waitlist".into(),
            args: String::new(),
        })
        .await;
    assert_eq!(out.len(), 1);
}
