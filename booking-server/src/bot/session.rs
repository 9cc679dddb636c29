//! 对话会话状态机 (per-user conversation sessions)
//!
//! ```text
//! (none) → AwaitingDate → AwaitingTime → AwaitingPartySize → AwaitingName
//!                                                              │
//!                                        [AwaitingPhone] ◄─────┤ (phone_email)
//!                                              │               │
//!                                              └──► Commit ◄───┘
//! ```
//!
//! 每个状态只携带该状态有效的字段。会话在提交后删除，
//! 闲置超过 TTL 视为过期。

use std::time::Duration;

use chrono::{NaiveDate, NaiveTime};
use dashmap::DashMap;
use shared::MAX_PARTY_SIZE;
use thiserror::Error;
use tokio::time::Instant;

use crate::reservations::SchemaCapabilities;

/// Chat user id
pub type UserId = i64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    AwaitingDate,
    AwaitingTime {
        date: NaiveDate,
    },
    AwaitingPartySize {
        date: NaiveDate,
        time: NaiveTime,
    },
    AwaitingName {
        date: NaiveDate,
        time: NaiveTime,
        party_size: u32,
    },
    AwaitingPhone {
        date: NaiveDate,
        time: NaiveTime,
        party_size: u32,
        name: String,
    },
    /// Operator is typing a new capacity for `window`
    AwaitingCapacity {
        window: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Date(NaiveDate),
    Time(NaiveTime),
    PartySize(u32),
    Text(String),
    BackToCalendar,
    BackToTime,
}

/// Everything needed to commit a chat booking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingDraft {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub party_size: u32,
    pub name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Continue(SessionState),
    Commit(BookingDraft),
    CapacityEntered { window: String, capacity: u32 },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("No active session")]
    Missing,

    #[error("Session expired")]
    Expired,

    #[error("Unexpected input for the current step")]
    Unexpected,

    #[error("Name cannot be empty")]
    EmptyName,

    #[error("Party size must be between 1 and {}", shared::MAX_PARTY_SIZE)]
    InvalidPartySize,

    #[error("Capacity must be a positive integer")]
    InvalidCapacity,
}

/// Texts accepted as "no phone number"
const SKIP_WORDS: [&str; 3] = ["-", "skip", "no"];

impl SessionState {
    /// Apply one event. Exactly one step forward, or one step back.
    pub fn advance(&self, event: SessionEvent, caps: SchemaCapabilities) -> Result<Step, SessionError> {
        use SessionEvent as E;
        use SessionState as S;

        let next = match (self, event) {
            (S::AwaitingCapacity { window }, E::Text(text)) => {
                let capacity = text
                    .trim()
                    .parse::<u32>()
                    .ok()
                    .filter(|c| *c > 0)
                    .ok_or(SessionError::InvalidCapacity)?;
                return Ok(Step::CapacityEntered {
                    window: window.clone(),
                    capacity,
                });
            }
            (S::AwaitingCapacity { .. }, _) => return Err(SessionError::Unexpected),

            (_, E::BackToCalendar) => S::AwaitingDate,

            (S::AwaitingDate, E::Date(date)) => S::AwaitingTime { date },

            (S::AwaitingTime { date }, E::Time(time)) => S::AwaitingPartySize { date: *date, time },

            (S::AwaitingPartySize { date, .. }, E::BackToTime) => S::AwaitingTime { date: *date },
            (S::AwaitingPartySize { date, time }, E::PartySize(party_size)) => {
                if !(1..=MAX_PARTY_SIZE).contains(&party_size) {
                    return Err(SessionError::InvalidPartySize);
                }
                S::AwaitingName {
                    date: *date,
                    time: *time,
                    party_size,
                }
            }
            (S::AwaitingPartySize { date, time }, E::Text(text)) => {
                let party_size = text
                    .trim()
                    .parse::<u32>()
                    .ok()
                    .filter(|n| (1..=MAX_PARTY_SIZE).contains(n))
                    .ok_or(SessionError::InvalidPartySize)?;
                S::AwaitingName {
                    date: *date,
                    time: *time,
                    party_size,
                }
            }

            (S::AwaitingName { date, time, party_size }, E::Text(text)) => {
                let name = text.trim().to_string();
                if name.is_empty() {
                    return Err(SessionError::EmptyName);
                }
                if caps.phone_email {
                    S::AwaitingPhone {
                        date: *date,
                        time: *time,
                        party_size: *party_size,
                        name,
                    }
                } else {
                    return Ok(Step::Commit(BookingDraft {
                        date: *date,
                        time: *time,
                        party_size: *party_size,
                        name,
                        phone: None,
                    }));
                }
            }

            (S::AwaitingPhone { date, time, party_size, name }, E::Text(text)) => {
                let text = text.trim();
                let phone = (!text.is_empty() && !SKIP_WORDS.contains(&text.to_lowercase().as_str()))
                    .then(|| text.to_string());
                return Ok(Step::Commit(BookingDraft {
                    date: *date,
                    time: *time,
                    party_size: *party_size,
                    name: name.clone(),
                    phone,
                }));
            }

            _ => return Err(SessionError::Unexpected),
        };
        Ok(Step::Continue(next))
    }
}

struct Session {
    state: SessionState,
    touched: Instant,
}

/// Sessions keyed by chat user, expired after `ttl` of inactivity
pub struct SessionStore {
    sessions: DashMap<UserId, Session>,
    ttl: Duration,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("active", &self.sessions.len())
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    /// Current state; an expired session is removed and reported
    pub fn get(&self, user: UserId) -> Result<SessionState, SessionError> {
        {
            let session = self.sessions.get(&user).ok_or(SessionError::Missing)?;
            if session.touched.elapsed() < self.ttl {
                return Ok(session.state.clone());
            }
        }
        self.sessions.remove(&user);
        Err(SessionError::Expired)
    }

    /// Replace (or start) the user's session
    pub fn set(&self, user: UserId, state: SessionState) {
        self.sessions.insert(
            user,
            Session {
                state,
                touched: Instant::now(),
            },
        );
    }

    pub fn remove(&self, user: UserId) {
        self.sessions.remove(&user);
    }

    /// Drop expired sessions, returning how many went
    pub fn sweep(&self) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, s| s.touched.elapsed() < self.ttl);
        before - self.sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
