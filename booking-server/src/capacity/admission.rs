//! Admission controller
//!
//! 判定顺序：时段归类 → 时段是否关闭 → 剩余容量 ≥ 人数。
//! 不做部分准入，也不预留座位；每次判定都是一次独立读取。

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Timelike};
use chrono_tz::Tz;
use serde::Serialize;
use shared::ServiceWindow;

use super::{CapacityLedger, CapacitySettings};

/// What to do when usage cannot be read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CapacityReadFailure {
    /// Reject with [`RejectionReason::CapacityUnknown`]
    #[default]
    Reject,
    /// Treat usage as 0
    AssumeEmpty,
}

impl FromStr for CapacityReadFailure {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "assume_empty" | "assume-empty" => Ok(Self::AssumeEmpty),
            other => Err(format!("expected reject or assume_empty, got {other:?}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RejectionReason {
    OutsideHours,
    ServiceBlocked,
    InsufficientCapacity,
    CapacityUnknown,
}

impl RejectionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OutsideHours => "outside-hours",
            Self::ServiceBlocked => "service-blocked",
            Self::InsufficientCapacity => "insufficient-capacity",
            Self::CapacityUnknown => "capacity-unknown",
        }
    }
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub reason: RejectionReason,
    /// Matched window, absent when outside hours
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    /// Seats left at check time (insufficient capacity only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u32>,
    pub needed: u32,
}

impl Rejection {
    fn new(reason: RejectionReason, window: Option<&ServiceWindow>, needed: u32) -> Self {
        Self {
            reason,
            service: window.map(|w| w.name.clone()),
            remaining: None,
            needed,
        }
    }

    /// Short message shown to the guest
    pub fn message(&self) -> String {
        let service = self.service.as_deref().unwrap_or("this");
        match self.reason {
            RejectionReason::OutsideHours => {
                "Sorry, we are not serving at that time.".to_string()
            }
            RejectionReason::ServiceBlocked => {
                format!("Sorry, the {service} service is closed for bookings.")
            }
            RejectionReason::InsufficientCapacity => format!(
                "Sorry, not enough seats for {service}: {} left, {} requested.",
                self.remaining.unwrap_or(0),
                self.needed
            ),
            RejectionReason::CapacityUnknown => {
                "Sorry, we cannot confirm availability right now. Please try again shortly."
                    .to_string()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionDecision {
    Admitted {
        service: String,
        /// Seats left once this party is seated
        remaining: u32,
    },
    Rejected(Rejection),
}

impl AdmissionDecision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted { .. })
    }
}

#[derive(Debug, Clone)]
pub struct AdmissionController {
    settings: Arc<CapacitySettings>,
    ledger: CapacityLedger,
    on_read_failure: CapacityReadFailure,
}

impl AdmissionController {
    pub fn new(
        settings: Arc<CapacitySettings>,
        ledger: CapacityLedger,
        on_read_failure: CapacityReadFailure,
    ) -> Self {
        Self {
            settings,
            ledger,
            on_read_failure,
        }
    }

    pub fn settings(&self) -> &Arc<CapacitySettings> {
        &self.settings
    }

    pub fn ledger(&self) -> &CapacityLedger {
        &self.ledger
    }

    /// Decide whether `party_size` guests fit at `instant`.
    ///
    /// A plain read: two concurrent calls may both admit against the
    /// same remaining seats.
    pub async fn check(&self, instant: &DateTime<Tz>, party_size: u32) -> AdmissionDecision {
        let local = instant.with_timezone(&self.ledger.timezone());

        let Some(window) = self.settings.classify(local.hour()) else {
            return AdmissionDecision::Rejected(Rejection::new(
                RejectionReason::OutsideHours,
                None,
                party_size,
            ));
        };

        if window.blocked {
            return AdmissionDecision::Rejected(Rejection::new(
                RejectionReason::ServiceBlocked,
                Some(&window),
                party_size,
            ));
        }

        let used = match self.ledger.used_seats(local.date_naive(), &window).await {
            Ok(used) => used,
            Err(e) => match self.on_read_failure {
                CapacityReadFailure::Reject => {
                    tracing::error!(window = %window.name, error = %e, "Capacity unknown, rejecting");
                    return AdmissionDecision::Rejected(Rejection::new(
                        RejectionReason::CapacityUnknown,
                        Some(&window),
                        party_size,
                    ));
                }
                CapacityReadFailure::AssumeEmpty => {
                    tracing::warn!(window = %window.name, error = %e, "Capacity unknown, assuming empty");
                    0
                }
            },
        };

        let remaining = window.max_capacity.saturating_sub(used);
        if party_size <= remaining {
            AdmissionDecision::Admitted {
                service: window.name,
                remaining: remaining - party_size,
            }
        } else {
            let mut rejection =
                Rejection::new(RejectionReason::InsufficientCapacity, Some(&window), party_size);
            rejection.remaining = Some(remaining);
            AdmissionDecision::Rejected(rejection)
        }
    }
}
