//! 容量准入与统计引擎 (capacity admission & accounting)
//!
//! # 结构
//!
//! ```text
//! instant ──► classifier ──► ServiceWindow
//!                                 │
//!                 settings ◄──────┤ (blocked / max_capacity)
//!                                 │
//!                   ledger ◄──────┘ (Σ party_size, re-read per call)
//!                                 │
//!                                 ▼
//!                        AdmissionDecision
//! ```
//!
//! Every check re-reads the store. Nothing here serializes concurrent
//! checks; see `booking::BookingService` for the per-window lock.

pub mod admission;
pub mod classifier;
pub mod ledger;
pub mod settings;

pub use admission::{
    AdmissionController, AdmissionDecision, CapacityReadFailure, Rejection, RejectionReason,
};
pub use classifier::{classify, overlapping_windows};
pub use ledger::{CapacityLedger, LedgerError};
pub use settings::{CapacitySettings, SettingsError};
