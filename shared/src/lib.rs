//! Shared types for the booking service
//!
//! Data models used by the booking server and by anything that talks to
//! its API: service windows, capacity snapshots, reservation records,
//! waitlist entries and arrival statistics.

pub mod models;

// Re-exports
pub use models::*;
pub use serde::{Deserialize, Serialize};
