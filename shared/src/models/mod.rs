//! Data models
//!
//! Shared between booking-server and API consumers.
//! Persisted rows are addressed by column name, see [`reservation::columns`].

pub mod arrival;
pub mod reservation;
pub mod service;
pub mod waitlist;

// Re-exports
pub use arrival::*;
pub use reservation::*;
pub use service::*;
pub use waitlist::*;
