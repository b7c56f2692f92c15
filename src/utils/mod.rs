//! Utility functions and helpers
//!
//! Atomic file writes, timestamp helpers and the single-slot pending result.

pub mod atomic;
pub mod pending;
pub mod time;

pub use atomic::{atomic_create, atomic_write, cleanup_temp_files};
pub use pending::PendingResult;
pub use time::{days_to_duration, format_rfc3339, fractional_days, parse_rfc3339};
