//! HTTP request handlers for the alerter status API.
//!
//! - `common` - Shared response types
//! - `status` - Read-only snapshots of nodes and systems
//! - `alive_reminder` - Muting and unmuting the periodic alive reminder

pub mod alive_reminder;
pub mod common;
pub mod status;

pub use alive_reminder::*;
pub use status::*;
