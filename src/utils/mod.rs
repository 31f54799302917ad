//! Shared utility functions.
//!
//! Common utilities used across the codebase:
//! - String truncation (UTF-8 safe) and target slugs for file names
//! - Percentage formatting

mod format;
mod string;

pub use format::percentage;
pub use string::{target_slug, truncate_chars};
