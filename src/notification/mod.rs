//! Scan event notification system.
//!
//! Provides notifications for scan lifecycle events:
//! - `ScanEvent`: Event types (started, settled, aborted, etc.)
//! - `Notifier`: Cross-platform notification delivery

mod events;
mod notifier;

pub use events::{ScanEvent, ScanEventType};
pub use notifier::Notifier;
