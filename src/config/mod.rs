//! Configuration types and loading.
//!
//! Provides all configuration structures for dragnet:
//! - `DragnetConfig`: Top-level configuration with validation
//! - Section configs: engine, correlation, report, notification

mod settings;

pub use settings::{
    CorrelationConfig, DragnetConfig, EngineConfig, NotificationConfig, ReportConfig,
};
