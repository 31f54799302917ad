pub mod cli;
pub mod config;
pub mod correlate;
pub mod error;
pub mod fusion;
pub mod notification;
pub mod probe;
pub mod probes;
pub mod report;
pub mod scan;
pub mod service;
pub mod utils;

pub use config::DragnetConfig;
pub use correlate::{CorrelatedCategoryResult, Entity, EntityCategory};
pub use error::{ProbeError, Result, ScanError};
pub use fusion::{AggregatedReport, PhaseReport, ScanSummary};
pub use probe::{Phase, Probe, ProbeOutcome, ScanPlan, TaggedOutcome};
pub use report::ReportStore;
pub use scan::{ScanHandle, ScanOptions, ScanOrchestrator, ScanState};
pub use service::{Investigation, InvestigationRequest, InvestigationService, InvestigationStatus};
