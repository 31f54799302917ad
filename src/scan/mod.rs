//! Scan lifecycle: validation, dispatch, collection, correlation, fusion.
//!
//! `ScanOrchestrator` drives a run through the state machine; the
//! aggregator is the single writer for everything probes produce.

mod aggregator;
mod handle;
mod options;
mod orchestrator;
mod state;

pub use aggregator::{
    Aggregator, FailureNote, QuickAnalysis, RawResultRecord, ScanMetadata, ScanSnapshot,
    quick_analyze,
};
pub use handle::ScanHandle;
pub use options::ScanOptions;
pub use orchestrator::ScanOrchestrator;
pub use state::{ScanState, ScanStateMachine, StateTransition};
