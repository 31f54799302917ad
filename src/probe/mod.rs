//! Probe abstractions and scan phases.
//!
//! A probe queries one source for fragments about a target and returns a
//! JSON object payload. Probes inside a phase fan out concurrently through
//! a shared permit pool; phases themselves run concurrently during a scan.

mod outcome;
mod registry;

pub use outcome::{ProbeOutcome, TaggedOutcome};
pub use registry::{PhaseSpec, ProbeSpec, ScanPlan};

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ProbeError;

/// JSON object payload returned by a successful probe.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// A single data source queried during a scan.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Query the source for the given target.
    ///
    /// Failures are returned as values; the engine converts them into
    /// failure outcomes and the scan keeps running.
    async fn invoke(&self, target: &str) -> std::result::Result<Payload, ProbeError>;

    fn name(&self) -> &str;

    /// Payload keys this probe is expected to populate. Drives the
    /// completeness sub-score; an empty slice means no expectation.
    fn expected_keys(&self) -> &[String] {
        &[]
    }

    /// Static source reliability weight in [0.0, 1.0].
    fn reliability(&self) -> f64 {
        1.0
    }
}

/// Named group of probes dispatched together.
#[derive(Clone, Default)]
pub struct Phase {
    pub name: String,
    pub probes: Vec<Arc<dyn Probe>>,
}

impl Phase {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            probes: Vec::new(),
        }
    }

    pub fn with_probe(mut self, probe: impl Probe + 'static) -> Self {
        self.probes.push(Arc::new(probe));
        self
    }

    pub fn probe_count(&self) -> usize {
        self.probes.len()
    }
}

impl std::fmt::Debug for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let probes: Vec<&str> = self.probes.iter().map(|p| p.name()).collect();
        f.debug_struct("Phase")
            .field("name", &self.name)
            .field("probes", &probes)
            .finish()
    }
}
