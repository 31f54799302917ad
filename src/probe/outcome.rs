//! Outcome types for probe invocations.

use crate::error::ProbeError;

use super::Payload;

/// Terminal result of one probe invocation.
///
/// Every dispatched probe settles as exactly one of these; a panic or an
/// error inside a probe becomes a `Failure`, never a scan error.
#[derive(Debug, Clone)]
pub enum ProbeOutcome {
    Success { payload: Payload },
    Failure { error: ProbeError },
}

impl ProbeOutcome {
    pub fn success(payload: Payload) -> Self {
        Self::Success { payload }
    }

    pub fn failure(error: ProbeError) -> Self {
        Self::Failure { error }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }
}

/// A probe outcome tagged with its origin, as sent to the aggregator.
#[derive(Debug, Clone)]
pub struct TaggedOutcome {
    pub phase: String,
    pub probe: String,
    pub outcome: ProbeOutcome,
    /// Source reliability weight carried from the probe.
    pub reliability: f64,
    /// Payload keys the probe was expected to populate.
    pub expected_keys: Vec<String>,
}

impl TaggedOutcome {
    pub fn new(phase: impl Into<String>, probe: impl Into<String>, outcome: ProbeOutcome) -> Self {
        Self {
            phase: phase.into(),
            probe: probe.into(),
            outcome,
            reliability: 1.0,
            expected_keys: Vec::new(),
        }
    }

    pub fn with_reliability(mut self, reliability: f64) -> Self {
        self.reliability = reliability;
        self
    }

    pub fn with_expected_keys(mut self, keys: Vec<String>) -> Self {
        self.expected_keys = keys;
        self
    }
}
