use std::time::Duration;

use crate::config::DragnetConfig;
use crate::correlate::EntityCategory;

/// Tunables for one scan run.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Upper bound on probes running at once, shared across phases.
    pub max_concurrent_probes: usize,
    /// Per-probe deadline; None leaves probes unbounded.
    pub probe_deadline: Option<Duration>,
    /// Emit a progress log line every N ingested outcomes.
    pub progress_interval: usize,
    /// Categories the correlation stage extracts.
    pub categories: Vec<EntityCategory>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_concurrent_probes: 50,
            probe_deadline: None,
            progress_interval: 10,
            categories: EntityCategory::ALL.to_vec(),
        }
    }
}

impl ScanOptions {
    pub fn from_config(config: &DragnetConfig) -> Self {
        Self {
            max_concurrent_probes: config.engine.max_concurrent_probes,
            probe_deadline: config.engine.probe_deadline(),
            progress_interval: config.engine.progress_interval,
            categories: config.correlation.categories.clone(),
        }
    }

    pub fn with_max_concurrent_probes(mut self, max: usize) -> Self {
        self.max_concurrent_probes = max;
        self
    }

    pub fn with_probe_deadline(mut self, deadline: Duration) -> Self {
        self.probe_deadline = Some(deadline);
        self
    }

    pub fn with_categories(mut self, categories: Vec<EntityCategory>) -> Self {
        self.categories = categories;
        self
    }
}
