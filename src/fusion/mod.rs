//! Fusion of per-phase correlated results into one report.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::correlate::{CorrelatedCategoryResult, Entity};
use crate::error::{Result, ScanError};
use crate::scan::ScanSnapshot;

/// One phase's contribution to the fused report.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PhaseReport {
    Available {
        /// Correlated results keyed by the category payload key.
        categories: BTreeMap<String, CorrelatedCategoryResult>,
    },
    Unavailable {
        reason: String,
    },
}

impl PhaseReport {
    pub fn available(results: Vec<CorrelatedCategoryResult>) -> Self {
        let categories = results
            .into_iter()
            .map(|r| (r.category.payload_key().to_string(), r))
            .collect();
        Self::Available { categories }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available { .. })
    }
}

/// Cross-phase rollup carried in the fused report.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ScanSummary {
    pub phases_attempted: usize,
    pub phases_unavailable: usize,
    /// Unique entity values per category, re-deduplicated across phases.
    pub unique_entities: BTreeMap<String, Vec<String>>,
    /// Records flagged with a contact indicator.
    pub critical_findings: usize,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub success_rate: f64,
    pub probe_failures: usize,
}

/// Final per-scan document handed to persistence or a caller.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AggregatedReport {
    pub target: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub per_phase: BTreeMap<String, PhaseReport>,
    pub summary: ScanSummary,
}

impl AggregatedReport {
    pub fn phase(&self, name: &str) -> Option<&PhaseReport> {
        self.per_phase.get(name)
    }

    /// Correlated result for one category inside one available phase.
    pub fn category_in_phase(&self, phase: &str, key: &str) -> Option<&CorrelatedCategoryResult> {
        match self.per_phase.get(phase)? {
            PhaseReport::Available { categories } => categories.get(key),
            PhaseReport::Unavailable { .. } => None,
        }
    }
}

/// Assemble the final report from per-phase results and the snapshot.
///
/// Partial data never fails fusion: unavailable phases keep their reason
/// in place and the summary counts them. The only error is an empty phase
/// set, which means the caller had nothing to scan.
pub fn fuse(
    target: &str,
    phase_reports: Vec<(String, PhaseReport)>,
    snapshot: &ScanSnapshot,
) -> Result<AggregatedReport> {
    if phase_reports.is_empty() {
        return Err(ScanError::NothingToFuse);
    }

    let phases_attempted = phase_reports.len();
    let phases_unavailable = phase_reports
        .iter()
        .filter(|(_, r)| !r.is_available())
        .count();

    let mut merged: BTreeMap<String, BTreeSet<&Entity>> = BTreeMap::new();
    for (_, report) in &phase_reports {
        if let PhaseReport::Available { categories } = report {
            for (key, result) in categories {
                merged
                    .entry(key.clone())
                    .or_default()
                    .extend(result.unique_entities.iter());
            }
        }
    }
    let unique_entities: BTreeMap<String, Vec<String>> = merged
        .into_iter()
        .map(|(key, entities)| (key, entities.into_iter().map(|e| e.value.clone()).collect()))
        .collect();

    let summary = ScanSummary {
        phases_attempted,
        phases_unavailable,
        unique_entities,
        critical_findings: snapshot.contact_flag_count(),
        total_tasks: snapshot.metadata.total_tasks,
        completed_tasks: snapshot.metadata.completed_tasks,
        success_rate: snapshot.metadata.success_rate(),
        probe_failures: snapshot.failures.len(),
    };

    debug!(
        target,
        phases = phases_attempted,
        unavailable = phases_unavailable,
        "Report fused"
    );

    Ok(AggregatedReport {
        target: target.to_string(),
        started_at: snapshot.metadata.started_at,
        completed_at: Utc::now(),
        per_phase: phase_reports.into_iter().collect(),
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlate::EntityCategory;
    use crate::scan::ScanMetadata;

    fn snapshot() -> ScanSnapshot {
        ScanSnapshot {
            records: vec![],
            failures: vec![],
            metadata: ScanMetadata {
                started_at: Utc::now(),
                total_tasks: 4,
                completed_tasks: 4,
            },
        }
    }

    fn category(category: EntityCategory, values: &[&str]) -> CorrelatedCategoryResult {
        CorrelatedCategoryResult {
            category,
            unique_entities: values.iter().map(|v| Entity::new(category, v)).collect(),
            confidence: 1.0,
        }
    }

    #[test]
    fn test_unavailable_phase_counted_and_siblings_kept() {
        let reports = vec![
            (
                "surface".to_string(),
                PhaseReport::available(vec![category(
                    EntityCategory::Email,
                    &["a@x.com", "b@x.com"],
                )]),
            ),
            (
                "deep".to_string(),
                PhaseReport::unavailable("malformed payload"),
            ),
        ];

        let report = fuse("acme", reports, &snapshot()).unwrap();
        assert_eq!(report.summary.phases_attempted, 2);
        assert_eq!(report.summary.phases_unavailable, 1);

        let emails = report.category_in_phase("surface", "emails").unwrap();
        assert_eq!(emails.entity_count(), 2);
        assert!(report.category_in_phase("deep", "emails").is_none());
    }

    #[test]
    fn test_union_re_deduplicates_across_phases() {
        let reports = vec![
            (
                "p1".to_string(),
                PhaseReport::available(vec![category(
                    EntityCategory::Email,
                    &["a@x.com", "b@x.com"],
                )]),
            ),
            (
                "p2".to_string(),
                PhaseReport::available(vec![category(
                    EntityCategory::Email,
                    &["a@x.com", "c@x.com"],
                )]),
            ),
        ];

        let report = fuse("acme", reports, &snapshot()).unwrap();
        let emails = &report.summary.unique_entities["emails"];
        assert_eq!(emails.len(), 3);
    }

    #[test]
    fn test_empty_phase_set_is_error() {
        let err = fuse("acme", vec![], &snapshot()).unwrap_err();
        assert!(matches!(err, ScanError::NothingToFuse));
    }

    #[test]
    fn test_all_phases_unavailable_still_reports() {
        let reports = vec![
            ("p1".to_string(), PhaseReport::unavailable("fault a")),
            ("p2".to_string(), PhaseReport::unavailable("fault b")),
        ];

        let report = fuse("acme", reports, &snapshot()).unwrap();
        assert_eq!(report.summary.phases_unavailable, 2);
        assert!(report.summary.unique_entities.is_empty());
    }
}
