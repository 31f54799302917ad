use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info};

use crate::probe::{Payload, ProbeOutcome, TaggedOutcome};
use crate::utils;

/// Case-insensitive markers that flag a record as a critical finding.
const CONTACT_INDICATORS: [&str; 5] = ["@", "phone", "email", "contact", "mobile"];

/// Lightweight per-record analysis computed at ingestion time.
#[derive(Debug, Clone)]
pub struct QuickAnalysis {
    /// Length of the serialized payload in bytes.
    pub data_size: usize,
    pub has_contact_indicator: bool,
    /// Mean of completeness, consistency and source reliability, in [0,1].
    pub confidence_score: f64,
}

/// One successful probe payload with its ingestion bookkeeping.
#[derive(Debug, Clone)]
pub struct RawResultRecord {
    pub phase: String,
    pub probe: String,
    pub payload: Payload,
    pub timestamp: DateTime<Utc>,
    pub quick_analysis: QuickAnalysis,
}

/// A probe failure as recorded by the aggregator.
///
/// Failures never become records and never reach correlation; they are
/// kept aside and counted toward completion.
#[derive(Debug, Clone)]
pub struct FailureNote {
    pub phase: String,
    pub probe: String,
    pub error: String,
    pub transient: bool,
    pub timestamp: DateTime<Utc>,
}

/// Run metadata the aggregator maintains.
#[derive(Debug, Clone)]
pub struct ScanMetadata {
    pub started_at: DateTime<Utc>,
    /// Set once at dispatch: the number of probes the scan will run.
    pub total_tasks: usize,
    /// Incremented exactly once per ingested outcome, success or failure.
    pub completed_tasks: usize,
}

impl ScanMetadata {
    pub fn success_rate(&self) -> f64 {
        utils::percentage(self.completed_tasks, self.total_tasks)
    }
}

/// Immutable view handed to correlation and fusion after collection.
#[derive(Debug, Clone)]
pub struct ScanSnapshot {
    pub records: Vec<RawResultRecord>,
    pub failures: Vec<FailureNote>,
    pub metadata: ScanMetadata,
}

impl ScanSnapshot {
    /// Number of records flagged as carrying contact indicators.
    pub fn contact_flag_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.quick_analysis.has_contact_indicator)
            .count()
    }
}

/// Single-writer accumulator for probe outcomes.
///
/// Exactly one aggregator exists per scan, owned by the collector task and
/// fed through a channel, so the record store and the completion counter
/// always move together.
#[derive(Debug)]
pub struct Aggregator {
    records: Vec<RawResultRecord>,
    failures: Vec<FailureNote>,
    metadata: ScanMetadata,
    progress_interval: usize,
    last_timestamp: DateTime<Utc>,
}

impl Aggregator {
    pub fn new(total_tasks: usize, progress_interval: usize) -> Self {
        let started_at = Utc::now();
        Self {
            records: Vec::new(),
            failures: Vec::new(),
            metadata: ScanMetadata {
                started_at,
                total_tasks,
                completed_tasks: 0,
            },
            progress_interval: progress_interval.max(1),
            last_timestamp: started_at,
        }
    }

    /// Record one terminal outcome. The timestamp assigned to a record
    /// never moves backwards within this aggregator.
    pub fn ingest(&mut self, tagged: TaggedOutcome) {
        let timestamp = self.next_timestamp();
        match tagged.outcome {
            ProbeOutcome::Success { payload } => {
                let quick_analysis =
                    quick_analyze(&payload, &tagged.expected_keys, tagged.reliability);
                debug!(
                    phase = %tagged.phase,
                    probe = %tagged.probe,
                    data_size = quick_analysis.data_size,
                    confidence = quick_analysis.confidence_score,
                    "Outcome ingested"
                );
                self.records.push(RawResultRecord {
                    phase: tagged.phase,
                    probe: tagged.probe,
                    payload,
                    timestamp,
                    quick_analysis,
                });
            }
            ProbeOutcome::Failure { error } => {
                debug!(
                    phase = %tagged.phase,
                    probe = %tagged.probe,
                    transient = error.is_transient(),
                    error = %error,
                    "Probe failure recorded"
                );
                self.failures.push(FailureNote {
                    phase: tagged.phase,
                    probe: tagged.probe,
                    error: error.to_string(),
                    transient: error.is_transient(),
                    timestamp,
                });
            }
        }

        self.metadata.completed_tasks += 1;
        if self.metadata.completed_tasks % self.progress_interval == 0
            || self.metadata.completed_tasks == self.metadata.total_tasks
        {
            info!(
                completed = self.metadata.completed_tasks,
                total = self.metadata.total_tasks,
                success_rate = self.metadata.success_rate(),
                "Collection progress"
            );
        }
    }

    pub fn metadata(&self) -> &ScanMetadata {
        &self.metadata
    }

    /// Consume the aggregator into an immutable snapshot.
    pub fn snapshot(self) -> ScanSnapshot {
        ScanSnapshot {
            records: self.records,
            failures: self.failures,
            metadata: self.metadata,
        }
    }

    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        if now > self.last_timestamp {
            self.last_timestamp = now;
        }
        self.last_timestamp
    }
}

/// Compute the quick-analysis block for a successful payload.
pub fn quick_analyze(
    payload: &Payload,
    expected_keys: &[String],
    reliability: f64,
) -> QuickAnalysis {
    let serialized = serde_json::to_string(payload).unwrap_or_default();
    let data_size = serialized.len();

    let lowered = serialized.to_lowercase();
    let has_contact_indicator = CONTACT_INDICATORS.iter().any(|ind| lowered.contains(ind));

    let confidence_score = if payload.is_empty() {
        0.0
    } else {
        let completeness = if expected_keys.is_empty() {
            1.0
        } else {
            let present = expected_keys
                .iter()
                .filter(|k| payload.contains_key(k.as_str()))
                .count();
            present as f64 / expected_keys.len() as f64
        };

        let well_formed = payload.values().filter(|v| is_well_formed(v)).count();
        let consistency = well_formed as f64 / payload.len() as f64;

        let reliability = reliability.clamp(0.0, 1.0);
        ((completeness + consistency + reliability) / 3.0).clamp(0.0, 1.0)
    };

    QuickAnalysis {
        data_size,
        has_contact_indicator,
        confidence_score,
    }
}

/// Basic shape check for a payload value: non-empty scalars and
/// homogeneous scalar arrays count as consistent.
fn is_well_formed(value: &Value) -> bool {
    match value {
        Value::String(s) => !s.trim().is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
        Value::Array(items) => {
            !items.is_empty()
                && (items
                    .iter()
                    .all(|i| matches!(i, Value::String(s) if !s.trim().is_empty()))
                    || items.iter().all(|i| i.is_number()))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProbeError;
    use serde_json::json;

    fn payload(value: Value) -> Payload {
        value.as_object().cloned().unwrap()
    }

    fn success(probe: &str, value: Value) -> TaggedOutcome {
        TaggedOutcome::new("phase-1", probe, ProbeOutcome::success(payload(value)))
    }

    #[test]
    fn test_counts_move_together() {
        let mut agg = Aggregator::new(3, 10);
        agg.ingest(success("p1", json!({"emails": ["a@x.com"]})));
        agg.ingest(TaggedOutcome::new(
            "phase-1",
            "p2",
            ProbeOutcome::failure(ProbeError::Network("refused".into())),
        ));
        agg.ingest(success("p3", json!({"phones": ["202-555-0123"]})));

        let snapshot = agg.snapshot();
        assert_eq!(snapshot.metadata.completed_tasks, 3);
        assert_eq!(snapshot.records.len(), 2);
        assert_eq!(snapshot.failures.len(), 1);
        assert!(snapshot.failures[0].transient);
    }

    #[test]
    fn test_success_rate_zero_tasks() {
        let agg = Aggregator::new(0, 10);
        assert_eq!(agg.metadata().success_rate(), 0.0);
    }

    #[test]
    fn test_timestamps_non_decreasing() {
        let mut agg = Aggregator::new(5, 10);
        for _ in 0..5 {
            agg.ingest(success("p", json!({"k": "v"})));
        }
        let snapshot = agg.snapshot();
        for pair in snapshot.records.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
    }

    #[test]
    fn test_quick_analysis_empty_payload() {
        let analysis = quick_analyze(&Payload::new(), &[], 1.0);
        assert_eq!(analysis.confidence_score, 0.0);
        assert!(!analysis.has_contact_indicator);
    }

    #[test]
    fn test_contact_indicator() {
        let with_contact = quick_analyze(&payload(json!({"note": "call my mobile"})), &[], 1.0);
        assert!(with_contact.has_contact_indicator);

        let at_sign = quick_analyze(&payload(json!({"raw": "a@x.com"})), &[], 1.0);
        assert!(at_sign.has_contact_indicator);

        let plain = quick_analyze(&payload(json!({"note": "nothing here"})), &[], 1.0);
        assert!(!plain.has_contact_indicator);
    }

    #[test]
    fn test_confidence_blends_sub_scores() {
        let keys = vec!["emails".to_string(), "phones".to_string()];
        let analysis = quick_analyze(&payload(json!({"emails": ["a@x.com"]})), &keys, 1.0);

        // completeness 0.5, consistency 1.0, reliability 1.0
        let expected = (0.5 + 1.0 + 1.0) / 3.0;
        assert!((analysis.confidence_score - expected).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_within_bounds() {
        let analysis = quick_analyze(&payload(json!({"k": {"nested": true}})), &[], 5.0);
        assert!((0.0..=1.0).contains(&analysis.confidence_score));
    }

    #[test]
    fn test_well_formed_values() {
        assert!(is_well_formed(&json!("text")));
        assert!(is_well_formed(&json!(42)));
        assert!(is_well_formed(&json!(["a", "b"])));
        assert!(is_well_formed(&json!([1, 2])));
        assert!(!is_well_formed(&json!("")));
        assert!(!is_well_formed(&json!([])));
        assert!(!is_well_formed(&json!(["a", 1])));
        assert!(!is_well_formed(&json!({"nested": true})));
        assert!(!is_well_formed(&json!(null)));
    }
}
