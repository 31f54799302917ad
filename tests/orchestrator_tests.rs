use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use dragnet::error::{ProbeError, ScanError};
use dragnet::fusion::PhaseReport;
use dragnet::probe::{Payload, Phase, Probe};
use dragnet::probes::StaticProbe;
use dragnet::scan::{ScanHandle, ScanOptions, ScanOrchestrator};

fn payload(value: serde_json::Value) -> Payload {
    let Some(map) = value.as_object().cloned() else {
        panic!("payload fixtures must be JSON objects");
    };
    map
}

fn surface_phase() -> Phase {
    Phase::new("surface")
        .with_probe(StaticProbe::new(
            "web",
            payload(json!({"emails": ["john@example.com"]})),
        ))
        .with_probe(StaticProbe::new(
            "social",
            payload(json!({"emails": ["john@example.com", "john@other.org"]})),
        ))
}

fn records_phase() -> Phase {
    Phase::new("records")
        .with_probe(StaticProbe::failing("flaky", "connection refused"))
        .with_probe(StaticProbe::new(
            "registry",
            payload(json!({"phones": ["+12025550123"]})),
        ))
}

#[tokio::test]
async fn test_full_scan_two_phases() {
    let orchestrator = ScanOrchestrator::new(ScanOptions::default());

    let report = orchestrator
        .run("John Doe", vec![surface_phase(), records_phase()])
        .await
        .unwrap();

    assert_eq!(report.target, "John Doe");
    assert_eq!(report.summary.phases_attempted, 2);
    assert_eq!(report.summary.phases_unavailable, 0);
    assert_eq!(report.summary.total_tasks, 4);
    assert_eq!(report.summary.completed_tasks, 4);
    assert_eq!(report.summary.probe_failures, 1);
    assert!((report.summary.success_rate - 100.0).abs() < f64::EPSILON);

    // Duplicate email collapses, both surface probes contribute
    let emails = report.category_in_phase("surface", "emails").unwrap();
    assert_eq!(emails.entity_count(), 2);
    assert!((emails.confidence - 1.0).abs() < f64::EPSILON);

    // The failing sibling degrades nothing in the records phase
    let phones = report.category_in_phase("records", "phones").unwrap();
    assert_eq!(phones.entity_count(), 1);
    assert!((phones.confidence - 1.0).abs() < f64::EPSILON);

    let merged_emails = &report.summary.unique_entities["emails"];
    assert_eq!(
        merged_emails,
        &vec!["john@example.com".to_string(), "john@other.org".to_string()]
    );
    assert_eq!(
        report.summary.unique_entities["phones"],
        vec!["+12025550123".to_string()]
    );

    // Every successful payload here carries a contact-ish key
    assert_eq!(report.summary.critical_findings, 3);
}

#[tokio::test]
async fn test_probe_failure_is_data_not_error() {
    let phase = Phase::new("surface")
        .with_probe(StaticProbe::new(
            "web",
            payload(json!({"emails": ["jane@example.com"]})),
        ))
        .with_probe(StaticProbe::failing("flaky", "connection refused"));

    let orchestrator = ScanOrchestrator::new(ScanOptions::default());
    let report = orchestrator.run("jane", vec![phase]).await.unwrap();

    // A failed probe is accounted for, not propagated
    assert_eq!(report.summary.probe_failures, 1);
    assert_eq!(report.summary.completed_tasks, 2);
    assert!((report.summary.success_rate - 100.0).abs() < f64::EPSILON);

    let emails = report.category_in_phase("surface", "emails").unwrap();
    assert_eq!(emails.entity_count(), 1);
}

#[tokio::test]
async fn test_malformed_payload_degrades_phase_only() {
    let bad = Phase::new("records").with_probe(StaticProbe::new(
        "registry",
        payload(json!({"emails": 7})),
    ));
    let good = Phase::new("surface").with_probe(StaticProbe::new(
        "web",
        payload(json!({"emails": ["jane@example.com"]})),
    ));

    let orchestrator = ScanOrchestrator::new(ScanOptions::default());
    let report = orchestrator.run("jane", vec![bad, good]).await.unwrap();

    assert_eq!(report.summary.phases_unavailable, 1);
    match report.phase("records") {
        Some(PhaseReport::Unavailable { reason }) => {
            assert!(reason.contains("malformed"));
        }
        other => panic!("expected records phase unavailable, got {:?}", other),
    }

    // The sibling phase and the ingestion counters are untouched
    assert!(report.phase("surface").unwrap().is_available());
    assert_eq!(report.summary.completed_tasks, 2);
    assert_eq!(
        report.summary.unique_entities["emails"],
        vec!["jane@example.com".to_string()]
    );
}

#[tokio::test]
async fn test_no_phases_rejected() {
    let orchestrator = ScanOrchestrator::new(ScanOptions::default());
    let err = orchestrator.run("jane", vec![]).await.unwrap_err();
    assert!(matches!(err, ScanError::NoPhases));
}

#[tokio::test]
async fn test_empty_phase_rejected() {
    let orchestrator = ScanOrchestrator::new(ScanOptions::default());
    let err = orchestrator
        .run("jane", vec![Phase::new("hollow")])
        .await
        .unwrap_err();
    match err {
        ScanError::EmptyPhase(name) => assert_eq!(name, "hollow"),
        other => panic!("expected EmptyPhase, got {:?}", other),
    }
}

#[tokio::test]
async fn test_all_probes_failing_still_reports() {
    let phase = Phase::new("surface")
        .with_probe(StaticProbe::failing("a", "connection refused"))
        .with_probe(StaticProbe::failing("b", "access denied"));

    let orchestrator = ScanOrchestrator::new(ScanOptions::default());
    let report = orchestrator.run("jane", vec![phase]).await.unwrap();

    assert_eq!(report.summary.probe_failures, 2);
    assert_eq!(report.summary.completed_tasks, 2);
    assert_eq!(report.summary.phases_unavailable, 0);
    assert_eq!(report.summary.critical_findings, 0);

    // No records means no candidates, which reads as zero confidence
    let emails = report.category_in_phase("surface", "emails").unwrap();
    assert_eq!(emails.entity_count(), 0);
    assert_eq!(emails.confidence, 0.0);
}

#[tokio::test]
async fn test_cancellation_aborts_scan() {
    let mut phase = Phase::new("slow");
    for i in 0..20 {
        phase = phase.with_probe(
            StaticProbe::new(format!("probe-{}", i), payload(json!({"emails": []})))
                .with_delay(Duration::from_millis(200)),
        );
    }

    let handle = ScanHandle::new();
    let run_handle = handle.clone();
    let task = tokio::spawn(async move {
        let options = ScanOptions::default().with_max_concurrent_probes(1);
        ScanOrchestrator::new(options)
            .run_with_handle("jane", vec![phase], run_handle)
            .await
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    handle.cancel();

    let result = task.await.unwrap();
    assert!(matches!(result, Err(ScanError::Cancelled)));
}

#[tokio::test]
async fn test_probe_deadline_converts_slow_probe() {
    let phase = Phase::new("surface")
        .with_probe(
            StaticProbe::new("stuck", payload(json!({"emails": ["slow@example.com"]})))
                .with_delay(Duration::from_millis(400)),
        )
        .with_probe(StaticProbe::new(
            "quick",
            payload(json!({"emails": ["fast@example.com"]})),
        ));

    let options = ScanOptions::default().with_probe_deadline(Duration::from_millis(50));
    let orchestrator = ScanOrchestrator::new(options);
    let report = orchestrator.run("jane", vec![phase]).await.unwrap();

    assert_eq!(report.summary.probe_failures, 1);
    assert_eq!(report.summary.completed_tasks, 2);

    let emails = report.category_in_phase("surface", "emails").unwrap();
    assert_eq!(emails.entity_count(), 1);
    assert!(
        emails
            .unique_entities
            .iter()
            .any(|e| e.value == "fast@example.com")
    );
}

struct PanickingProbe;

#[async_trait]
impl Probe for PanickingProbe {
    async fn invoke(&self, _target: &str) -> Result<Payload, ProbeError> {
        panic!("probe exploded");
    }

    fn name(&self) -> &str {
        "volatile"
    }
}

#[tokio::test]
async fn test_panicking_probe_becomes_failure() {
    let phase = Phase::new("surface")
        .with_probe(PanickingProbe)
        .with_probe(StaticProbe::new(
            "web",
            payload(json!({"emails": ["jane@example.com"]})),
        ));

    let orchestrator = ScanOrchestrator::new(ScanOptions::default());
    let report = orchestrator.run("jane", vec![phase]).await.unwrap();

    // The panic is contained at the probe boundary
    assert_eq!(report.summary.probe_failures, 1);
    assert_eq!(report.summary.completed_tasks, 2);
    assert!(report.phase("surface").unwrap().is_available());

    let emails = report.category_in_phase("surface", "emails").unwrap();
    assert_eq!(emails.entity_count(), 1);
}
