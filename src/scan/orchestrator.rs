//! Scan execution engine.
//!
//! Fans out every phase concurrently, fans out each phase's probes through
//! a shared bounded permit pool, funnels all outcomes into the single
//! aggregation task, then correlates per phase and fuses the result.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::{Semaphore, mpsc};
use tracing::{debug, error, info, warn};

use crate::correlate::correlate;
use crate::error::{ProbeError, Result, ScanError};
use crate::fusion::{self, AggregatedReport, PhaseReport};
use crate::notification::{Notifier, ScanEvent, ScanEventType};
use crate::probe::{Phase, ProbeOutcome, TaggedOutcome};

use super::aggregator::{Aggregator, RawResultRecord, ScanSnapshot};
use super::handle::ScanHandle;
use super::options::ScanOptions;
use super::state::{ScanState, ScanStateMachine};

/// Drives one scan at a time: validate, dispatch, collect, correlate, fuse.
pub struct ScanOrchestrator {
    options: ScanOptions,
    notifier: Notifier,
}

impl ScanOrchestrator {
    pub fn new(options: ScanOptions) -> Self {
        Self {
            options,
            notifier: Notifier::disabled(),
        }
    }

    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = notifier;
        self
    }

    /// Run a full scan of `target` across the given phases.
    ///
    /// Returns a report as long as at least the scan machinery itself held
    /// up: probe failures and degraded phases are folded into the report,
    /// never returned as errors. Errors are reserved for configuration
    /// faults, cancellation and stage-fatal conditions.
    pub async fn run(&self, target: &str, phases: Vec<Phase>) -> Result<AggregatedReport> {
        self.run_with_handle(target, phases, ScanHandle::new())
            .await
    }

    /// Like [`run`](Self::run), with a caller-held cancellation handle.
    ///
    /// Cancellation stops dispatching immediately. Probes already running
    /// finish and are ingested, then the scan aborts instead of
    /// correlating and this returns `ScanError::Cancelled`.
    pub async fn run_with_handle(
        &self,
        target: &str,
        phases: Vec<Phase>,
        handle: ScanHandle,
    ) -> Result<AggregatedReport> {
        if phases.is_empty() {
            return Err(ScanError::NoPhases);
        }
        for phase in &phases {
            if phase.probes.is_empty() {
                return Err(ScanError::EmptyPhase(phase.name.clone()));
            }
        }

        let total_probes: usize = phases.iter().map(Phase::probe_count).sum();
        let phase_names: Vec<String> = phases.iter().map(|p| p.name.clone()).collect();

        let mut machine = ScanStateMachine::new();
        machine.transition(ScanState::Dispatching, "phases validated")?;

        info!(
            target,
            phases = phases.len(),
            probes = total_probes,
            "Scan started"
        );
        self.notifier
            .notify(
                &ScanEvent::new(ScanEventType::ScanStarted, target).with_message(format!(
                    "{} phases, {} probes",
                    phases.len(),
                    total_probes
                )),
            )
            .await;

        let semaphore = Arc::new(Semaphore::new(self.options.max_concurrent_probes.max(1)));
        // Capacity covers every possible outcome, so sends never block and
        // a stalled consumer cannot deadlock the fan-out.
        let (tx, mut rx) = mpsc::channel::<TaggedOutcome>(total_probes.max(1));

        // The collector owns the aggregator: one writer, fed by the channel,
        // so records and the completion counter always move together.
        let collector = {
            let notifier = self.notifier.clone();
            let target = target.to_string();
            let progress_interval = self.options.progress_interval;
            tokio::spawn(async move {
                let mut aggregator = Aggregator::new(total_probes, progress_interval);
                while let Some(tagged) = rx.recv().await {
                    if let ProbeOutcome::Failure { error } = &tagged.outcome {
                        notifier
                            .notify(
                                &ScanEvent::new(ScanEventType::ProbeFailed, &target)
                                    .with_phase(&tagged.phase)
                                    .with_probe(&tagged.probe)
                                    .with_message(error.to_string()),
                            )
                            .await;
                    }
                    aggregator.ingest(tagged);
                }
                aggregator.snapshot()
            })
        };

        let phase_handles: Vec<_> = phases
            .into_iter()
            .map(|phase| {
                let semaphore = semaphore.clone();
                let tx = tx.clone();
                let handle = handle.clone();
                let target = target.to_string();
                let deadline = self.options.probe_deadline;
                tokio::spawn(run_phase(phase, target, semaphore, tx, handle, deadline))
            })
            .collect();
        drop(tx);

        machine.transition(ScanState::Collecting, "probes dispatched")?;

        let phase_results = join_all(phase_handles).await;

        let snapshot = match collector.await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!(error = %e, "Aggregation task failed");
                machine.transition(ScanState::Aborted, "aggregator failure")?;
                self.notify_aborted(target, "aggregator failure").await;
                return Err(ScanError::Aggregator(format!(
                    "aggregation task failed: {}",
                    e
                )));
            }
        };

        if handle.is_cancelled() {
            info!(
                target,
                ingested = snapshot.metadata.completed_tasks,
                "Scan cancelled"
            );
            machine.transition(ScanState::Aborted, "cancelled by caller")?;
            self.notify_aborted(target, "cancelled by caller").await;
            return Err(ScanError::Cancelled);
        }

        machine.transition(ScanState::Correlating, "collection settled")?;

        let mut phase_reports: Vec<(String, PhaseReport)> = Vec::with_capacity(phase_names.len());
        for (name, join_result) in phase_names.iter().zip(phase_results) {
            let report = match join_result {
                Ok(()) => self.correlate_phase(name, &snapshot),
                Err(e) => {
                    error!(phase = %name, error = %e, "Phase task panicked");
                    PhaseReport::unavailable(format!("phase task panicked: {}", e))
                }
            };
            self.notifier
                .notify(
                    &ScanEvent::new(ScanEventType::PhaseSettled, target)
                        .with_phase(name)
                        .with_message(if report.is_available() {
                            "available"
                        } else {
                            "unavailable"
                        }),
                )
                .await;
            phase_reports.push((name.clone(), report));
        }

        let report = match fusion::fuse(target, phase_reports, &snapshot) {
            Ok(report) => report,
            Err(e) => {
                machine.transition(ScanState::Aborted, "fusion failure")?;
                self.notify_aborted(target, &e.to_string()).await;
                return Err(e);
            }
        };

        machine.transition(ScanState::Fused, "report assembled")?;

        info!(
            target,
            phases_attempted = report.summary.phases_attempted,
            phases_unavailable = report.summary.phases_unavailable,
            critical_findings = report.summary.critical_findings,
            "Scan completed"
        );
        self.notifier
            .notify(
                &ScanEvent::new(ScanEventType::ScanCompleted, target)
                    .with_message(format!(
                        "{} critical findings",
                        report.summary.critical_findings
                    ))
                    .with_progress(
                        snapshot.metadata.completed_tasks,
                        snapshot.metadata.total_tasks,
                    ),
            )
            .await;

        Ok(report)
    }

    /// Correlate every enabled category over one phase's records.
    ///
    /// A malformed payload degrades this phase to unavailable; sibling
    /// phases are untouched.
    fn correlate_phase(&self, phase: &str, snapshot: &ScanSnapshot) -> PhaseReport {
        let records: Vec<&RawResultRecord> = snapshot
            .records
            .iter()
            .filter(|r| r.phase == phase)
            .collect();

        let mut categories = Vec::with_capacity(self.options.categories.len());
        for category in &self.options.categories {
            match correlate(records.iter().copied(), *category) {
                Ok(result) => categories.push(result),
                Err(e) => {
                    warn!(phase, category = %category, error = %e, "Correlation fault, phase degraded");
                    return PhaseReport::unavailable(e.to_string());
                }
            }
        }
        PhaseReport::available(categories)
    }

    async fn notify_aborted(&self, target: &str, reason: &str) {
        self.notifier
            .notify(&ScanEvent::new(ScanEventType::ScanAborted, target).with_message(reason))
            .await;
    }
}

/// Fan out one phase's probes and deliver every terminal outcome.
///
/// Each probe runs in its own task behind the shared permit pool. A probe
/// panic is converted to a failure outcome after the join, so the
/// aggregator still sees one outcome per dispatched probe.
async fn run_phase(
    phase: Phase,
    target: String,
    semaphore: Arc<Semaphore>,
    tx: mpsc::Sender<TaggedOutcome>,
    handle: ScanHandle,
    deadline: Option<Duration>,
) {
    let probe_names: Vec<String> = phase.probes.iter().map(|p| p.name().to_string()).collect();
    let phase_name = phase.name.clone();

    let handles: Vec<_> = phase
        .probes
        .into_iter()
        .map(|probe| {
            let sem = semaphore.clone();
            let tx = tx.clone();
            let handle = handle.clone();
            let target = target.clone();
            let phase_name = phase_name.clone();

            tokio::spawn(async move {
                let permit = match sem.acquire().await {
                    Ok(p) => p,
                    Err(_) => return,
                };

                // Cancelled before dispatch: this probe never runs and
                // contributes no outcome.
                if handle.is_cancelled() {
                    drop(permit);
                    return;
                }

                let probe_name = probe.name().to_string();
                debug!(phase = %phase_name, probe = %probe_name, "Probe dispatched");

                let result = match deadline {
                    Some(limit) => match tokio::time::timeout(limit, probe.invoke(&target)).await {
                        Ok(res) => res,
                        Err(_) => Err(ProbeError::Timeout {
                            duration_secs: limit.as_secs(),
                        }),
                    },
                    None => probe.invoke(&target).await,
                };
                drop(permit);

                let outcome = match result {
                    Ok(payload) => ProbeOutcome::success(payload),
                    Err(error) => ProbeOutcome::failure(error),
                };
                let tagged = TaggedOutcome::new(phase_name, probe_name, outcome)
                    .with_reliability(probe.reliability())
                    .with_expected_keys(probe.expected_keys().to_vec());
                if tx.send(tagged).await.is_err() {
                    warn!("Aggregation channel closed before outcome delivery");
                }
            })
        })
        .collect();

    let results = join_all(handles).await;

    for (result, probe_name) in results.into_iter().zip(probe_names) {
        if let Err(e) = result {
            error!(phase = %phase_name, probe = %probe_name, error = %e, "Probe panicked during execution");
            let tagged = TaggedOutcome::new(
                phase_name.clone(),
                probe_name,
                ProbeOutcome::failure(ProbeError::Other(format!("probe task panicked: {}", e))),
            );
            if tx.send(tagged).await.is_err() {
                warn!("Aggregation channel closed before panic conversion");
            }
        }
    }
}
