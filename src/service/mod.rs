//! In-process investigation service.
//!
//! Wraps the scan orchestrator behind a submit/status/report contract so
//! callers can fan an investigation out over several targets, poll its
//! progress and fetch the fused reports once every target has settled.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::{Result, ScanError};
use crate::fusion::AggregatedReport;
use crate::notification::{Notifier, ScanEvent, ScanEventType};
use crate::probe::Phase;
use crate::report::ReportStore;
use crate::scan::{ScanOptions, ScanOrchestrator};
use crate::utils::percentage;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestigationRequest {
    pub targets: Vec<String>,
    #[serde(default = "default_scan_type")]
    pub scan_type: String,
    #[serde(default = "default_depth")]
    pub depth: String,
}

fn default_scan_type() -> String {
    "comprehensive".to_string()
}

fn default_depth() -> String {
    "deep".to_string()
}

impl InvestigationRequest {
    pub fn new(targets: Vec<String>) -> Self {
        Self {
            targets,
            scan_type: default_scan_type(),
            depth: default_depth(),
        }
    }

    pub fn with_scan_type(mut self, scan_type: impl Into<String>) -> Self {
        self.scan_type = scan_type.into();
        self
    }

    pub fn with_depth(mut self, depth: impl Into<String>) -> Self {
        self.depth = depth.into();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestigationStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl InvestigationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for InvestigationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Investigation {
    pub id: String,
    pub request: InvestigationRequest,
    pub status: InvestigationStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub targets_done: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    pub reports: Vec<AggregatedReport>,
}

impl Investigation {
    pub fn new(request: InvestigationRequest) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            request,
            status: InvestigationStatus::Pending,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            targets_done: 0,
            error: None,
            reports: Vec::new(),
        }
    }

    /// Fraction of targets fully scanned, as a percentage.
    pub fn progress(&self) -> f64 {
        percentage(self.targets_done, self.request.targets.len())
    }
}

/// Registry of investigations plus the scan machinery they share.
///
/// `submit` returns immediately; the per-target scans run on a spawned
/// task, so the service must live inside a Tokio runtime.
pub struct InvestigationService {
    phases: Vec<Phase>,
    options: ScanOptions,
    notifier: Notifier,
    store: Option<ReportStore>,
    registry: Arc<DashMap<String, Investigation>>,
}

impl InvestigationService {
    pub fn new(phases: Vec<Phase>, options: ScanOptions) -> Self {
        Self {
            phases,
            options,
            notifier: Notifier::disabled(),
            store: None,
            registry: Arc::new(DashMap::new()),
        }
    }

    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_store(mut self, store: ReportStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Queue an investigation and return its id without waiting for any
    /// scan to run.
    pub fn submit(&self, request: InvestigationRequest) -> Result<String> {
        if request.targets.is_empty() {
            return Err(ScanError::Config(
                "investigation request has no targets".to_string(),
            ));
        }
        if self.phases.is_empty() {
            return Err(ScanError::NoPhases);
        }

        let investigation = Investigation::new(request);
        let id = investigation.id.clone();
        self.registry.insert(id.clone(), investigation);

        info!(investigation_id = %id, "Investigation submitted");

        tokio::spawn(run_investigation(
            id.clone(),
            Arc::clone(&self.registry),
            self.phases.clone(),
            self.options.clone(),
            self.notifier.clone(),
            self.store.clone(),
        ));

        Ok(id)
    }

    pub fn status(&self, id: &str) -> Result<Investigation> {
        self.registry
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ScanError::InvestigationNotFound(id.to_string()))
    }

    /// Fused reports, one per target, once the investigation completed.
    pub fn report(&self, id: &str) -> Result<Vec<AggregatedReport>> {
        let investigation = self.status(id)?;
        match investigation.status {
            InvestigationStatus::Completed => Ok(investigation.reports),
            _ => Err(ScanError::ReportNotReady(id.to_string())),
        }
    }

    /// All known investigations, newest first.
    pub fn list(&self) -> Vec<Investigation> {
        let mut all: Vec<Investigation> = self
            .registry
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all
    }
}

async fn run_investigation(
    id: String,
    registry: Arc<DashMap<String, Investigation>>,
    phases: Vec<Phase>,
    options: ScanOptions,
    notifier: Notifier,
    store: Option<ReportStore>,
) {
    // Registry guards are scoped so they never live across an await
    let targets = {
        let Some(mut investigation) = registry.get_mut(&id) else {
            return;
        };
        investigation.status = InvestigationStatus::Running;
        investigation.started_at = Some(Utc::now());
        investigation.request.targets.clone()
    };

    notifier
        .notify(
            &ScanEvent::new(ScanEventType::InvestigationStarted, &id)
                .with_message(format!("{} targets queued", targets.len())),
        )
        .await;

    let orchestrator = ScanOrchestrator::new(options).with_notifier(notifier.clone());
    let mut reports = Vec::new();
    let mut failure: Option<ScanError> = None;

    for target in &targets {
        match orchestrator.run(target, phases.clone()).await {
            Ok(report) => {
                if let Some(store) = &store
                    && let Err(e) = store.save(&report).await
                {
                    warn!(target = %target, error = %e, "Failed to persist report");
                }
                reports.push(report);
            }
            Err(e) => {
                error!(investigation_id = %id, target = %target, error = %e, "Scan failed");
                failure = Some(e);
                break;
            }
        }

        if let Some(mut investigation) = registry.get_mut(&id) {
            investigation.targets_done += 1;
        }
    }

    let done = reports.len();
    let total = targets.len();
    let event = match &failure {
        None => ScanEvent::new(ScanEventType::InvestigationCompleted, &id)
            .with_progress(done, total),
        Some(e) => ScanEvent::new(ScanEventType::InvestigationFailed, &id)
            .with_message(e.to_string())
            .with_progress(done, total),
    };

    if let Some(mut investigation) = registry.get_mut(&id) {
        investigation.completed_at = Some(Utc::now());
        investigation.reports = reports;
        match failure {
            None => {
                investigation.status = InvestigationStatus::Completed;
                info!(investigation_id = %id, targets = total, "Investigation completed");
            }
            Some(e) => {
                investigation.status = InvestigationStatus::Failed;
                investigation.error = Some(e.to_string());
            }
        }
    }

    notifier.notify(&event).await;
}
