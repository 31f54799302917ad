use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanEventType {
    ScanStarted,
    ScanCompleted,
    ScanAborted,
    PhaseSettled,
    ProbeFailed,
    InvestigationStarted,
    InvestigationCompleted,
    InvestigationFailed,
}

impl ScanEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ScanStarted => "scan.started",
            Self::ScanCompleted => "scan.completed",
            Self::ScanAborted => "scan.aborted",
            Self::PhaseSettled => "phase.settled",
            Self::ProbeFailed => "probe.failed",
            Self::InvestigationStarted => "investigation.started",
            Self::InvestigationCompleted => "investigation.completed",
            Self::InvestigationFailed => "investigation.failed",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Self::ScanStarted => "▶️",
            Self::ScanCompleted => "✅",
            Self::ScanAborted => "🚫",
            Self::PhaseSettled => "✔️",
            Self::ProbeFailed => "⚠️",
            Self::InvestigationStarted => "🚀",
            Self::InvestigationCompleted => "🏁",
            Self::InvestigationFailed => "❌",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::ScanAborted | Self::ProbeFailed | Self::InvestigationFailed
        )
    }

    pub fn is_scan_level(&self) -> bool {
        matches!(
            self,
            Self::ScanStarted
                | Self::ScanCompleted
                | Self::ScanAborted
                | Self::InvestigationStarted
                | Self::InvestigationCompleted
                | Self::InvestigationFailed
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanEvent {
    pub event_type: ScanEventType,
    pub target: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probe: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<(usize, usize)>,
}

impl ScanEvent {
    pub fn new(event_type: ScanEventType, target: impl Into<String>) -> Self {
        Self {
            event_type,
            target: target.into(),
            created_at: Utc::now(),
            phase: None,
            probe: None,
            message: None,
            progress: None,
        }
    }

    pub fn with_phase(mut self, phase: impl Into<String>) -> Self {
        self.phase = Some(phase.into());
        self
    }

    pub fn with_probe(mut self, probe: impl Into<String>) -> Self {
        self.probe = Some(probe.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_progress(mut self, completed: usize, total: usize) -> Self {
        self.progress = Some((completed, total));
        self
    }

    pub fn title(&self) -> String {
        format!(
            "{} Dragnet: {}",
            self.event_type.emoji(),
            self.event_type.as_str()
        )
    }

    pub fn body(&self) -> String {
        let mut parts = vec![format!("Target: {}", self.target)];

        if let Some(phase) = &self.phase {
            parts.push(format!("Phase: {}", phase));
        }

        if let Some(probe) = &self.probe {
            parts.push(format!("Probe: {}", probe));
        }

        if let Some((completed, total)) = self.progress {
            parts.push(format!("Progress: {}/{}", completed, total));
        }

        if let Some(msg) = &self.message {
            parts.push(msg.clone());
        }

        parts.join("\n")
    }
}
