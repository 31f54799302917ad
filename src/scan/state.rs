use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, ScanError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanState {
    #[default]
    Pending,
    Dispatching,
    Collecting,
    Correlating,
    Fused,
    /// Terminal state entered on stage-fatal errors or cancellation.
    /// Degraded phases do not abort a scan; it still reaches Fused.
    Aborted,
}

impl ScanState {
    pub fn allowed_transitions(&self) -> &'static [ScanState] {
        use ScanState::*;
        match self {
            Pending => &[Dispatching, Aborted],
            Dispatching => &[Collecting, Aborted],
            Collecting => &[Correlating, Aborted],
            Correlating => &[Fused, Aborted],
            Fused => &[],
            Aborted => &[],
        }
    }

    pub fn can_transition_to(&self, target: ScanState) -> bool {
        self.allowed_transitions().contains(&target)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanState::Fused | ScanState::Aborted)
    }

    pub fn is_active(&self) -> bool {
        matches!(
            self,
            ScanState::Dispatching | ScanState::Collecting | ScanState::Correlating
        )
    }
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "Pending",
            Self::Dispatching => "Dispatching",
            Self::Collecting => "Collecting",
            Self::Correlating => "Correlating",
            Self::Fused => "Fused",
            Self::Aborted => "Aborted",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    pub from: ScanState,
    pub to: ScanState,
    pub reason: String,
    pub at: DateTime<Utc>,
}

impl StateTransition {
    pub fn new(from: ScanState, to: ScanState, reason: impl Into<String>) -> Self {
        Self {
            from,
            to,
            reason: reason.into(),
            at: Utc::now(),
        }
    }
}

/// Per-scan lifecycle bookkeeping with transition enforcement.
#[derive(Debug, Clone, Default)]
pub struct ScanStateMachine {
    state: ScanState,
    history: Vec<StateTransition>,
}

impl ScanStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn history(&self) -> &[StateTransition] {
        &self.history
    }

    pub fn transition(&mut self, target: ScanState, reason: &str) -> Result<()> {
        if !self.state.can_transition_to(target) {
            return Err(ScanError::InvalidStateTransition {
                from: self.state.to_string(),
                to: target.to_string(),
                allowed: format!("{:?}", self.state.allowed_transitions()),
            });
        }
        debug!(from = %self.state, to = %target, reason, "Scan state transition");
        self.history
            .push(StateTransition::new(self.state, target, reason));
        self.state = target;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        assert!(ScanState::Pending.can_transition_to(ScanState::Dispatching));
        assert!(ScanState::Dispatching.can_transition_to(ScanState::Collecting));
        assert!(ScanState::Collecting.can_transition_to(ScanState::Correlating));
        assert!(ScanState::Correlating.can_transition_to(ScanState::Fused));
    }

    #[test]
    fn test_abort_reachable_from_active_states() {
        assert!(ScanState::Pending.can_transition_to(ScanState::Aborted));
        assert!(ScanState::Dispatching.can_transition_to(ScanState::Aborted));
        assert!(ScanState::Collecting.can_transition_to(ScanState::Aborted));
        assert!(ScanState::Correlating.can_transition_to(ScanState::Aborted));
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(!ScanState::Fused.can_transition_to(ScanState::Dispatching));
        assert!(!ScanState::Aborted.can_transition_to(ScanState::Collecting));
        assert!(!ScanState::Pending.can_transition_to(ScanState::Fused));
        assert!(!ScanState::Collecting.can_transition_to(ScanState::Fused));
    }

    #[test]
    fn test_terminal_states() {
        assert!(ScanState::Fused.is_terminal());
        assert!(ScanState::Aborted.is_terminal());
        assert!(!ScanState::Pending.is_terminal());
        assert!(!ScanState::Collecting.is_terminal());
    }

    #[test]
    fn test_machine_records_history() {
        let mut machine = ScanStateMachine::new();
        machine
            .transition(ScanState::Dispatching, "phases validated")
            .unwrap();
        machine
            .transition(ScanState::Collecting, "probes dispatched")
            .unwrap();

        assert_eq!(machine.state(), ScanState::Collecting);
        assert_eq!(machine.history().len(), 2);
        assert_eq!(machine.history()[0].from, ScanState::Pending);
        assert_eq!(machine.history()[1].to, ScanState::Collecting);
    }

    #[test]
    fn test_machine_rejects_invalid_transition() {
        let mut machine = ScanStateMachine::new();
        let err = machine
            .transition(ScanState::Fused, "skipping ahead")
            .unwrap_err();

        assert!(matches!(err, ScanError::InvalidStateTransition { .. }));
        assert_eq!(machine.state(), ScanState::Pending);
        assert!(machine.history().is_empty());
    }
}
