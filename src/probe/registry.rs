//! Declarative scan plans loaded from TOML.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::Result;
use crate::probes::{DocumentProbe, StaticProbe};

use super::{Payload, Phase, Probe};

/// Declarative description of a scan: named phases, each listing probes.
///
/// TOML shape:
///
/// ```toml
/// [[phase]]
/// name = "surface"
///
/// [[phase.probe]]
/// kind = "static"
/// name = "directory"
/// payload = { emails = ["a@example.com"] }
///
/// [[phase.probe]]
/// kind = "document"
/// name = "dump"
/// path = "corpus/dump.txt"
/// reliability = 0.8
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanPlan {
    #[serde(default, rename = "phase")]
    pub phases: Vec<PhaseSpec>,
}

impl ScanPlan {
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        let plan: Self = toml::from_str(&content)?;
        Ok(plan)
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    /// Instantiate runnable phases from the plan. Structural validation
    /// (no phases, empty phase) happens at dispatch time.
    pub fn build(&self) -> Vec<Phase> {
        self.phases.iter().map(PhaseSpec::build).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseSpec {
    pub name: String,
    #[serde(default, rename = "probe")]
    pub probes: Vec<ProbeSpec>,
}

impl PhaseSpec {
    fn build(&self) -> Phase {
        Phase {
            name: self.name.clone(),
            probes: self.probes.iter().map(ProbeSpec::build).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProbeSpec {
    /// Fixed payload, optional simulated latency or failure. Useful for
    /// dry runs and plan rehearsals.
    Static {
        name: String,
        #[serde(default)]
        payload: Payload,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reliability: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fail_with: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        delay_ms: Option<u64>,
    },
    /// Extracts contact fragments from a local file or directory.
    Document {
        name: String,
        path: PathBuf,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reliability: Option<f64>,
    },
}

impl ProbeSpec {
    fn build(&self) -> Arc<dyn Probe> {
        match self {
            Self::Static {
                name,
                payload,
                reliability,
                fail_with,
                delay_ms,
            } => {
                let mut probe = match fail_with {
                    Some(msg) => StaticProbe::failing(name, msg),
                    None => StaticProbe::new(name, payload.clone()),
                };
                if let Some(r) = reliability {
                    probe = probe.with_reliability(*r);
                }
                if let Some(ms) = delay_ms {
                    probe = probe.with_delay(Duration::from_millis(*ms));
                }
                Arc::new(probe)
            }
            Self::Document {
                name,
                path,
                reliability,
            } => {
                let mut probe = DocumentProbe::new(name, path.clone());
                if let Some(r) = reliability {
                    probe = probe.with_reliability(*r);
                }
                Arc::new(probe)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAN: &str = r#"
[[phase]]
name = "surface"

[[phase.probe]]
kind = "static"
name = "directory"
payload = { emails = ["a@example.com"] }

[[phase.probe]]
kind = "static"
name = "flaky"
fail_with = "connection refused"

[[phase]]
name = "documents"

[[phase.probe]]
kind = "document"
name = "dump"
path = "corpus/dump.txt"
reliability = 0.8
"#;

    #[test]
    fn test_parse_plan() {
        let plan: ScanPlan = toml::from_str(PLAN).unwrap();
        assert_eq!(plan.phases.len(), 2);
        assert_eq!(plan.phases[0].name, "surface");
        assert_eq!(plan.phases[0].probes.len(), 2);
        assert_eq!(plan.phases[1].probes.len(), 1);
    }

    #[test]
    fn test_build_phases() {
        let plan: ScanPlan = toml::from_str(PLAN).unwrap();
        let phases = plan.build();

        assert_eq!(phases.len(), 2);
        assert_eq!(phases[0].probe_count(), 2);
        assert_eq!(phases[0].probes[0].name(), "directory");
        assert!((phases[1].probes[0].reliability() - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_plan() {
        let plan: ScanPlan = toml::from_str("").unwrap();
        assert!(plan.is_empty());
        assert!(plan.build().is_empty());
    }
}
