use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::correlate::EntityCategory;
use crate::error::{Result, ScanError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DragnetConfig {
    pub engine: EngineConfig,
    pub correlation: CorrelationConfig,
    pub report: ReportConfig,
    pub notification: NotificationConfig,
}

impl DragnetConfig {
    /// Load configuration from a TOML file, falling back to defaults when
    /// the file does not exist.
    pub async fn load(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let content = fs::read_to_string(path).await?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        let content = toml::to_string_pretty(self).map_err(|e| ScanError::Config(e.to_string()))?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Validate configuration values for consistency and safety.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.engine.max_concurrent_probes == 0 {
            errors.push("engine.max_concurrent_probes must be greater than 0");
        }
        if self.engine.progress_interval == 0 {
            errors.push("engine.progress_interval must be greater than 0");
        }

        if self.correlation.categories.is_empty() {
            errors.push("correlation.categories must not be empty");
        }

        if self.report.output_dir.as_os_str().is_empty() {
            errors.push("report.output_dir must not be empty");
        }

        if let Some(hook) = &self.notification.hook_command
            && hook.trim().is_empty()
        {
            errors.push("notification.hook_command must not be blank when set");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ScanError::Config(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on probes running at once, shared across all phases.
    pub max_concurrent_probes: usize,
    /// Per-probe deadline in seconds (0 = no deadline). An overrun becomes
    /// a timeout failure for that probe, never a scan error. Network-backed
    /// collectors usually run with 30.
    pub probe_deadline_secs: u64,
    /// Emit a progress log line every N ingested outcomes.
    pub progress_interval: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_probes: 50,
            probe_deadline_secs: 0,
            progress_interval: 10,
        }
    }
}

impl EngineConfig {
    pub fn probe_deadline(&self) -> Option<Duration> {
        if self.probe_deadline_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.probe_deadline_secs))
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationConfig {
    /// Entity categories extracted during the correlation stage.
    pub categories: Vec<EntityCategory>,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            categories: EntityCategory::ALL.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub output_dir: PathBuf,
    pub pretty: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("reports"),
            pretty: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub enabled: bool,
    pub desktop: bool,
    pub event_log: bool,
    pub hook_command: Option<String>,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            desktop: true,
            event_log: true,
            hook_command: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_probe_deadline() {
        let mut engine = EngineConfig::default();
        assert!(engine.probe_deadline().is_none());

        engine.probe_deadline_secs = 30;
        assert_eq!(engine.probe_deadline(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let mut config = DragnetConfig::default();
        config.engine.max_concurrent_probes = 0;

        let result = config.validate();
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("max_concurrent_probes"));
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let mut config = DragnetConfig::default();
        config.engine.max_concurrent_probes = 0;
        config.engine.progress_interval = 0;
        config.correlation.categories.clear();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("max_concurrent_probes"));
        assert!(err.contains("progress_interval"));
        assert!(err.contains("correlation.categories"));
    }

    #[test]
    fn test_validate_blank_hook() {
        let mut config = DragnetConfig::default();
        config.notification.hook_command = Some("   ".to_string());

        assert!(config.validate().is_err());
    }
}
