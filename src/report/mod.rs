//! Durable JSON report storage.
//!
//! Reports land as `scan_<target>_<timestamp>.json` under one output
//! directory. Writes go through a temp file with an atomic rename so a
//! crash mid-write never leaves a half-written report behind.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};

use crate::config::ReportConfig;
use crate::error::{Result, ScanError};
use crate::fusion::AggregatedReport;
use crate::utils::target_slug;

#[derive(Debug, Clone)]
pub struct ReportStore {
    output_dir: PathBuf,
    pretty: bool,
}

impl ReportStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            pretty: true,
        }
    }

    pub fn from_config(config: &ReportConfig) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            pretty: config.pretty,
        }
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub async fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.output_dir).await?;
        self.recover_interrupted_writes().await;
        Ok(())
    }

    /// Persist a report, returning the path it was written to.
    pub async fn save(&self, report: &AggregatedReport) -> Result<PathBuf> {
        let slug = target_slug(&report.target);
        let stamp = report.completed_at.format("%Y%m%d_%H%M%S");

        let mut path = self.output_dir.join(format!("scan_{}_{}.json", slug, stamp));
        let mut seq = 1;
        while path.exists() {
            path = self
                .output_dir
                .join(format!("scan_{}_{}_{}.json", slug, stamp, seq));
            seq += 1;
        }

        let content = if self.pretty {
            serde_json::to_string_pretty(report)?
        } else {
            serde_json::to_string(report)?
        };
        self.write_atomic(&path, &content).await?;
        Ok(path)
    }

    async fn write_atomic(&self, path: &Path, content: &str) -> Result<()> {
        let tmp_path = path.with_extension("json.tmp");

        fs::write(&tmp_path, content).await?;

        // Sync in spawn_blocking to keep the runtime unblocked
        let tmp_path_clone = tmp_path.clone();
        let sync_result = tokio::task::spawn_blocking(move || {
            std::fs::File::open(&tmp_path_clone).and_then(|file| file.sync_all())
        })
        .await;
        match sync_result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "Failed to sync temp file to disk"),
            Err(e) => warn!(error = %e, "Failed to sync temp file to disk"),
        }

        // Atomic rename (POSIX guarantees atomicity)
        fs::rename(&tmp_path, path).await?;

        debug!(path = %path.display(), "Report written");
        Ok(())
    }

    async fn recover_interrupted_writes(&self) {
        if let Ok(mut entries) = fs::read_dir(&self.output_dir).await {
            while let Ok(Some(entry)) = entries.next_entry().await {
                let path = entry.path();
                if path.extension().is_some_and(|ext| ext == "tmp") {
                    debug!(path = %path.display(), "Removing interrupted write");
                    let _ = fs::remove_file(&path).await;
                }
            }
        }
    }

    pub async fn load(&self, path: &Path) -> Result<AggregatedReport> {
        if !path.exists() {
            return Err(ScanError::ReportNotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path).await?;
        let report: AggregatedReport = serde_json::from_str(&content)?;
        Ok(report)
    }

    /// All stored report paths, newest first.
    pub async fn list(&self) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();

        if !self.output_dir.exists() {
            return Ok(paths);
        }

        let mut entries = fs::read_dir(&self.output_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }

        paths.sort_by(|a, b| b.file_name().cmp(&a.file_name()));
        Ok(paths)
    }

    /// Newest stored report for a target, if any.
    pub async fn latest_for(&self, target: &str) -> Result<Option<AggregatedReport>> {
        let prefix = format!("scan_{}_", target_slug(target));
        let paths = self.list().await?;
        for path in paths {
            if path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(&prefix))
            {
                return Ok(Some(self.load(&path).await?));
            }
        }
        Ok(None)
    }
}
