use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;
use tracing::debug;

use crate::error::ProbeError;
use crate::probe::{Payload, Probe};

use super::patterns;

/// Confidence hint attached to non-empty payloads. Surface-level document
/// mining is treated as fairly trustworthy but never certain.
const SURFACE_CONFIDENCE: f64 = 0.85;

/// Probe mining local documents for contact fragments.
///
/// Reads one file, or every file directly under a directory, and extracts
/// emails, phone numbers and social links. The whole corpus is mined; the
/// target only labels the scan it runs under.
pub struct DocumentProbe {
    name: String,
    path: PathBuf,
    reliability: f64,
    expected_keys: Vec<String>,
}

impl DocumentProbe {
    pub fn new(name: impl Into<String>, path: PathBuf) -> Self {
        Self {
            name: name.into(),
            path,
            reliability: 1.0,
            expected_keys: vec![
                "emails".to_string(),
                "phones".to_string(),
                "social_media".to_string(),
            ],
        }
    }

    pub fn with_reliability(mut self, reliability: f64) -> Self {
        self.reliability = reliability.clamp(0.0, 1.0);
        self
    }

    async fn read_corpus(&self) -> std::result::Result<String, ProbeError> {
        let meta = fs::metadata(&self.path).await.map_err(Self::io_error)?;
        if !meta.is_dir() {
            return fs::read_to_string(&self.path).await.map_err(Self::io_error);
        }

        let mut corpus = String::new();
        let mut entries = fs::read_dir(&self.path).await.map_err(Self::io_error)?;
        while let Some(entry) = entries.next_entry().await.map_err(Self::io_error)? {
            let file_type = entry.file_type().await.map_err(Self::io_error)?;
            if !file_type.is_file() {
                continue;
            }
            // Unreadable or non-text entries are skipped, not fatal
            match fs::read_to_string(entry.path()).await {
                Ok(text) => {
                    corpus.push_str(&text);
                    corpus.push('\n');
                }
                Err(e) => {
                    debug!(path = %entry.path().display(), error = %e, "Skipping unreadable file");
                }
            }
        }
        Ok(corpus)
    }

    fn io_error(err: std::io::Error) -> ProbeError {
        if err.kind() == std::io::ErrorKind::PermissionDenied {
            ProbeError::AccessDenied(err.to_string())
        } else {
            ProbeError::Other(err.to_string())
        }
    }
}

#[async_trait]
impl Probe for DocumentProbe {
    async fn invoke(&self, _target: &str) -> std::result::Result<Payload, ProbeError> {
        let corpus = self.read_corpus().await?;
        debug!(probe = %self.name, bytes = corpus.len(), "Document corpus loaded");

        let mut payload = Payload::new();
        let emails = patterns::extract_emails(&corpus);
        if !emails.is_empty() {
            payload.insert("emails".to_string(), Value::from(emails));
        }
        let phones = patterns::extract_phones(&corpus);
        if !phones.is_empty() {
            payload.insert("phones".to_string(), Value::from(phones));
        }
        let links = patterns::extract_social_links(&corpus);
        if !links.is_empty() {
            payload.insert("social_media".to_string(), Value::from(links));
        }
        if !payload.is_empty() {
            payload.insert("confidence".to_string(), Value::from(SURFACE_CONFIDENCE));
        }
        Ok(payload)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn expected_keys(&self) -> &[String] {
        &self.expected_keys
    }

    fn reliability(&self) -> f64 {
        self.reliability
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_extracts_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("notes.txt");
        std::fs::write(
            &path,
            "Reach alice@example.com or 202-555-0123, profile twitter.com/alice",
        )
        .unwrap();

        let probe = DocumentProbe::new("notes", path);
        let payload = probe.invoke("alice").await.unwrap();

        assert!(payload.contains_key("emails"));
        assert!(payload.contains_key("phones"));
        assert!(payload.contains_key("social_media"));
        assert!(payload.get("confidence").and_then(Value::as_f64).is_some());
    }

    #[tokio::test]
    async fn test_extracts_from_directory() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.txt"), "mail a@example.com").unwrap();
        std::fs::write(temp.path().join("b.txt"), "mail b@example.com").unwrap();

        let probe = DocumentProbe::new("corpus", temp.path().to_path_buf());
        let payload = probe.invoke("acme").await.unwrap();

        let emails = payload.get("emails").and_then(Value::as_array).unwrap();
        assert_eq!(emails.len(), 2);
        assert!(!payload.contains_key("phones"));
    }

    #[tokio::test]
    async fn test_barren_corpus_yields_empty_payload() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("blank.txt");
        std::fs::write(&path, "no contacts in this file").unwrap();

        let probe = DocumentProbe::new("blank", path);
        let payload = probe.invoke("acme").await.unwrap();
        assert!(payload.is_empty());
    }

    #[tokio::test]
    async fn test_missing_path_fails() {
        let probe = DocumentProbe::new("gone", PathBuf::from("/nonexistent/corpus.txt"));
        let err = probe.invoke("acme").await.unwrap_err();
        assert!(matches!(err, ProbeError::Other(_)));
    }
}
