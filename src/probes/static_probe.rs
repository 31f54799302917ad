use std::time::Duration;

use async_trait::async_trait;

use crate::error::ProbeError;
use crate::probe::{Payload, Probe};

/// Probe returning a fixed payload, with optional simulated latency or a
/// scripted failure. Used for plan rehearsals and engine tests.
#[derive(Debug, Clone)]
pub struct StaticProbe {
    name: String,
    payload: Payload,
    expected_keys: Vec<String>,
    reliability: f64,
    fail_with: Option<ProbeError>,
    delay: Option<Duration>,
}

impl StaticProbe {
    pub fn new(name: impl Into<String>, payload: Payload) -> Self {
        let expected_keys = payload.keys().cloned().collect();
        Self {
            name: name.into(),
            payload,
            expected_keys,
            reliability: 1.0,
            fail_with: None,
            delay: None,
        }
    }

    /// Probe that always fails, classifying the message into an error kind.
    pub fn failing(name: impl Into<String>, message: &str) -> Self {
        let mut probe = Self::new(name, Payload::new());
        probe.fail_with = Some(ProbeError::from_message(message));
        probe
    }

    pub fn with_reliability(mut self, reliability: f64) -> Self {
        self.reliability = reliability.clamp(0.0, 1.0);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl Probe for StaticProbe {
    async fn invoke(&self, _target: &str) -> std::result::Result<Payload, ProbeError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.fail_with {
            Some(error) => Err(error.clone()),
            None => Ok(self.payload.clone()),
        }
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
    use serde_json::json;

    fn sample_payload() -> Payload {
        let Some(map) = json!({"emails": ["a@example.com"]}).as_object().cloned() else {
            panic!("payload literal must be an object");
        };
        map
    }

    #[tokio::test]
    async fn test_returns_payload() {
        let probe = StaticProbe::new("directory", sample_payload());
        let payload = probe.invoke("acme").await.unwrap();

        assert!(payload.contains_key("emails"));
        assert_eq!(probe.expected_keys(), &["emails".to_string()]);
    }

    #[tokio::test]
    async fn test_scripted_failure() {
        let probe = StaticProbe::failing("flaky", "connection refused");
        let err = probe.invoke("acme").await.unwrap_err();

        assert!(matches!(err, ProbeError::Network(_)));
        assert!(err.is_transient());
    }

    #[test]
    fn test_reliability_clamped() {
        let probe = StaticProbe::new("p", Payload::new()).with_reliability(3.0);
        assert!((probe.reliability() - 1.0).abs() < f64::EPSILON);
    }
}
