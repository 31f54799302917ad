use thiserror::Error;

/// Failure raised by a single probe invocation.
///
/// Probe failures never abort a scan: the orchestrator converts them into
/// failure outcomes and the aggregator records them alongside successes.
#[derive(Debug, Clone)]
pub enum ProbeError {
    Timeout { duration_secs: u64 },
    Network(String),
    AccessDenied(String),
    Parse(String),
    Other(String),
}

impl ProbeError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Network(_))
    }

    pub fn is_permanent(&self) -> bool {
        !self.is_transient()
    }

    /// Classify a raw failure message into a structured ProbeError.
    /// Only matches unambiguous patterns; everything else stays Other.
    pub fn from_message(msg: &str) -> Self {
        let lower = msg.to_lowercase();

        if lower.contains("access denied")
            || lower.contains("permission denied")
            || lower.contains("forbidden")
            || lower.contains("403")
        {
            return Self::AccessDenied(msg.to_string());
        }

        if lower.contains("timed out") || lower.contains("timeout") {
            return Self::Timeout {
                duration_secs: Self::extract_seconds(&lower),
            };
        }

        if lower.contains("connection")
            || lower.contains("unreachable")
            || lower.contains("dns")
            || lower.contains("502")
            || lower.contains("503")
            || lower.contains("504")
        {
            return Self::Network(msg.to_string());
        }

        Self::Other(msg.to_string())
    }

    fn extract_seconds(lower: &str) -> u64 {
        // Look for "after Xs" style suffixes in timeout messages
        if let Some(idx) = lower.find("after ") {
            let digits: String = lower[idx + "after ".len()..]
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            if let Ok(secs) = digits.parse() {
                return secs;
            }
        }
        0
    }
}

impl std::fmt::Display for ProbeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout { duration_secs } => write!(f, "Timed out after {}s", duration_secs),
            Self::Network(msg) => write!(f, "Network error: {}", msg),
            Self::AccessDenied(msg) => write!(f, "Access denied: {}", msg),
            Self::Parse(msg) => write!(f, "Parse error: {}", msg),
            Self::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ProbeError {}

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Scan has no phases to dispatch")]
    NoPhases,

    #[error("Phase '{0}' has no probes")]
    EmptyPhase(String),

    #[error("Nothing to fuse: no phase produced a result")]
    NothingToFuse,

    #[error("Scan cancelled")]
    Cancelled,

    #[error("Aggregation failed: {0}")]
    Aggregator(String),

    #[error("Invalid state transition: {from} -> {to} (allowed: {allowed})")]
    InvalidStateTransition {
        from: String,
        to: String,
        allowed: String,
    },

    #[error("Investigation not found: {0}")]
    InvestigationNotFound(String),

    #[error("Investigation failed: {0}")]
    Investigation(String),

    #[error("Investigation not finished: {0}")]
    ReportNotReady(String),

    #[error("Report not found: {0}")]
    ReportNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ScanError>;
