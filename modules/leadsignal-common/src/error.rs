use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LeadSignalError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Input error: {0}")]
    Input(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// Failure taxonomy attached to degraded results. Never raised: stage
/// failures are converted to fallbacks and recorded with one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ResolutionTimeout,
    DiscoveryTimeout,
    EnrichmentTimeout,
    CorroborationTimeout,
    ProviderError,
    OrchestrationFailure,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::ResolutionTimeout => "ResolutionTimeout",
            ErrorKind::DiscoveryTimeout => "DiscoveryTimeout",
            ErrorKind::EnrichmentTimeout => "EnrichmentTimeout",
            ErrorKind::CorroborationTimeout => "CorroborationTimeout",
            ErrorKind::ProviderError => "ProviderError",
            ErrorKind::OrchestrationFailure => "OrchestrationFailure",
        };
        f.write_str(s)
    }
}

/// Pipeline stage an external call belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Resolution,
    Discovery,
    Enrichment,
    Corroboration,
}

impl Stage {
    pub fn timeout_kind(&self) -> ErrorKind {
        match self {
            Stage::Resolution => ErrorKind::ResolutionTimeout,
            Stage::Discovery => ErrorKind::DiscoveryTimeout,
            Stage::Enrichment => ErrorKind::EnrichmentTimeout,
            Stage::Corroboration => ErrorKind::CorroborationTimeout,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Resolution => "resolution",
            Stage::Discovery => "discovery",
            Stage::Enrichment => "enrichment",
            Stage::Corroboration => "corroboration",
        };
        f.write_str(s)
    }
}

/// One recorded stage failure. Audit only; never drives control flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageFailure {
    pub stage: Stage,
    pub kind: ErrorKind,
    /// Provider tag, when the failing call belonged to a specific provider.
    pub provider: Option<String>,
    pub message: String,
}

impl StageFailure {
    pub fn timeout(stage: Stage, provider: Option<&str>, deadline_ms: u64) -> Self {
        Self {
            stage,
            kind: stage.timeout_kind(),
            provider: provider.map(str::to_string),
            message: format!("{stage} call exceeded {deadline_ms}ms deadline"),
        }
    }

    pub fn provider_error(stage: Stage, provider: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            stage,
            kind: ErrorKind::ProviderError,
            provider: provider.map(str::to_string),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_kind_matches_stage() {
        assert_eq!(Stage::Resolution.timeout_kind(), ErrorKind::ResolutionTimeout);
        assert_eq!(Stage::Corroboration.timeout_kind(), ErrorKind::CorroborationTimeout);
    }

    #[test]
    fn timeout_failure_names_deadline() {
        let failure = StageFailure::timeout(Stage::Discovery, Some("acme"), 250);
        assert_eq!(failure.kind, ErrorKind::DiscoveryTimeout);
        assert_eq!(failure.provider.as_deref(), Some("acme"));
        assert!(failure.message.contains("250ms"));
    }

    #[test]
    fn error_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::OrchestrationFailure).unwrap();
        assert_eq!(json, "\"orchestration_failure\"");
    }
}
