use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{LeadSignalError, Stage};
use crate::types::CorroborationSource;

/// One data-provider endpoint. Providers are queried in declaration order.
#[derive(Clone)]
pub struct ProviderEndpoint {
    pub name: String,
    pub base_url: String,
    pub api_key: String,
}

impl fmt::Debug for ProviderEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderEndpoint")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("api_key", &"[redacted]")
            .finish()
    }
}

/// Provider configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub providers: Vec<ProviderEndpoint>,
    pub pipeline: PipelineConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// `LEADSIGNAL_PROVIDERS` is a comma-separated list of `name=base_url`
    /// pairs in priority order. Each provider's key is read from
    /// `<NAME>_API_KEY`.
    pub fn from_env() -> Result<Self, LeadSignalError> {
        let raw = required_env("LEADSIGNAL_PROVIDERS")?;
        let mut providers = Vec::new();
        for (name, base_url) in parse_provider_list(&raw)? {
            let key_var = format!("{}_API_KEY", name.to_uppercase().replace('-', "_"));
            let api_key = required_env(&key_var)?;
            providers.push(ProviderEndpoint {
                name,
                base_url,
                api_key,
            });
        }

        Ok(Self {
            providers,
            pipeline: PipelineConfig::from_env()?,
        })
    }

    /// Log the loaded configuration without secrets.
    pub fn log_redacted(&self) {
        let names: Vec<&str> = self.providers.iter().map(|p| p.name.as_str()).collect();
        info!(
            providers = ?names,
            tier = %self.pipeline.tier,
            concurrency = self.pipeline.concurrency_limit,
            pacing_ms = self.pipeline.pacing_delay.as_millis() as u64,
            resolution_ms = self.pipeline.deadlines.resolution.as_millis() as u64,
            discovery_ms = self.pipeline.deadlines.discovery.as_millis() as u64,
            enrichment_ms = self.pipeline.deadlines.enrichment.as_millis() as u64,
            corroboration_ms = self.pipeline.deadlines.corroboration.as_millis() as u64,
            contact_priority = ?self.pipeline.contact_priority,
            "Configuration loaded"
        );
    }
}

fn parse_provider_list(raw: &str) -> Result<Vec<(String, String)>, LeadSignalError> {
    let mut out = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let Some((name, url)) = entry.split_once('=') else {
            return Err(LeadSignalError::Config(format!(
                "provider entry '{entry}' must be name=base_url"
            )));
        };
        let (name, url) = (name.trim(), url.trim());
        if name.is_empty() || url.is_empty() {
            return Err(LeadSignalError::Config(format!(
                "provider entry '{entry}' must be name=base_url"
            )));
        }
        out.push((name.to_string(), url.to_string()));
    }
    if out.is_empty() {
        return Err(LeadSignalError::Config(
            "LEADSIGNAL_PROVIDERS lists no providers".to_string(),
        ));
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Pipeline tuning
// ---------------------------------------------------------------------------

/// How much corroboration a run pays for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineTier {
    /// Title and context scoring only.
    Core,
    /// Profile and leadership-page corroboration.
    Advanced,
    /// Every corroboration source.
    Powerhouse,
}

impl PipelineTier {
    pub fn corroboration_sources(&self) -> &'static [CorroborationSource] {
        match self {
            PipelineTier::Core => &[],
            PipelineTier::Advanced => &[
                CorroborationSource::Profile,
                CorroborationSource::LeadershipPage,
            ],
            PipelineTier::Powerhouse => &CorroborationSource::ALL,
        }
    }
}

impl FromStr for PipelineTier {
    type Err = LeadSignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "core" => Ok(PipelineTier::Core),
            "advanced" => Ok(PipelineTier::Advanced),
            "powerhouse" => Ok(PipelineTier::Powerhouse),
            other => Err(LeadSignalError::Config(format!("unknown pipeline tier '{other}'"))),
        }
    }
}

impl fmt::Display for PipelineTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PipelineTier::Core => "core",
            PipelineTier::Advanced => "advanced",
            PipelineTier::Powerhouse => "powerhouse",
        };
        f.write_str(s)
    }
}

/// Per-stage deadline for a single external call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageDeadlines {
    pub resolution: Duration,
    pub discovery: Duration,
    pub enrichment: Duration,
    pub corroboration: Duration,
}

impl StageDeadlines {
    pub fn for_stage(&self, stage: Stage) -> Duration {
        match stage {
            Stage::Resolution => self.resolution,
            Stage::Discovery => self.discovery,
            Stage::Enrichment => self.enrichment,
            Stage::Corroboration => self.corroboration,
        }
    }

    /// Same deadline for every stage.
    pub fn uniform(deadline: Duration) -> Self {
        Self {
            resolution: deadline,
            discovery: deadline,
            enrichment: deadline,
            corroboration: deadline,
        }
    }
}

impl Default for StageDeadlines {
    fn default() -> Self {
        Self {
            resolution: Duration::from_secs(8),
            discovery: Duration::from_secs(10),
            enrichment: Duration::from_secs(8),
            corroboration: Duration::from_secs(5),
        }
    }
}

/// Provider names to consult for each contact field. An empty list keeps
/// declaration order for that field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactPriority {
    pub email: Vec<String>,
    pub phone: Vec<String>,
    pub handle: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub deadlines: StageDeadlines,
    pub concurrency_limit: usize,
    pub pacing_delay: Duration,
    pub tier: PipelineTier,
    pub contact_priority: ContactPriority,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            deadlines: StageDeadlines::default(),
            concurrency_limit: 3,
            pacing_delay: Duration::from_millis(1000),
            tier: PipelineTier::Advanced,
            contact_priority: ContactPriority::default(),
        }
    }
}

impl PipelineConfig {
    /// Defaults overridden by whichever tuning variables are set.
    pub fn from_env() -> Result<Self, LeadSignalError> {
        let mut config = Self::default();
        if let Some(ms) = optional_env::<u64>("RESOLUTION_DEADLINE_MS")? {
            config.deadlines.resolution = Duration::from_millis(ms);
        }
        if let Some(ms) = optional_env::<u64>("DISCOVERY_DEADLINE_MS")? {
            config.deadlines.discovery = Duration::from_millis(ms);
        }
        if let Some(ms) = optional_env::<u64>("ENRICHMENT_DEADLINE_MS")? {
            config.deadlines.enrichment = Duration::from_millis(ms);
        }
        if let Some(ms) = optional_env::<u64>("CORROBORATION_DEADLINE_MS")? {
            config.deadlines.corroboration = Duration::from_millis(ms);
        }
        if let Some(n) = optional_env::<usize>("BATCH_CONCURRENCY")? {
            config.concurrency_limit = n.max(1);
        }
        if let Some(ms) = optional_env::<u64>("BATCH_PACING_MS")? {
            config.pacing_delay = Duration::from_millis(ms);
        }
        if let Some(tier) = optional_env::<PipelineTier>("PIPELINE_TIER")? {
            config.tier = tier;
        }
        config.contact_priority = ContactPriority {
            email: name_list(env::var("EMAIL_PRIORITY").ok().as_deref()),
            phone: name_list(env::var("PHONE_PRIORITY").ok().as_deref()),
            handle: name_list(env::var("HANDLE_PRIORITY").ok().as_deref()),
        };
        Ok(config)
    }
}

fn name_list(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .collect()
}

fn required_env(key: &str) -> Result<String, LeadSignalError> {
    env::var(key).map_err(|_| LeadSignalError::Config(format!("{key} environment variable is required")))
}

fn optional_env<T: FromStr>(key: &str) -> Result<Option<T>, LeadSignalError> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| LeadSignalError::Config(format!("{key} has invalid value '{raw}'"))),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_list_preserves_order() {
        let parsed = parse_provider_list("apollo=https://a.example, lusha = https://l.example").unwrap();
        assert_eq!(
            parsed,
            vec![
                ("apollo".to_string(), "https://a.example".to_string()),
                ("lusha".to_string(), "https://l.example".to_string()),
            ]
        );
    }

    #[test]
    fn provider_list_rejects_malformed_entry() {
        assert!(parse_provider_list("apollo").is_err());
        assert!(parse_provider_list("=https://x").is_err());
        assert!(parse_provider_list(" , ").is_err());
    }

    #[test]
    fn priority_lists_skip_blanks() {
        assert_eq!(name_list(Some(" lusha, ,apollo ")), vec!["lusha", "apollo"]);
        assert!(name_list(Some("")).is_empty());
        assert!(name_list(None).is_empty());
    }

    #[test]
    fn tier_parses_case_insensitively() {
        assert_eq!("Powerhouse".parse::<PipelineTier>().unwrap(), PipelineTier::Powerhouse);
        assert!("turbo".parse::<PipelineTier>().is_err());
    }

    #[test]
    fn tiers_widen_corroboration() {
        assert!(PipelineTier::Core.corroboration_sources().is_empty());
        assert_eq!(PipelineTier::Advanced.corroboration_sources().len(), 2);
        assert_eq!(PipelineTier::Powerhouse.corroboration_sources().len(), 3);
    }

    #[test]
    fn endpoint_debug_hides_key() {
        let endpoint = ProviderEndpoint {
            name: "apollo".to_string(),
            base_url: "https://a.example".to_string(),
            api_key: "sk-secret".to_string(),
        };
        assert!(!format!("{endpoint:?}").contains("sk-secret"));
    }
}
