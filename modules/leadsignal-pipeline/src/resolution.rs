use std::sync::Arc;

use tracing::{debug, info};

use leadsignal_common::{CompanyDefaults, CompanyInput, CompanyRecord, EmployeeBucket, Stage};

use crate::stage::{StageOutcome, StageRunner};
use crate::traits::{CompanyIdentity, IdentityResolver};

/// Maps a company token to its canonical record.
pub struct ResolutionStage {
    resolver: Arc<dyn IdentityResolver>,
    runner: StageRunner,
}

impl ResolutionStage {
    pub fn new(resolver: Arc<dyn IdentityResolver>, runner: StageRunner) -> Self {
        Self { resolver, runner }
    }

    /// Resolve `input.token`, filling gaps from the caller's defaults. On
    /// timeout or provider failure the record is built from defaults alone.
    pub async fn resolve(&self, input: &CompanyInput) -> StageOutcome<CompanyRecord> {
        let provider = self.resolver.name();
        let outcome = self
            .runner
            .invoke(
                Stage::Resolution,
                Some(provider),
                None,
                async { self.resolver.resolve(&input.token).await.map(Some) },
            )
            .await;

        match outcome {
            StageOutcome::Completed(identity) => {
                let record = merge(&input.token, identity.as_ref(), &input.defaults);
                info!(
                    company = %input.token,
                    name = record.display_name(),
                    provider,
                    "Company resolved"
                );
                StageOutcome::Completed(record)
            }
            StageOutcome::Fallback { failure, .. } => {
                debug!(company = %input.token, "Resolution fell back to caller defaults");
                StageOutcome::Fallback {
                    value: merge(&input.token, None, &input.defaults),
                    failure,
                }
            }
        }
    }
}

/// Per field: provider value if present, else the caller default, else empty.
pub fn merge(token: &str, identity: Option<&CompanyIdentity>, defaults: &CompanyDefaults) -> CompanyRecord {
    let provided = identity.cloned().unwrap_or_default();
    let employee_count = provided.employee_count.or(defaults.employee_count);

    CompanyRecord {
        token: token.to_string(),
        name: present(provided.name).or_else(|| present(defaults.name.clone())),
        industry: present(provided.industry).or_else(|| present(defaults.industry.clone())),
        is_public: provided.is_public.or(defaults.is_public),
        employees: employee_count.map(EmployeeBucket::from_count),
        headquarters: present(provided.headquarters)
            .or_else(|| present(defaults.headquarters.clone())),
    }
}

/// Blank strings count as absent.
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
