//! Per-company sequencing: resolution, then two concurrent role tracks
//! (discovery, enrichment, verification), then result assembly.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;
use typed_builder::TypedBuilder;

use leadsignal_common::{
    overall_confidence, CompanyInput, CompanyRecord, ContactRecord, CorroborationSource,
    PipelineConfig, ProcessingResult, Role, RoleAssignment, StageFailure,
};

use crate::discovery::DiscoveryStage;
use crate::enrichment::{ContactFieldKind, EnrichmentStage};
use crate::resolution::ResolutionStage;
use crate::stage::StageRunner;
use crate::traits::{ContactProvider, IdentityResolver, LeadershipProvider, PresenceChecker};
use crate::verification::{Corroborator, VerificationEngine};

/// Anything that turns one company input into one result. The orchestrator
/// treats an `Err` (or a panic) as an orchestration failure for that company.
#[async_trait]
pub trait CompanyProcessor: Send + Sync {
    async fn process(&self, index: usize, input: &CompanyInput) -> Result<ProcessingResult>;
}

/// Long-lived providers and tuning for a pipeline.
#[derive(Clone, TypedBuilder)]
pub struct PipelineDeps {
    pub resolver: Arc<dyn IdentityResolver>,
    /// Leadership providers in priority order.
    #[builder(default)]
    pub leadership: Vec<Arc<dyn LeadershipProvider>>,
    /// Contact providers in default priority order.
    #[builder(default)]
    pub contacts: Vec<Arc<dyn ContactProvider>>,
    #[builder(default)]
    pub presence: Vec<(CorroborationSource, Arc<dyn PresenceChecker>)>,
    #[builder(default)]
    pub config: PipelineConfig,
}

/// Output of one role track.
struct RoleTrack {
    assignment: RoleAssignment,
    contact: ContactRecord,
    failures: Vec<StageFailure>,
}

pub struct CompanyPipeline {
    resolution: ResolutionStage,
    discovery: DiscoveryStage,
    enrichment: EnrichmentStage,
    verification: VerificationEngine,
}

impl CompanyPipeline {
    pub fn new(deps: PipelineDeps) -> Self {
        let runner = StageRunner::new(deps.config.deadlines);
        let corroborator = deps
            .presence
            .into_iter()
            .fold(Corroborator::new(runner), |c, (modality, checker)| {
                c.with_checker(modality, checker)
            });

        let priority = &deps.config.contact_priority;
        let enrichment = [
            (ContactFieldKind::Email, &priority.email),
            (ContactFieldKind::Phone, &priority.phone),
            (ContactFieldKind::Handle, &priority.handle),
        ]
        .into_iter()
        .filter(|(_, order)| !order.is_empty())
        .fold(EnrichmentStage::new(deps.contacts, runner), |stage, (field, order)| {
            stage.with_field_priority(field, order.as_slice())
        });

        Self {
            resolution: ResolutionStage::new(deps.resolver, runner),
            discovery: DiscoveryStage::new(deps.leadership, runner),
            enrichment,
            verification: VerificationEngine::new(
                corroborator,
                deps.config.tier.corroboration_sources(),
            ),
        }
    }

    /// Always produces a result. Stage failures degrade it; they never abort.
    pub async fn run(&self, index: usize, input: &CompanyInput) -> ProcessingResult {
        let started = Instant::now();

        let (company, resolution_failure) = self.resolution.resolve(input).await.into_parts();

        let (finance, revenue) = tokio::join!(
            self.role_track(&company, Role::FinanceLeader),
            self.role_track(&company, Role::RevenueLeader),
        );

        let mut failures: Vec<StageFailure> = resolution_failure.into_iter().collect();
        failures.extend(finance.failures);
        failures.extend(revenue.failures);

        let success = finance.assignment.is_filled() || revenue.assignment.is_filled();
        let overall = overall_confidence(&finance.assignment, &revenue.assignment);
        let processing_time_ms = started.elapsed().as_millis() as u64;

        info!(
            index,
            company = %company.token,
            success,
            overall_confidence = overall,
            failures = failures.len(),
            processing_time_ms,
            "Company processed"
        );

        ProcessingResult {
            index,
            token: input.token.clone(),
            account_owner: input.account_owner.clone(),
            company,
            finance: finance.assignment,
            revenue: revenue.assignment,
            finance_contact: finance.contact,
            revenue_contact: revenue.contact,
            processing_time_ms,
            overall_confidence: overall,
            success,
            error: failures.first().map(|f| f.kind),
            error_message: failures.first().map(|f| f.message.clone()),
            failures,
        }
    }

    async fn role_track(&self, company: &CompanyRecord, role: Role) -> RoleTrack {
        let discovery = self.discovery.discover(company, role).await;
        let candidate = discovery.candidate.as_ref();

        let enrichment = self.enrichment.enrich(company, candidate).await;
        let handle = enrichment.contact.handle.as_ref().map(|h| h.value.as_str());

        let verification = self.verification.verify(candidate, role, company, handle).await;

        let mut failures = discovery.failures;
        failures.extend(enrichment.failures);
        failures.extend(verification.failures);

        RoleTrack {
            assignment: verification.assignment,
            contact: enrichment.contact,
            failures,
        }
    }
}

#[async_trait]
impl CompanyProcessor for CompanyPipeline {
    async fn process(&self, index: usize, input: &CompanyInput) -> Result<ProcessingResult> {
        Ok(self.run(index, input).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    use leadsignal_common::{
        Authenticity, CompanyDefaults, ErrorKind, PipelineTier, StageDeadlines,
    };

    use crate::traits::{CompanyIdentity, ContactFields, ExecutiveMatch};
    use crate::testing::{MockContacts, MockLeadership, MockPresence, MockResolver};

    fn config(tier: PipelineTier) -> PipelineConfig {
        PipelineConfig {
            deadlines: StageDeadlines::uniform(Duration::from_millis(100)),
            tier,
            ..Default::default()
        }
    }

    fn exec(name: &str, title: &str, confidence: f64) -> ExecutiveMatch {
        ExecutiveMatch {
            name: Some(name.to_string()),
            title: Some(title.to_string()),
            raw_confidence: Some(confidence),
        }
    }

    #[tokio::test]
    async fn full_pipeline_fills_both_roles() {
        let resolver = MockResolver::new().on_resolve(
            "acme.com",
            CompanyIdentity {
                name: Some("Acme Inc".to_string()),
                industry: Some("Software".to_string()),
                employee_count: Some(450),
                ..Default::default()
            },
        );
        let leadership = MockLeadership::new("primary")
            .on_role(Role::FinanceLeader, exec("Pat Lee", "CFO", 80.0))
            .on_role(Role::RevenueLeader, exec("Alex Kim", "CEO", 85.0));
        let contacts = MockContacts::new("contacts").returning(ContactFields {
            email: Some("exec@acme.com".to_string()),
            phone: None,
            handle: Some("linkedin.com/in/exec".to_string()),
        });
        let presence = Arc::new(MockPresence::confirming(&[CorroborationSource::Profile]));

        let deps = PipelineDeps::builder()
            .resolver(Arc::new(resolver))
            .leadership(vec![Arc::new(leadership)])
            .contacts(vec![Arc::new(contacts)])
            .presence(vec![
                (CorroborationSource::Profile, presence.clone() as Arc<dyn PresenceChecker>),
                (CorroborationSource::LeadershipPage, presence.clone() as Arc<dyn PresenceChecker>),
            ])
            .config(config(PipelineTier::Advanced))
            .build();
        let pipeline = CompanyPipeline::new(deps);

        let result = pipeline.run(0, &CompanyInput::new("https://www.acme.com")).await;
        assert!(result.success);
        assert!(result.error.is_none());
        assert_eq!(result.company.name.as_deref(), Some("Acme Inc"));
        assert_eq!(result.finance.authenticity, Authenticity::Authentic);
        assert_eq!(result.finance.method, Some(CorroborationSource::Profile));
        assert_eq!(result.revenue.authenticity, Authenticity::Fallback);
        assert_eq!(
            result.finance_contact.email.as_ref().map(|e| e.value.as_str()),
            Some("exec@acme.com")
        );
        assert!(result.finance_contact.phone.is_none());
        // two roles x two modalities
        assert_eq!(presence.calls(), 4);
        assert_eq!(
            result.overall_confidence,
            overall_confidence(&result.finance, &result.revenue)
        );
    }

    #[tokio::test]
    async fn configured_contact_priority_reaches_enrichment() {
        let leadership = MockLeadership::new("primary")
            .on_role(Role::FinanceLeader, exec("Pat Lee", "CFO", 80.0));
        let first = MockContacts::new("first").returning(ContactFields {
            email: Some("first@acme.com".to_string()),
            phone: Some("+1 555 0100".to_string()),
            handle: None,
        });
        let second = MockContacts::new("second").returning(ContactFields {
            email: Some("second@acme.com".to_string()),
            phone: Some("+1 555 0199".to_string()),
            handle: None,
        });
        let mut config = config(PipelineTier::Core);
        config.contact_priority.phone = vec!["second".to_string(), "first".to_string()];
        let deps = PipelineDeps::builder()
            .resolver(Arc::new(MockResolver::new()))
            .leadership(vec![Arc::new(leadership)])
            .contacts(vec![Arc::new(first), Arc::new(second)])
            .config(config)
            .build();

        let result = CompanyPipeline::new(deps).run(0, &CompanyInput::new("acme.com")).await;
        let contact = result.finance_contact;
        assert_eq!(contact.email.map(|e| e.provider), Some("first".to_string()));
        assert_eq!(contact.phone.map(|p| p.provider), Some("second".to_string()));
    }

    #[tokio::test]
    async fn core_tier_skips_corroboration() {
        let leadership = MockLeadership::new("primary")
            .on_role(Role::FinanceLeader, exec("Pat Lee", "CFO", 80.0));
        let presence = Arc::new(MockPresence::confirming(&CorroborationSource::ALL));
        let deps = PipelineDeps::builder()
            .resolver(Arc::new(MockResolver::new()))
            .leadership(vec![Arc::new(leadership)])
            .presence(vec![(CorroborationSource::Profile, presence.clone() as Arc<dyn PresenceChecker>)])
            .config(config(PipelineTier::Core))
            .build();

        let result = CompanyPipeline::new(deps).run(3, &CompanyInput::new("acme.com")).await;
        assert_eq!(presence.calls(), 0);
        assert_eq!(result.index, 3);
        assert!(result.success);
        assert!(!result.revenue.is_filled());
        // Unknown token makes the mock resolver fail.
        assert_eq!(result.error, Some(ErrorKind::ProviderError));
    }

    #[tokio::test]
    async fn hanging_providers_still_produce_result_within_deadlines() {
        let deps = PipelineDeps::builder()
            .resolver(Arc::new(MockResolver::new().hanging()))
            .leadership(vec![Arc::new(MockLeadership::new("slow").hanging())])
            .config(config(PipelineTier::Powerhouse))
            .build();
        let input = CompanyInput::new("globex.com").with_defaults(CompanyDefaults {
            name: Some("Globex".to_string()),
            ..Default::default()
        });

        let started = Instant::now();
        let result = CompanyPipeline::new(deps).run(0, &input).await;
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(!result.success);
        assert_eq!(result.error, Some(ErrorKind::ResolutionTimeout));
        assert_eq!(result.company.name.as_deref(), Some("Globex"));
        assert_eq!(result.failures.len(), 3);
        assert_eq!(result.finance.adjusted_confidence, 20);
    }
}
