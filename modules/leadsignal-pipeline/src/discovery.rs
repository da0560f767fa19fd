use std::sync::Arc;

use tracing::{debug, info};

use leadsignal_common::{CompanyRecord, ExecutiveCandidate, Role, Stage, StageFailure};

use crate::stage::StageRunner;
use crate::traits::{ExecutiveMatch, LeadershipProvider};

/// Candidate found for a role plus any provider failures along the way.
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    pub candidate: Option<ExecutiveCandidate>,
    pub failures: Vec<StageFailure>,
}

/// Finds one candidate per role from leadership providers, in priority order.
pub struct DiscoveryStage {
    providers: Vec<Arc<dyn LeadershipProvider>>,
    runner: StageRunner,
}

impl DiscoveryStage {
    pub fn new(providers: Vec<Arc<dyn LeadershipProvider>>, runner: StageRunner) -> Self {
        Self { providers, runner }
    }

    /// Accept the first provider that returns a named candidate. Later
    /// providers are not consulted, whatever confidence they might report.
    pub async fn discover(&self, company: &CompanyRecord, role: Role) -> Discovery {
        let mut failures = Vec::new();

        for provider in &self.providers {
            let name = provider.name();
            let outcome = self
                .runner
                .invoke(Stage::Discovery, Some(name), None, provider.find_executive(company, role))
                .await;
            let (found, failure) = outcome.into_parts();
            failures.extend(failure);

            if let Some(candidate) = found.and_then(|m| into_candidate(m, name)) {
                info!(
                    company = %company.token,
                    %role,
                    provider = name,
                    candidate = %candidate.name,
                    title = candidate.title.as_deref().unwrap_or("-"),
                    "Candidate discovered"
                );
                return Discovery {
                    candidate: Some(candidate),
                    failures,
                };
            }
            debug!(company = %company.token, %role, provider = name, "No candidate from provider");
        }

        info!(company = %company.token, %role, "No provider returned a candidate");
        Discovery {
            candidate: None,
            failures,
        }
    }
}

/// A match only counts when it names someone.
fn into_candidate(found: ExecutiveMatch, provider: &str) -> Option<ExecutiveCandidate> {
    let name = found.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())?;
    let title = found.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
    let raw_confidence = found
        .raw_confidence
        .filter(|c| c.is_finite())
        .map(|c| c.round().clamp(0.0, 100.0) as u8)
        .unwrap_or(0);

    Some(ExecutiveCandidate {
        name,
        title,
        provider: provider.to_string(),
        raw_confidence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use leadsignal_common::{CompanyDefaults, ErrorKind, StageDeadlines};

    use crate::testing::MockLeadership;

    fn runner() -> StageRunner {
        StageRunner::new(StageDeadlines::uniform(Duration::from_millis(100)))
    }

    fn company() -> CompanyRecord {
        CompanyRecord::from_defaults("acme.com", &CompanyDefaults::default())
    }

    #[tokio::test]
    async fn first_named_candidate_wins_over_higher_confidence() {
        let first = MockLeadership::new("alpha").on_role(
            Role::FinanceLeader,
            ExecutiveMatch {
                name: None,
                title: Some("CFO".to_string()),
                raw_confidence: Some(99.0),
            },
        );
        let second = MockLeadership::new("beta").on_role(
            Role::FinanceLeader,
            ExecutiveMatch {
                name: Some("Pat Lee".to_string()),
                title: Some("Chief Financial Officer".to_string()),
                raw_confidence: Some(60.0),
            },
        );
        let third = MockLeadership::new("gamma").on_role(
            Role::FinanceLeader,
            ExecutiveMatch {
                name: Some("Someone Else".to_string()),
                title: Some("CFO".to_string()),
                raw_confidence: Some(95.0),
            },
        );
        let stage = DiscoveryStage::new(vec![Arc::new(first), Arc::new(second), Arc::new(third)], runner());

        let found = stage.discover(&company(), Role::FinanceLeader).await;
        let candidate = found.candidate.unwrap();
        assert_eq!(candidate.name, "Pat Lee");
        assert_eq!(candidate.provider, "beta");
        assert_eq!(candidate.raw_confidence, 60);
        assert!(found.failures.is_empty());
    }

    #[tokio::test]
    async fn failing_provider_is_skipped_and_recorded() {
        let broken = MockLeadership::new("broken").failing();
        let slow = MockLeadership::new("slow").hanging();
        let good = MockLeadership::new("good").on_role(
            Role::RevenueLeader,
            ExecutiveMatch {
                name: Some("Ray Chen".to_string()),
                title: None,
                raw_confidence: None,
            },
        );
        let stage = DiscoveryStage::new(vec![Arc::new(broken), Arc::new(slow), Arc::new(good)], runner());

        let found = stage.discover(&company(), Role::RevenueLeader).await;
        assert_eq!(found.candidate.as_ref().unwrap().name, "Ray Chen");
        assert!(found.candidate.as_ref().unwrap().title.is_none());
        let kinds: Vec<_> = found.failures.iter().map(|f| f.kind).collect();
        assert_eq!(kinds, vec![ErrorKind::ProviderError, ErrorKind::DiscoveryTimeout]);
    }

    #[tokio::test]
    async fn no_candidate_when_nobody_answers() {
        let stage = DiscoveryStage::new(vec![Arc::new(MockLeadership::new("empty"))], runner());
        let found = stage.discover(&company(), Role::FinanceLeader).await;
        assert!(found.candidate.is_none());
    }

    #[test]
    fn raw_confidence_is_clamped() {
        let candidate = into_candidate(
            ExecutiveMatch {
                name: Some(" Jo ".to_string()),
                title: Some("  ".to_string()),
                raw_confidence: Some(140.0),
            },
            "p",
        )
        .unwrap();
        assert_eq!(candidate.name, "Jo");
        assert!(candidate.title.is_none());
        assert_eq!(candidate.raw_confidence, 100);
    }
}
