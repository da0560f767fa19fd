//! Title authenticity, context adjustment and corroboration scoring.
//!
//! `score` is a pure function of candidate, role, company and the
//! corroboration outcomes; `VerificationEngine::verify` runs the presence
//! checks and then scores.

pub mod context;
pub mod corroboration;
pub mod report;
pub mod rules;

pub use context::{classify_context, fallback_factor, is_enterprise_scale, ENTERPRISE_SCALE_PENALTY};
pub use corroboration::{Corroboration, Corroborator};
pub use report::VerificationReport;
pub use rules::{rules_for, RuleTable, TitleClass, TitleMatch};

use tracing::info;

use leadsignal_common::{
    clamp_confidence, Authenticity, CompanyRecord, CorroborationSource, ExecutiveCandidate, Role,
    RoleAssignment, StageFailure, MAX_CONFIDENCE,
};

use crate::traits::PresenceQuery;

/// Confidence floor for canonical titles.
pub const AUTHENTIC_FLOOR: f64 = 90.0;
/// Confidence caps per non-canonical classification.
pub const FALLBACK_CAP: f64 = 75.0;
pub const UNRELATED_CAP: f64 = 50.0;
pub const NO_TITLE_CAP: f64 = 40.0;

/// Assignment plus the corroboration failures behind it.
#[derive(Debug, Clone)]
pub struct Verification {
    pub assignment: RoleAssignment,
    pub failures: Vec<StageFailure>,
}

pub struct VerificationEngine {
    corroborator: Corroborator,
    sources: Vec<CorroborationSource>,
}

impl VerificationEngine {
    /// `sources` are the corroboration modalities attempted for every candidate.
    pub fn new(corroborator: Corroborator, sources: &[CorroborationSource]) -> Self {
        Self {
            corroborator,
            sources: sources.to_vec(),
        }
    }

    pub async fn verify(
        &self,
        candidate: Option<&ExecutiveCandidate>,
        role: Role,
        company: &CompanyRecord,
        handle: Option<&str>,
    ) -> Verification {
        let corroboration = match candidate {
            Some(candidate) if !self.sources.is_empty() => {
                let query = PresenceQuery {
                    candidate,
                    company,
                    handle,
                };
                self.corroborator.corroborate(query, &self.sources).await
            }
            _ => Corroboration::default(),
        };

        let assignment = score(candidate, role, company, &corroboration.found);
        info!(
            company = %company.token,
            %role,
            authenticity = %assignment.authenticity,
            confidence = assignment.adjusted_confidence,
            corroborations = assignment.corroborations.len(),
            "Role verified"
        );
        Verification {
            assignment,
            failures: corroboration.failures,
        }
    }
}

/// Score one candidate for one role.
pub fn score(
    candidate: Option<&ExecutiveCandidate>,
    role: Role,
    company: &CompanyRecord,
    corroborations: &[CorroborationSource],
) -> RoleAssignment {
    let context = classify_context(company);
    let Some(candidate) = candidate else {
        return RoleAssignment::vacant(role, context);
    };

    let original = candidate.raw_confidence as f64;
    let mut reasons = Vec::new();

    // 1. Title authenticity
    let title_match = rules_for(role).classify(candidate.title.as_deref());
    let title = candidate.title.as_deref().unwrap_or("");
    let mut confidence = match title_match.authenticity {
        Authenticity::Authentic => {
            reasons.push(format!(
                "Title '{title}' is a canonical {role} title ({}); confidence floor {AUTHENTIC_FLOOR}",
                title_match.rule.unwrap_or("-")
            ));
            original.max(AUTHENTIC_FLOOR)
        }
        Authenticity::Fallback => {
            reasons.push(format!(
                "Title '{title}' ({}) stands in for a dedicated {role}; capped at {FALLBACK_CAP}",
                title_match.rule.unwrap_or("-")
            ));
            original.min(FALLBACK_CAP)
        }
        Authenticity::Unrelated => {
            reasons.push(format!(
                "Title '{title}' matches no {role} pattern; capped at {UNRELATED_CAP}"
            ));
            original.min(UNRELATED_CAP)
        }
        Authenticity::NoTitle => {
            reasons.push(format!("No title reported; capped at {NO_TITLE_CAP}"));
            original.min(NO_TITLE_CAP)
        }
    };

    // 2. Context adjustment
    if title_match.authenticity == Authenticity::Fallback {
        let factor = fallback_factor(context);
        confidence *= factor;
        reasons.push(format!(
            "{context} company: fallback assignment scaled by {factor:.2}"
        ));
        if is_enterprise_scale(context, company) {
            confidence *= ENTERPRISE_SCALE_PENALTY;
            reasons.push(format!(
                "Enterprise-scale headcount: additional fallback penalty {ENTERPRISE_SCALE_PENALTY:.2}"
            ));
        }
    }

    // 3. Corroboration
    let mut found = corroborations.to_vec();
    found.sort();
    found.dedup();
    for source in &found {
        confidence += source.boost();
        reasons.push(format!("Corroborated by {source} (+{})", source.boost()));
    }
    confidence = confidence.min(MAX_CONFIDENCE as f64);
    if title_match.authenticity == Authenticity::NoTitle && confidence > NO_TITLE_CAP {
        confidence = NO_TITLE_CAP;
        reasons.push(format!("No title to corroborate; held at {NO_TITLE_CAP}"));
    }

    // 4. Clamp
    let adjusted = clamp_confidence(confidence);

    // 5. Net delta
    let delta = adjusted as i32 - candidate.raw_confidence as i32;
    reasons.push(format!(
        "Confidence {} -> {adjusted} ({delta:+})",
        candidate.raw_confidence
    ));

    RoleAssignment {
        role,
        candidate: Some(candidate.clone()),
        original_confidence: candidate.raw_confidence,
        adjusted_confidence: adjusted,
        authenticity: title_match.authenticity,
        context,
        method: found.first().copied(),
        corroborations: found,
        reasons,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use leadsignal_common::{
        CompanyContext, EmployeeBucket, StageDeadlines, MIN_CONFIDENCE,
    };

    use crate::stage::StageRunner;
    use crate::testing::{candidate_with_confidence, MockPresence};

    fn company(is_public: Option<bool>, employees: Option<EmployeeBucket>) -> CompanyRecord {
        CompanyRecord {
            token: "acme.com".to_string(),
            name: Some("Acme".to_string()),
            industry: Some("Software".to_string()),
            is_public,
            employees,
            headquarters: None,
        }
    }

    fn enterprise() -> CompanyRecord {
        company(Some(true), Some(EmployeeBucket::Enterprise))
    }

    fn startup() -> CompanyRecord {
        company(Some(false), Some(EmployeeBucket::Small))
    }

    fn general() -> CompanyRecord {
        company(None, Some(EmployeeBucket::MidMarket))
    }

    #[test]
    fn canonical_cfo_is_authentic_with_floor() {
        let cfo = candidate_with_confidence("Pat Lee", Some("Chief Financial Officer"), 55);
        let assignment = score(Some(&cfo), Role::FinanceLeader, &general(), &[]);
        assert_eq!(assignment.authenticity, Authenticity::Authentic);
        assert!(assignment.adjusted_confidence >= 90);
        assert!(assignment.method.is_none());
    }

    #[test]
    fn ceo_as_finance_lead_penalized_most_at_enterprise() {
        let ceo = candidate_with_confidence("Alex Kim", Some("Chief Executive Officer"), 85);
        let at_enterprise = score(Some(&ceo), Role::FinanceLeader, &enterprise(), &[]);
        let at_general = score(Some(&ceo), Role::FinanceLeader, &general(), &[]);
        let at_startup = score(Some(&ceo), Role::FinanceLeader, &startup(), &[]);

        assert_eq!(at_enterprise.authenticity, Authenticity::Fallback);
        assert_eq!(at_enterprise.context, CompanyContext::Enterprise);
        assert_eq!(at_startup.context, CompanyContext::Startup);
        assert!(at_enterprise.adjusted_confidence <= at_general.adjusted_confidence);
        assert!(at_general.adjusted_confidence <= at_startup.adjusted_confidence);
        assert!(at_startup.adjusted_confidence - at_enterprise.adjusted_confidence >= 20);
        // 75 * 0.70 * 0.85
        assert_eq!(at_enterprise.adjusted_confidence, 45);
        assert_eq!(at_startup.adjusted_confidence, 71);
    }

    #[test]
    fn missing_title_capped_at_forty() {
        let nobody = candidate_with_confidence("Sam Roe", None, 95);
        let assignment = score(Some(&nobody), Role::RevenueLeader, &general(), &[]);
        assert_eq!(assignment.authenticity, Authenticity::NoTitle);
        assert!(assignment.adjusted_confidence <= 40);
    }

    #[test]
    fn corroboration_cannot_lift_missing_title_past_forty() {
        let nobody = candidate_with_confidence("Sam Roe", None, 95);
        let assignment = score(
            Some(&nobody),
            Role::FinanceLeader,
            &general(),
            &CorroborationSource::ALL,
        );
        assert_eq!(assignment.authenticity, Authenticity::NoTitle);
        assert_eq!(assignment.adjusted_confidence, 40);
        assert_eq!(assignment.corroborations.len(), 3);
        assert!(assignment.reasons.iter().any(|r| r.contains("held at 40")));
    }

    #[test]
    fn unrelated_title_capped_at_fifty() {
        let engineer = candidate_with_confidence("Sam Roe", Some("Staff Engineer"), 95);
        let assignment = score(Some(&engineer), Role::RevenueLeader, &general(), &[]);
        assert_eq!(assignment.authenticity, Authenticity::Unrelated);
        assert_eq!(assignment.adjusted_confidence, 50);
    }

    #[test]
    fn corroboration_boosts_clamp_at_ninety_eight() {
        let cfo = candidate_with_confidence("Pat Lee", Some("CFO"), 93);
        let assignment = score(
            Some(&cfo),
            Role::FinanceLeader,
            &general(),
            &[CorroborationSource::Press, CorroborationSource::Profile],
        );
        assert_eq!(assignment.adjusted_confidence, MAX_CONFIDENCE);
        assert_eq!(assignment.method, Some(CorroborationSource::Profile));
        assert_eq!(
            assignment.corroborations,
            vec![CorroborationSource::Profile, CorroborationSource::Press]
        );
    }

    #[test]
    fn corroboration_boosts_are_cumulative() {
        let ceo = candidate_with_confidence("Alex Kim", Some("CEO"), 60);
        let plain = score(Some(&ceo), Role::RevenueLeader, &startup(), &[]);
        let boosted = score(
            Some(&ceo),
            Role::RevenueLeader,
            &startup(),
            &[CorroborationSource::LeadershipPage, CorroborationSource::Press],
        );
        assert_eq!(boosted.adjusted_confidence, plain.adjusted_confidence + 8);
        assert_eq!(boosted.method, Some(CorroborationSource::LeadershipPage));
    }

    #[test]
    fn very_low_raw_confidence_clamped_to_floor() {
        let ceo = candidate_with_confidence("Alex Kim", Some("Founder"), 5);
        let assignment = score(Some(&ceo), Role::FinanceLeader, &enterprise(), &[]);
        assert_eq!(assignment.adjusted_confidence, MIN_CONFIDENCE);
    }

    #[test]
    fn confidence_always_within_bounds() {
        let titles = [
            Some("CFO"),
            Some("CEO"),
            Some("Intern"),
            None,
            Some("Chief Revenue Officer"),
        ];
        let companies = [enterprise(), startup(), general()];
        for raw in [0u8, 20, 50, 75, 90, 100] {
            for title in titles {
                for company in &companies {
                    for role in Role::ALL {
                        let c = candidate_with_confidence("X", title, raw);
                        let a = score(Some(&c), role, company, &CorroborationSource::ALL);
                        assert!((MIN_CONFIDENCE..=MAX_CONFIDENCE).contains(&a.adjusted_confidence));
                    }
                }
            }
        }
    }

    #[test]
    fn scoring_is_idempotent() {
        let ceo = candidate_with_confidence("Alex Kim", Some("President & CEO"), 77);
        let sources = [CorroborationSource::LeadershipPage];
        let first = score(Some(&ceo), Role::FinanceLeader, &enterprise(), &sources);
        let second = score(Some(&ceo), Role::FinanceLeader, &enterprise(), &sources);
        assert_eq!(first, second);
    }

    #[test]
    fn audit_trail_covers_each_step() {
        let ceo = candidate_with_confidence("Alex Kim", Some("CEO"), 80);
        let assignment = score(
            Some(&ceo),
            Role::FinanceLeader,
            &enterprise(),
            &[CorroborationSource::Profile],
        );
        let reasons = &assignment.reasons;
        assert_eq!(reasons.len(), 5);
        assert!(reasons[0].contains("stands in for a dedicated finance leader"));
        assert!(reasons[1].starts_with("enterprise company"));
        assert!(reasons[2].contains("Enterprise-scale"));
        assert!(reasons[3].contains("professional profile match"));
        assert!(reasons[4].starts_with("Confidence 80 ->"));
    }

    #[test]
    fn no_candidate_is_vacant() {
        let assignment = score(None, Role::RevenueLeader, &startup(), &[CorroborationSource::Profile]);
        assert!(!assignment.is_filled());
        assert_eq!(assignment.adjusted_confidence, MIN_CONFIDENCE);
        assert_eq!(assignment.context, CompanyContext::Startup);
    }

    #[tokio::test]
    async fn verify_runs_configured_checks() {
        let runner = StageRunner::new(StageDeadlines::uniform(Duration::from_millis(100)));
        let checker = Arc::new(MockPresence::confirming(&CorroborationSource::ALL));
        let corroborator = Corroborator::new(runner)
            .with_checker(CorroborationSource::Profile, checker.clone())
            .with_checker(CorroborationSource::LeadershipPage, checker.clone())
            .with_checker(CorroborationSource::Press, checker.clone());
        let engine = VerificationEngine::new(
            corroborator,
            &[CorroborationSource::Profile, CorroborationSource::LeadershipPage],
        );
        let cfo = candidate_with_confidence("Pat Lee", Some("CFO"), 70);

        let verification = engine
            .verify(Some(&cfo), Role::FinanceLeader, &general(), Some("linkedin.com/in/patlee"))
            .await;
        assert_eq!(checker.calls(), 2);
        assert_eq!(verification.assignment.adjusted_confidence, 98);
        assert_eq!(verification.assignment.method, Some(CorroborationSource::Profile));
        assert!(verification.failures.is_empty());
    }

    #[tokio::test]
    async fn verify_without_candidate_skips_checks() {
        let runner = StageRunner::new(StageDeadlines::uniform(Duration::from_millis(100)));
        let checker = Arc::new(MockPresence::confirming(&CorroborationSource::ALL));
        let corroborator =
            Corroborator::new(runner).with_checker(CorroborationSource::Profile, checker.clone());
        let engine = VerificationEngine::new(corroborator, &CorroborationSource::ALL);

        let verification = engine.verify(None, Role::RevenueLeader, &general(), None).await;
        assert_eq!(checker.calls(), 0);
        assert!(!verification.assignment.is_filled());
    }
}
