use std::sync::Arc;

use futures::future::join_all;
use tracing::debug;

use leadsignal_common::{CorroborationSource, Stage, StageFailure};

use crate::stage::StageRunner;
use crate::traits::{PresenceChecker, PresenceQuery};

/// Which sources confirmed a candidate, highest weight first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Corroboration {
    pub found: Vec<CorroborationSource>,
    pub failures: Vec<StageFailure>,
}

/// Runs the independent presence checks for a candidate.
pub struct Corroborator {
    checkers: Vec<(CorroborationSource, Arc<dyn PresenceChecker>)>,
    runner: StageRunner,
}

impl Corroborator {
    pub fn new(runner: StageRunner) -> Self {
        Self {
            checkers: Vec::new(),
            runner,
        }
    }

    /// Register a checker for one modality. Checkers for the same modality
    /// are consulted in registration order.
    pub fn with_checker(mut self, modality: CorroborationSource, checker: Arc<dyn PresenceChecker>) -> Self {
        self.checkers.push((modality, checker));
        self
    }

    /// Run the requested modalities concurrently. Within a modality, checkers
    /// are tried in order until one confirms; a check that fails or times out
    /// moves on to the next. No confirmation means "not corroborated".
    pub async fn corroborate(
        &self,
        query: PresenceQuery<'_>,
        modalities: &[CorroborationSource],
    ) -> Corroboration {
        let mut wanted: Vec<CorroborationSource> = modalities.to_vec();
        wanted.sort();
        wanted.dedup();

        let checks = wanted
            .into_iter()
            .filter(|modality| self.checkers.iter().any(|(m, _)| m == modality))
            .map(|modality| async move { (modality, self.check_modality(query, modality).await) });

        let mut result = Corroboration::default();
        for (modality, (present, failures)) in join_all(checks).await {
            debug!(
                candidate = %query.candidate.name,
                modality = modality.as_str(),
                present,
                "Corroboration check done"
            );
            if present {
                result.found.push(modality);
            }
            result.failures.extend(failures);
        }
        result.found.sort();
        result
    }

    async fn check_modality(
        &self,
        query: PresenceQuery<'_>,
        modality: CorroborationSource,
    ) -> (bool, Vec<StageFailure>) {
        let mut failures = Vec::new();
        for (_, checker) in self.checkers.iter().filter(|(m, _)| *m == modality) {
            let (present, failure) = self
                .runner
                .invoke(
                    Stage::Corroboration,
                    Some(checker.name()),
                    false,
                    checker.check_presence(query, modality),
                )
                .await
                .into_parts();
            failures.extend(failure);
            if present {
                return (true, failures);
            }
        }
        (false, failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use leadsignal_common::{CompanyDefaults, CompanyRecord, ErrorKind, StageDeadlines};

    use crate::testing::{candidate, MockPresence};

    fn runner() -> StageRunner {
        StageRunner::new(StageDeadlines::uniform(Duration::from_millis(100)))
    }

    #[tokio::test]
    async fn collects_confirmed_sources_in_weight_order() {
        let checker = Arc::new(MockPresence::confirming(&[
            CorroborationSource::Press,
            CorroborationSource::Profile,
        ]));
        let corroborator = Corroborator::new(runner())
            .with_checker(CorroborationSource::Press, checker.clone())
            .with_checker(CorroborationSource::Profile, checker.clone())
            .with_checker(CorroborationSource::LeadershipPage, checker);
        let exec = candidate("Pat Lee", Some("CFO"));
        let company = CompanyRecord::from_defaults("acme.com", &CompanyDefaults::default());
        let query = PresenceQuery {
            candidate: &exec,
            company: &company,
            handle: None,
        };

        let result = corroborator.corroborate(query, &CorroborationSource::ALL).await;
        assert_eq!(
            result.found,
            vec![CorroborationSource::Profile, CorroborationSource::Press]
        );
        assert!(result.failures.is_empty());
    }

    #[tokio::test]
    async fn unrequested_and_unregistered_modalities_are_skipped() {
        let checker = Arc::new(MockPresence::confirming(&CorroborationSource::ALL));
        let corroborator =
            Corroborator::new(runner()).with_checker(CorroborationSource::Profile, checker.clone());
        let exec = candidate("Pat Lee", Some("CFO"));
        let company = CompanyRecord::from_defaults("acme.com", &CompanyDefaults::default());
        let query = PresenceQuery {
            candidate: &exec,
            company: &company,
            handle: None,
        };

        let result = corroborator
            .corroborate(query, &[CorroborationSource::LeadershipPage, CorroborationSource::Press])
            .await;
        assert!(result.found.is_empty());
        assert_eq!(checker.calls(), 0);
    }

    #[tokio::test]
    async fn hanging_check_is_not_negative_evidence() {
        let slow = Arc::new(MockPresence::hanging());
        let fast = Arc::new(MockPresence::confirming(&[CorroborationSource::LeadershipPage]));
        let corroborator = Corroborator::new(runner())
            .with_checker(CorroborationSource::Profile, slow)
            .with_checker(CorroborationSource::LeadershipPage, fast);
        let exec = candidate("Pat Lee", Some("CFO"));
        let company = CompanyRecord::from_defaults("acme.com", &CompanyDefaults::default());
        let query = PresenceQuery {
            candidate: &exec,
            company: &company,
            handle: None,
        };

        let result = corroborator
            .corroborate(query, &[CorroborationSource::Profile, CorroborationSource::LeadershipPage])
            .await;
        assert_eq!(result.found, vec![CorroborationSource::LeadershipPage]);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].kind, ErrorKind::CorroborationTimeout);
    }

    #[tokio::test]
    async fn later_checkers_answer_when_earlier_ones_miss() {
        let silent = Arc::new(MockPresence::confirming(&[]));
        let slow = Arc::new(MockPresence::hanging());
        let backup = Arc::new(MockPresence::confirming(&CorroborationSource::ALL));
        let corroborator = Corroborator::new(runner())
            .with_checker(CorroborationSource::Profile, silent.clone())
            .with_checker(CorroborationSource::Profile, backup.clone())
            .with_checker(CorroborationSource::Press, slow.clone())
            .with_checker(CorroborationSource::Press, backup.clone())
            .with_checker(CorroborationSource::LeadershipPage, backup.clone())
            .with_checker(CorroborationSource::LeadershipPage, silent.clone());
        let exec = candidate("Pat Lee", Some("CFO"));
        let company = CompanyRecord::from_defaults("acme.com", &CompanyDefaults::default());
        let query = PresenceQuery {
            candidate: &exec,
            company: &company,
            handle: None,
        };

        let result = corroborator.corroborate(query, &CorroborationSource::ALL).await;
        assert_eq!(result.found, CorroborationSource::ALL.to_vec());
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].kind, ErrorKind::CorroborationTimeout);
        // leadership page confirmed first, so its second checker is never asked
        assert_eq!(silent.calls(), 1);
        assert_eq!(slow.calls(), 1);
        assert_eq!(backup.calls(), 3);
    }
}
