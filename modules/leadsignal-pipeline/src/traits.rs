// Trait abstractions for the external data providers the pipeline depends on.
//
// IdentityResolver: token → company identity.
// LeadershipProvider: company + role → executive, queried in priority order.
// ContactProvider: candidate → contact fields, queried per field in priority order.
// PresenceChecker: independent confirmation that a candidate holds the title.
//
// Every call goes through StageRunner, so implementations may hang, fail or
// panic without taking the pipeline down. Tests swap in the mocks from
// `testing.rs`: no network, no API keys.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use leadsignal_common::{CompanyRecord, CorroborationSource, ExecutiveCandidate, Role};

// ---------------------------------------------------------------------------
// Provider payloads
// ---------------------------------------------------------------------------

/// What an identity resolver knows about a company. Any field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyIdentity {
    pub name: Option<String>,
    pub industry: Option<String>,
    pub is_public: Option<bool>,
    pub employee_count: Option<u32>,
    pub headquarters: Option<String>,
}

/// A leadership provider's answer for one role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutiveMatch {
    pub name: Option<String>,
    pub title: Option<String>,
    /// Provider confidence, 0-100.
    pub raw_confidence: Option<f64>,
}

/// Contact fields from one enrichment provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactFields {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub handle: Option<String>,
}

/// Who a presence check is about.
#[derive(Debug, Clone, Copy)]
pub struct PresenceQuery<'a> {
    pub candidate: &'a ExecutiveCandidate,
    pub company: &'a CompanyRecord,
    /// Professional-network handle from enrichment, when one was found.
    pub handle: Option<&'a str>,
}

// ---------------------------------------------------------------------------
// Provider traits
// ---------------------------------------------------------------------------

#[async_trait]
pub trait IdentityResolver: Send + Sync {
    fn name(&self) -> &str;

    /// Resolve a domain or company name.
    async fn resolve(&self, token: &str) -> Result<CompanyIdentity>;
}

#[async_trait]
pub trait LeadershipProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Find the person holding `role`. `Ok(None)` means no one is known.
    async fn find_executive(&self, company: &CompanyRecord, role: Role) -> Result<Option<ExecutiveMatch>>;
}

#[async_trait]
pub trait ContactProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn enrich_contact(
        &self,
        company: &CompanyRecord,
        candidate: &ExecutiveCandidate,
    ) -> Result<ContactFields>;
}

#[async_trait]
pub trait PresenceChecker: Send + Sync {
    fn name(&self) -> &str;

    /// Whether `modality` independently confirms the candidate. `Ok(false)`
    /// and errors both mean "not corroborated".
    async fn check_presence(
        &self,
        query: PresenceQuery<'_>,
        modality: CorroborationSource,
    ) -> Result<bool>;
}
