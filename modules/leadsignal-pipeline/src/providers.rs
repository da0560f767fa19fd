//! HTTP-backed provider implementations and wiring from configuration.

use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;

use leadsignal_common::{CompanyRecord, Config, CorroborationSource, ExecutiveCandidate, Role};
use provider_client::types::{ContactEnrichInput, ExecutiveSearchInput, PresenceCheckInput};
use provider_client::ProviderClient;

use crate::pipeline::PipelineDeps;
use crate::traits::{
    CompanyIdentity, ContactFields, ContactProvider, ExecutiveMatch, IdentityResolver,
    LeadershipProvider, PresenceChecker, PresenceQuery,
};

fn domain_of(company: &CompanyRecord) -> String {
    company.domain().unwrap_or(company.token.as_str()).to_string()
}

#[async_trait]
impl IdentityResolver for ProviderClient {
    fn name(&self) -> &str {
        ProviderClient::name(self)
    }

    async fn resolve(&self, token: &str) -> Result<CompanyIdentity> {
        let profile = self.resolve_company(token).await?;
        Ok(CompanyIdentity {
            name: profile.name,
            industry: profile.industry,
            is_public: profile.is_public,
            employee_count: profile.employee_count,
            headquarters: profile.headquarters,
        })
    }
}

#[async_trait]
impl LeadershipProvider for ProviderClient {
    fn name(&self) -> &str {
        ProviderClient::name(self)
    }

    async fn find_executive(&self, company: &CompanyRecord, role: Role) -> Result<Option<ExecutiveMatch>> {
        let input = ExecutiveSearchInput {
            company: company.display_name().to_string(),
            domain: domain_of(company),
            role: role.as_str().to_string(),
        };
        let hit = ProviderClient::find_executive(self, &input).await?;
        Ok(hit.map(|hit| ExecutiveMatch {
            name: hit.name,
            title: hit.title,
            raw_confidence: hit.confidence,
        }))
    }
}

#[async_trait]
impl ContactProvider for ProviderClient {
    fn name(&self) -> &str {
        ProviderClient::name(self)
    }

    async fn enrich_contact(&self, company: &CompanyRecord, candidate: &ExecutiveCandidate) -> Result<ContactFields> {
        let input = ContactEnrichInput {
            name: candidate.name.clone(),
            title: candidate.title.clone(),
            company: company.display_name().to_string(),
            domain: domain_of(company),
        };
        let hit = ProviderClient::enrich_contact(self, &input).await?;
        Ok(ContactFields {
            email: hit.email,
            phone: hit.phone,
            handle: hit.linkedin_url,
        })
    }
}

#[async_trait]
impl PresenceChecker for ProviderClient {
    fn name(&self) -> &str {
        ProviderClient::name(self)
    }

    async fn check_presence(&self, query: PresenceQuery<'_>, modality: CorroborationSource) -> Result<bool> {
        let input = PresenceCheckInput {
            name: query.candidate.name.clone(),
            title: query.candidate.title.clone(),
            company: query.company.display_name().to_string(),
            domain: domain_of(query.company),
            modality: modality.as_str().to_string(),
            linkedin_url: query.handle.map(str::to_string),
        };
        Ok(ProviderClient::check_presence(self, &input).await?)
    }
}

/// Build pipeline deps from configuration. The first configured provider
/// resolves identities. Every provider serves discovery and enrichment in
/// declaration order, and backs each presence modality in the same order:
/// a later provider is asked only when the earlier ones did not confirm.
pub fn deps_from_config(config: &Config) -> Result<PipelineDeps> {
    let clients: Vec<Arc<ProviderClient>> = config
        .providers
        .iter()
        .map(|p| Arc::new(ProviderClient::new(p.name.clone(), p.base_url.clone(), p.api_key.clone())))
        .collect();
    let Some(primary) = clients.first().cloned() else {
        bail!("no providers configured");
    };

    let leadership: Vec<Arc<dyn LeadershipProvider>> = clients
        .iter()
        .map(|c| Arc::clone(c) as Arc<dyn LeadershipProvider>)
        .collect();
    let contacts: Vec<Arc<dyn ContactProvider>> = clients
        .iter()
        .map(|c| Arc::clone(c) as Arc<dyn ContactProvider>)
        .collect();
    let presence: Vec<(CorroborationSource, Arc<dyn PresenceChecker>)> = CorroborationSource::ALL
        .iter()
        .flat_map(|modality| {
            clients
                .iter()
                .map(move |c| (*modality, Arc::clone(c) as Arc<dyn PresenceChecker>))
        })
        .collect();

    Ok(PipelineDeps::builder()
        .resolver(primary as Arc<dyn IdentityResolver>)
        .leadership(leadership)
        .contacts(contacts)
        .presence(presence)
        .config(config.pipeline.clone())
        .build())
}
