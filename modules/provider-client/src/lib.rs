pub mod error;
pub mod types;

pub use error::{ProviderError, Result};
pub use types::{
    CompanyProfile, ContactEnrichInput, ContactHit, ExecutiveHit, ExecutiveSearchInput,
    ExecutiveSearchResult, PresenceCheckInput, PresenceCheckResult, ResolveCompanyInput,
};

use serde::de::DeserializeOwned;
use serde::Serialize;
use types::ApiResponse;

/// Client for a JSON data-provider API. One instance per configured
/// provider; `name` is the tag recorded on everything it returns.
pub struct ProviderClient {
    client: reqwest::Client,
    name: String,
    base_url: String,
    token: String,
}

impl ProviderClient {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>, token: String) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: reqwest::Client::new(),
            name: name.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolve a domain or company name to a company profile.
    pub async fn resolve_company(&self, token: &str) -> Result<CompanyProfile> {
        tracing::debug!(provider = %self.name, token, "Resolving company");
        let input = ResolveCompanyInput {
            token: token.to_string(),
        };
        self.post("companies/resolve", &input).await
    }

    /// Search for the executive holding a role. `Ok(None)` means the provider
    /// answered but has nobody for the role.
    pub async fn find_executive(&self, input: &ExecutiveSearchInput) -> Result<Option<ExecutiveHit>> {
        tracing::debug!(
            provider = %self.name,
            company = %input.company,
            role = %input.role,
            "Searching executive"
        );
        let result: ExecutiveSearchResult = self.post("executives/search", input).await?;
        Ok(result.executive)
    }

    /// Fetch contact fields for a named person.
    pub async fn enrich_contact(&self, input: &ContactEnrichInput) -> Result<ContactHit> {
        tracing::debug!(provider = %self.name, name = %input.name, "Enriching contact");
        self.post("contacts/enrich", input).await
    }

    /// Ask whether an independent source confirms the person in the role.
    pub async fn check_presence(&self, input: &PresenceCheckInput) -> Result<bool> {
        tracing::debug!(
            provider = %self.name,
            name = %input.name,
            modality = %input.modality,
            "Checking presence"
        );
        let result: PresenceCheckResult = self.post("presence/check", input).await?;
        Ok(result.present)
    }

    async fn post<I: Serialize, T: DeserializeOwned>(&self, path: &str, input: &I) -> Result<T> {
        let url = format!("{}/{}", self.base_url, path);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(input)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status.as_u16(), body));
        }

        let body = resp.text().await?;
        let api_resp: ApiResponse<T> = serde_json::from_str(&body)?;
        Ok(api_resp.data)
    }
}
