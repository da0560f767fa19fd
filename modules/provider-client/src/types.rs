use serde::{Deserialize, Serialize};

// --- Company resolution ---

/// Input for `POST /companies/resolve`.
#[derive(Debug, Clone, Serialize)]
pub struct ResolveCompanyInput {
    /// Domain or company name.
    pub token: String,
}

/// Company identity as returned by the provider. Every field is optional;
/// providers routinely omit what they don't know.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanyProfile {
    pub name: Option<String>,
    pub industry: Option<String>,
    #[serde(rename = "isPublic")]
    pub is_public: Option<bool>,
    #[serde(rename = "employeeCount")]
    pub employee_count: Option<u32>,
    pub headquarters: Option<String>,
}

// --- Executive search ---

/// Input for `POST /executives/search`.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutiveSearchInput {
    pub company: String,
    pub domain: String,
    /// "finance_leader" or "revenue_leader".
    pub role: String,
}

/// A single executive hit.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutiveHit {
    pub name: Option<String>,
    pub title: Option<String>,
    /// Provider's own confidence, 0-100.
    pub confidence: Option<f64>,
}

/// Body of an executive search response. `executive` is null when the
/// provider has no one for the role.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutiveSearchResult {
    pub executive: Option<ExecutiveHit>,
}

// --- Contact enrichment ---

/// Input for `POST /contacts/enrich`.
#[derive(Debug, Clone, Serialize)]
pub struct ContactEnrichInput {
    pub name: String,
    pub title: Option<String>,
    pub company: String,
    pub domain: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactHit {
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(rename = "linkedinUrl")]
    pub linkedin_url: Option<String>,
}

// --- Presence checks ---

/// Input for `POST /presence/check`.
#[derive(Debug, Clone, Serialize)]
pub struct PresenceCheckInput {
    pub name: String,
    pub title: Option<String>,
    pub company: String,
    pub domain: String,
    /// "profile", "leadership_page" or "press".
    pub modality: String,
    #[serde(rename = "linkedinUrl", skip_serializing_if = "Option::is_none")]
    pub linkedin_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PresenceCheckResult {
    pub present: bool,
}

/// Envelope used by every endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}
