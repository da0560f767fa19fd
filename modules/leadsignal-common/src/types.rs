use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, LeadSignalError, StageFailure};

/// Confidence bounds for every adjusted confidence the pipeline emits.
pub const MIN_CONFIDENCE: u8 = 20;
pub const MAX_CONFIDENCE: u8 = 98;

/// Round and clamp a working confidence into [MIN_CONFIDENCE, MAX_CONFIDENCE].
pub fn clamp_confidence(value: f64) -> u8 {
    if value.is_nan() {
        return MIN_CONFIDENCE;
    }
    value
        .round()
        .clamp(MIN_CONFIDENCE as f64, MAX_CONFIDENCE as f64) as u8
}

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    FinanceLeader,
    RevenueLeader,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::FinanceLeader, Role::RevenueLeader];

    /// Wire tag used with providers.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::FinanceLeader => "finance_leader",
            Role::RevenueLeader => "revenue_leader",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::FinanceLeader => "finance leader",
            Role::RevenueLeader => "revenue leader",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Company input
// ---------------------------------------------------------------------------

/// Values the caller already knows about a company. Used when the identity
/// resolver has nothing better.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyDefaults {
    pub name: Option<String>,
    pub industry: Option<String>,
    pub is_public: Option<bool>,
    pub employee_count: Option<u32>,
    pub headquarters: Option<String>,
}

/// Batch payload shape for one company.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyPayload {
    #[serde(alias = "website")]
    pub domain: String,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub account_owner: Option<String>,
}

/// One company submitted to the pipeline.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "CompanyPayload")]
pub struct CompanyInput {
    /// Normalized identifying token: a bare host like `stripe.com`, or the
    /// trimmed company name when the input isn't a domain.
    pub token: String,
    pub defaults: CompanyDefaults,
    pub account_owner: Option<String>,
}

impl CompanyInput {
    pub fn new(token: &str) -> Self {
        let token = normalize_token(token);
        let name = default_name(&token);
        Self {
            token,
            defaults: CompanyDefaults {
                name: Some(name),
                ..Default::default()
            },
            account_owner: None,
        }
    }

    pub fn with_defaults(mut self, defaults: CompanyDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_account_owner(mut self, owner: impl Into<String>) -> Self {
        self.account_owner = Some(owner.into());
        self
    }
}

impl TryFrom<CompanyPayload> for CompanyInput {
    type Error = LeadSignalError;

    fn try_from(payload: CompanyPayload) -> Result<Self, Self::Error> {
        if payload.domain.trim().is_empty() {
            return Err(LeadSignalError::Input("company domain is empty".to_string()));
        }
        let mut input = CompanyInput::new(&payload.domain);
        if let Some(name) = non_blank(payload.company_name) {
            input.defaults.name = Some(name);
        }
        input.account_owner = non_blank(payload.account_owner);
        Ok(input)
    }
}

/// Lowercased host without scheme, `www.` or path. Inputs that don't look
/// like a host (contain whitespace, no dot) are returned trimmed as-is.
pub fn normalize_token(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.contains(char::is_whitespace) || !trimmed.contains('.') {
        return trimmed.to_string();
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    match url::Url::parse(&with_scheme) {
        Ok(parsed) => match parsed.host_str() {
            Some(host) => {
                let host = host.to_lowercase();
                host.strip_prefix("www.").unwrap_or(&host).to_string()
            }
            None => trimmed.to_string(),
        },
        Err(_) => trimmed.to_string(),
    }
}

/// Default display name for a token: the first host label, title-cased
/// (`stripe.com` → `Stripe`). Non-domain tokens are already names.
pub fn default_name(token: &str) -> String {
    if token.contains(char::is_whitespace) || !token.contains('.') {
        return token.to_string();
    }
    let label = token.split('.').next().unwrap_or(token);
    title_case(label)
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut boundary = true;
    for c in s.chars() {
        if c.is_alphabetic() {
            if boundary {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            boundary = false;
        } else {
            out.push(c);
            boundary = true;
        }
    }
    out
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// Company record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeBucket {
    /// 1-10
    Micro,
    /// 11-50
    Small,
    /// 51-200
    Medium,
    /// 201-1,000
    MidMarket,
    /// 1,001-10,000
    Large,
    /// 10,001+
    Enterprise,
}

impl EmployeeBucket {
    pub fn from_count(count: u32) -> Self {
        match count {
            0..=10 => EmployeeBucket::Micro,
            11..=50 => EmployeeBucket::Small,
            51..=200 => EmployeeBucket::Medium,
            201..=1_000 => EmployeeBucket::MidMarket,
            1_001..=10_000 => EmployeeBucket::Large,
            _ => EmployeeBucket::Enterprise,
        }
    }
}

/// Canonical company identity. Built once by resolution, read-only after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub token: String,
    pub name: Option<String>,
    pub industry: Option<String>,
    pub is_public: Option<bool>,
    pub employees: Option<EmployeeBucket>,
    pub headquarters: Option<String>,
}

impl CompanyRecord {
    pub fn from_defaults(token: &str, defaults: &CompanyDefaults) -> Self {
        Self {
            token: token.to_string(),
            name: defaults.name.clone(),
            industry: defaults.industry.clone(),
            is_public: defaults.is_public,
            employees: defaults.employee_count.map(EmployeeBucket::from_count),
            headquarters: defaults.headquarters.clone(),
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.token)
    }

    /// The token when it is a host name.
    pub fn domain(&self) -> Option<&str> {
        if self.token.contains('.') && !self.token.contains(char::is_whitespace) {
            Some(&self.token)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Candidates and contacts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutiveCandidate {
    pub name: String,
    pub title: Option<String>,
    /// Provider that returned this candidate.
    pub provider: String,
    /// Provider confidence before any adjustment, 0-100.
    pub raw_confidence: u8,
}

/// A contact value and the provider it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactField {
    pub value: String,
    pub provider: String,
}

/// Contact data for one candidate. Missing fields stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub email: Option<ContactField>,
    pub phone: Option<ContactField>,
    /// Professional-network profile handle or URL.
    pub handle: Option<ContactField>,
}

impl ContactRecord {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.phone.is_none() && self.handle.is_none()
    }

    pub fn found_count(&self) -> u32 {
        self.email.is_some() as u32 + self.phone.is_some() as u32 + self.handle.is_some() as u32
    }
}

// ---------------------------------------------------------------------------
// Verification output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Authenticity {
    Authentic,
    Fallback,
    Unrelated,
    NoTitle,
}

impl fmt::Display for Authenticity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Authenticity::Authentic => "authentic",
            Authenticity::Fallback => "fallback",
            Authenticity::Unrelated => "unrelated",
            Authenticity::NoTitle => "no_title",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanyContext {
    Consulting,
    Startup,
    Enterprise,
    General,
}

impl fmt::Display for CompanyContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompanyContext::Consulting => "consulting",
            CompanyContext::Startup => "startup",
            CompanyContext::Enterprise => "enterprise",
            CompanyContext::General => "general",
        };
        f.write_str(s)
    }
}

/// Independent confirmation modalities, declared from highest to lowest weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorroborationSource {
    Profile,
    LeadershipPage,
    Press,
}

impl CorroborationSource {
    pub const ALL: [CorroborationSource; 3] = [
        CorroborationSource::Profile,
        CorroborationSource::LeadershipPage,
        CorroborationSource::Press,
    ];

    /// Additive confidence boost when this source confirms a candidate.
    pub fn boost(&self) -> f64 {
        match self {
            CorroborationSource::Profile => 8.0,
            CorroborationSource::LeadershipPage => 5.0,
            CorroborationSource::Press => 3.0,
        }
    }

    /// Wire tag used with providers.
    pub fn as_str(&self) -> &'static str {
        match self {
            CorroborationSource::Profile => "profile",
            CorroborationSource::LeadershipPage => "leadership_page",
            CorroborationSource::Press => "press",
        }
    }
}

impl fmt::Display for CorroborationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CorroborationSource::Profile => "professional profile match",
            CorroborationSource::LeadershipPage => "company leadership page",
            CorroborationSource::Press => "press mention",
        };
        f.write_str(s)
    }
}

/// Final verdict for one role at one company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub role: Role,
    pub candidate: Option<ExecutiveCandidate>,
    /// Candidate's raw confidence (0 when there is no candidate).
    pub original_confidence: u8,
    /// Always within [MIN_CONFIDENCE, MAX_CONFIDENCE].
    pub adjusted_confidence: u8,
    pub authenticity: Authenticity,
    pub context: CompanyContext,
    /// Every source that confirmed the candidate, highest weight first.
    pub corroborations: Vec<CorroborationSource>,
    /// Highest-weight confirming source, if any.
    pub method: Option<CorroborationSource>,
    /// Ordered, human-readable audit trail.
    pub reasons: Vec<String>,
}

impl RoleAssignment {
    /// Assignment for a role nobody was found for.
    pub fn vacant(role: Role, context: CompanyContext) -> Self {
        Self {
            role,
            candidate: None,
            original_confidence: 0,
            adjusted_confidence: MIN_CONFIDENCE,
            authenticity: Authenticity::NoTitle,
            context,
            corroborations: Vec::new(),
            method: None,
            reasons: vec![format!("No candidate discovered for {role}")],
        }
    }

    pub fn is_filled(&self) -> bool {
        self.candidate.is_some()
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Exactly one per submitted company, in submission order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingResult {
    /// Position in the submitted batch.
    pub index: usize,
    pub token: String,
    pub account_owner: Option<String>,
    pub company: CompanyRecord,
    pub finance: RoleAssignment,
    pub revenue: RoleAssignment,
    pub finance_contact: ContactRecord,
    pub revenue_contact: ContactRecord,
    pub processing_time_ms: u64,
    /// Mean of the two adjusted confidences.
    pub overall_confidence: u8,
    pub success: bool,
    /// First failure that degraded this result.
    pub error: Option<ErrorKind>,
    pub error_message: Option<String>,
    /// Every fallback substituted while processing this company.
    pub failures: Vec<StageFailure>,
}

impl ProcessingResult {
    /// Result for a company whose pipeline never produced one.
    pub fn degraded(
        index: usize,
        input: &CompanyInput,
        kind: ErrorKind,
        message: impl Into<String>,
        processing_time_ms: u64,
    ) -> Self {
        let finance = RoleAssignment::vacant(Role::FinanceLeader, CompanyContext::General);
        let revenue = RoleAssignment::vacant(Role::RevenueLeader, CompanyContext::General);
        let overall_confidence = overall_confidence(&finance, &revenue);
        Self {
            index,
            token: input.token.clone(),
            account_owner: input.account_owner.clone(),
            company: CompanyRecord::from_defaults(&input.token, &input.defaults),
            finance,
            revenue,
            finance_contact: ContactRecord::default(),
            revenue_contact: ContactRecord::default(),
            processing_time_ms,
            overall_confidence,
            success: false,
            error: Some(kind),
            error_message: Some(message.into()),
            failures: Vec::new(),
        }
    }

    pub fn assignment(&self, role: Role) -> &RoleAssignment {
        match role {
            Role::FinanceLeader => &self.finance,
            Role::RevenueLeader => &self.revenue,
        }
    }

    pub fn contact(&self, role: Role) -> &ContactRecord {
        match role {
            Role::FinanceLeader => &self.finance_contact,
            Role::RevenueLeader => &self.revenue_contact,
        }
    }
}

/// Mean of two adjusted confidences, rounded.
pub fn overall_confidence(finance: &RoleAssignment, revenue: &RoleAssignment) -> u8 {
    let sum = finance.adjusted_confidence as f64 + revenue.adjusted_confidence as f64;
    clamp_confidence(sum / 2.0)
}

/// One orchestrator invocation's worth of work.
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub companies: Vec<CompanyInput>,
    pub concurrency_limit: usize,
    pub pacing_delay: Duration,
}

impl BatchJob {
    pub fn new(companies: Vec<CompanyInput>, concurrency_limit: usize, pacing_delay: Duration) -> Self {
        Self {
            companies,
            concurrency_limit: concurrency_limit.max(1),
            pacing_delay,
        }
    }

    pub fn chunk_count(&self) -> usize {
        self.companies.len().div_ceil(self.concurrency_limit.max(1))
    }
}
