use std::sync::LazyLock;

use regex::Regex;

use leadsignal_common::{CompanyContext, CompanyRecord, EmployeeBucket};

static CONSULTING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:consult\w*|advisory|professional\s+services|accounting\s+firm|law\s+firm)\b")
        .unwrap()
});
static STARTUP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:start-?ups?|seed[- ]stage|venture[- ]backed)\b").unwrap());

/// Extra multiplier on fallback assignments at enterprise-scale companies,
/// compounded with the enterprise context factor.
pub const ENTERPRISE_SCALE_PENALTY: f64 = 0.85;

/// Classify a company from its industry text and size/public signals.
/// Consulting wins over size; public or 1,000+ employees is enterprise;
/// up to 200 employees (or startup language) is startup.
pub fn classify_context(company: &CompanyRecord) -> CompanyContext {
    let industry = company.industry.as_deref().unwrap_or("");

    if CONSULTING_RE.is_match(industry) {
        return CompanyContext::Consulting;
    }
    if company.is_public == Some(true)
        || matches!(company.employees, Some(b) if b >= EmployeeBucket::Large)
    {
        return CompanyContext::Enterprise;
    }
    if STARTUP_RE.is_match(industry)
        || matches!(company.employees, Some(b) if b <= EmployeeBucket::Medium)
    {
        return CompanyContext::Startup;
    }
    CompanyContext::General
}

/// Multiplier applied to fallback assignments. Enterprises are expected to
/// have a dedicated title-holder; startups commonly don't.
pub fn fallback_factor(context: CompanyContext) -> f64 {
    match context {
        CompanyContext::Startup => 0.95,
        CompanyContext::General => 0.85,
        CompanyContext::Consulting => 0.80,
        CompanyContext::Enterprise => 0.70,
    }
}

/// Enterprise context backed by an actual headcount of 1,000+.
pub fn is_enterprise_scale(context: CompanyContext, company: &CompanyRecord) -> bool {
    context == CompanyContext::Enterprise
        && matches!(company.employees, Some(b) if b >= EmployeeBucket::Large)
}
