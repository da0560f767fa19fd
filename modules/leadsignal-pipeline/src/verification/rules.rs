//! Ordered title rule tables, one per target role.
//!
//! Each table is a list of (pattern, class) entries checked top to bottom;
//! the first matching pattern decides. Titles matching nothing are
//! `unrelated`; a missing title is `no_title`.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use leadsignal_common::{Authenticity, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleClass {
    /// Canonical title for the role.
    Authentic,
    /// Adjacent or overloaded title standing in for the role.
    Fallback,
}

impl TitleClass {
    fn authenticity(&self) -> Authenticity {
        match self {
            TitleClass::Authentic => Authenticity::Authentic,
            TitleClass::Fallback => Authenticity::Fallback,
        }
    }
}

#[derive(Debug)]
pub struct TitleRule {
    pattern: Regex,
    class: TitleClass,
    label: &'static str,
}

/// Outcome of classifying one title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TitleMatch {
    pub authenticity: Authenticity,
    /// Label of the rule that matched.
    pub rule: Option<&'static str>,
}

#[derive(Debug)]
pub struct RuleTable {
    rules: Vec<TitleRule>,
}

impl RuleTable {
    pub fn new(entries: &[(&str, TitleClass, &'static str)]) -> Result<Self, regex::Error> {
        let rules = entries
            .iter()
            .map(|(pattern, class, label)| {
                Ok::<_, regex::Error>(TitleRule {
                    pattern: RegexBuilder::new(pattern).case_insensitive(true).build()?,
                    class: *class,
                    label: *label,
                })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self { rules })
    }

    pub fn classify(&self, title: Option<&str>) -> TitleMatch {
        let Some(title) = title.map(str::trim).filter(|t| !t.is_empty()) else {
            return TitleMatch {
                authenticity: Authenticity::NoTitle,
                rule: None,
            };
        };

        self.rules
            .iter()
            .find(|rule| rule.pattern.is_match(title))
            .map(|rule| TitleMatch {
                authenticity: rule.class.authenticity(),
                rule: Some(rule.label),
            })
            .unwrap_or(TitleMatch {
                authenticity: Authenticity::Unrelated,
                rule: None,
            })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

const FINANCE_TABLE: &[(&str, TitleClass, &str)] = &[
    (r"\bcfo\b", TitleClass::Authentic, "CFO"),
    (r"\bchief\s+financ(?:e|ial)\s+officer\b", TitleClass::Authentic, "Chief Financial Officer"),
    (r"\b(?:svp|evp|vp|vice\s+president)\b.*\bfinance\b", TitleClass::Authentic, "VP Finance"),
    (r"\bhead\s+of\s+finance\b", TitleClass::Authentic, "Head of Finance"),
    (r"\bfinanc(?:e|ial)\s+director\b|\bdirector\s+of\s+finance\b", TitleClass::Authentic, "Finance Director"),
    (r"\bceo\b|\bchief\s+executive\s+officer\b", TitleClass::Fallback, "Chief Executive Officer"),
    (r"\b(?:co-?)?founder\b", TitleClass::Fallback, "Founder"),
    (r"^president\b", TitleClass::Fallback, "President"),
    (r"\bcoo\b|\bchief\s+operating\s+officer\b", TitleClass::Fallback, "Chief Operating Officer"),
    (r"\bc(?:on|omp)troller\b", TitleClass::Fallback, "Controller"),
    (r"\btreasurer\b", TitleClass::Fallback, "Treasurer"),
    (r"\bowner\b|\bmanaging\s+(?:director|partner)\b|\bgeneral\s+manager\b", TitleClass::Fallback, "Owner / Managing Director"),
];

const REVENUE_TABLE: &[(&str, TitleClass, &str)] = &[
    (r"\bcro\b", TitleClass::Authentic, "CRO"),
    (r"\bchief\s+revenue\s+officer\b", TitleClass::Authentic, "Chief Revenue Officer"),
    (r"\bchief\s+(?:sales|commercial)\s+officer\b", TitleClass::Authentic, "Chief Sales Officer"),
    (r"\b(?:svp|evp|vp|vice\s+president)\b.*\b(?:sales|revenue)\b", TitleClass::Authentic, "VP Sales"),
    (r"\bhead\s+of\s+(?:global\s+)?(?:sales|revenue)\b", TitleClass::Authentic, "Head of Sales"),
    (r"\b(?:sales|revenue)\s+director\b|\bdirector\s+of\s+(?:sales|revenue)\b", TitleClass::Authentic, "Sales Director"),
    (r"\bceo\b|\bchief\s+executive\s+officer\b", TitleClass::Fallback, "Chief Executive Officer"),
    (r"\b(?:co-?)?founder\b", TitleClass::Fallback, "Founder"),
    (r"^president\b", TitleClass::Fallback, "President"),
    (r"\bcmo\b|\bchief\s+marketing\s+officer\b", TitleClass::Fallback, "Chief Marketing Officer"),
    (r"\bchief\s+(?:growth|business)\s+officer\b", TitleClass::Fallback, "Chief Growth Officer"),
    (r"\bcoo\b|\bchief\s+operating\s+officer\b", TitleClass::Fallback, "Chief Operating Officer"),
    (r"\bbusiness\s+development\b", TitleClass::Fallback, "Business Development"),
    (r"\bowner\b|\bmanaging\s+(?:director|partner)\b|\bgeneral\s+manager\b", TitleClass::Fallback, "Owner / Managing Director"),
];

static FINANCE_RULES: LazyLock<RuleTable> =
    LazyLock::new(|| RuleTable::new(FINANCE_TABLE).expect("valid finance title rules"));
static REVENUE_RULES: LazyLock<RuleTable> =
    LazyLock::new(|| RuleTable::new(REVENUE_TABLE).expect("valid revenue title rules"));

pub fn rules_for(role: Role) -> &'static RuleTable {
    match role {
        Role::FinanceLeader => &FINANCE_RULES,
        Role::RevenueLeader => &REVENUE_RULES,
    }
}
