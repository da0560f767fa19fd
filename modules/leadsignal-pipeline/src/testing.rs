// Test mocks for the pipeline.
//
// One mock per provider trait, plus a processor mock for the orchestrator:
// - MockResolver (IdentityResolver): HashMap-based token→identity
// - MockLeadership (LeadershipProvider): HashMap-based role→executive
// - MockContacts (ContactProvider): fixed contact fields, counts calls
// - MockPresence (PresenceChecker): confirms a fixed set of modalities
// - MockProcessor (CompanyProcessor): records start times, injects failures
//
// Every mock can be told to hang, so deadline handling is testable without
// real network calls.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use async_trait::async_trait;

use leadsignal_common::{
    CompanyInput, CompanyRecord, CorroborationSource, ExecutiveCandidate, ProcessingResult, Role,
};

use crate::pipeline::CompanyProcessor;
use crate::traits::{
    CompanyIdentity, ContactFields, ContactProvider, ExecutiveMatch, IdentityResolver,
    LeadershipProvider, PresenceChecker, PresenceQuery,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Behavior {
    Answer,
    Fail,
    Hang,
    Panic,
}

async fn hang<T>() -> T {
    std::future::pending().await
}

// ---------------------------------------------------------------------------
// MockResolver
// ---------------------------------------------------------------------------

/// Returns `Err` for unregistered tokens.
pub struct MockResolver {
    identities: HashMap<String, CompanyIdentity>,
    behavior: Behavior,
}

impl MockResolver {
    pub fn new() -> Self {
        Self {
            identities: HashMap::new(),
            behavior: Behavior::Answer,
        }
    }

    pub fn on_resolve(mut self, token: &str, identity: CompanyIdentity) -> Self {
        self.identities.insert(token.to_string(), identity);
        self
    }

    pub fn hanging(mut self) -> Self {
        self.behavior = Behavior::Hang;
        self
    }
}

impl Default for MockResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityResolver for MockResolver {
    fn name(&self) -> &str {
        "mock-resolver"
    }

    async fn resolve(&self, token: &str) -> Result<CompanyIdentity> {
        if self.behavior == Behavior::Hang {
            return hang().await;
        }
        self.identities
            .get(token)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("MockResolver: no identity registered for {token}"))
    }
}

// ---------------------------------------------------------------------------
// MockLeadership
// ---------------------------------------------------------------------------

/// Returns `Ok(None)` for unregistered roles.
pub struct MockLeadership {
    name: String,
    matches: HashMap<Role, ExecutiveMatch>,
    broken: HashSet<String>,
    behavior: Behavior,
    calls: AtomicUsize,
}

impl MockLeadership {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            matches: HashMap::new(),
            broken: HashSet::new(),
            behavior: Behavior::Answer,
            calls: AtomicUsize::new(0),
        }
    }

    /// Fail every lookup for one company token.
    pub fn failing_for(mut self, token: &str) -> Self {
        self.broken.insert(token.to_string());
        self
    }

    pub fn on_role(mut self, role: Role, found: ExecutiveMatch) -> Self {
        self.matches.insert(role, found);
        self
    }

    pub fn failing(mut self) -> Self {
        self.behavior = Behavior::Fail;
        self
    }

    pub fn hanging(mut self) -> Self {
        self.behavior = Behavior::Hang;
        self
    }

    pub fn panicking(mut self) -> Self {
        self.behavior = Behavior::Panic;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LeadershipProvider for MockLeadership {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find_executive(&self, company: &CompanyRecord, role: Role) -> Result<Option<ExecutiveMatch>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.broken.contains(&company.token) {
            bail!("MockLeadership {}: {} is unavailable", self.name, company.token);
        }
        match self.behavior {
            Behavior::Answer => Ok(self.matches.get(&role).cloned()),
            Behavior::Fail => bail!("MockLeadership {}: upstream error for {}", self.name, company.token),
            Behavior::Hang => hang().await,
            Behavior::Panic => panic!("MockLeadership {} blew up", self.name),
        }
    }
}

// ---------------------------------------------------------------------------
// MockContacts
// ---------------------------------------------------------------------------

/// Returns the same fields for every candidate (empty by default).
pub struct MockContacts {
    name: String,
    fields: ContactFields,
    behavior: Behavior,
    calls: AtomicUsize,
}

impl MockContacts {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fields: ContactFields::default(),
            behavior: Behavior::Answer,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn returning(mut self, fields: ContactFields) -> Self {
        self.fields = fields;
        self
    }

    pub fn failing(mut self) -> Self {
        self.behavior = Behavior::Fail;
        self
    }

    pub fn hanging(mut self) -> Self {
        self.behavior = Behavior::Hang;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContactProvider for MockContacts {
    fn name(&self) -> &str {
        &self.name
    }

    async fn enrich_contact(&self, _company: &CompanyRecord, candidate: &ExecutiveCandidate) -> Result<ContactFields> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Behavior::Answer => Ok(self.fields.clone()),
            Behavior::Fail => bail!("MockContacts {}: no record for {}", self.name, candidate.name),
            Behavior::Hang => hang().await,
            Behavior::Panic => panic!("MockContacts {} blew up", self.name),
        }
    }
}

// ---------------------------------------------------------------------------
// MockPresence
// ---------------------------------------------------------------------------

/// Confirms every candidate for a fixed set of modalities.
pub struct MockPresence {
    confirms: HashSet<CorroborationSource>,
    behavior: Behavior,
    calls: AtomicUsize,
}

impl MockPresence {
    pub fn confirming(modalities: &[CorroborationSource]) -> Self {
        Self {
            confirms: modalities.iter().copied().collect(),
            behavior: Behavior::Answer,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn hanging() -> Self {
        Self {
            confirms: HashSet::new(),
            behavior: Behavior::Hang,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PresenceChecker for MockPresence {
    fn name(&self) -> &str {
        "mock-presence"
    }

    async fn check_presence(&self, _query: PresenceQuery<'_>, modality: CorroborationSource) -> Result<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Behavior::Answer => Ok(self.confirms.contains(&modality)),
            Behavior::Fail => bail!("MockPresence: {modality} unavailable"),
            Behavior::Hang => hang().await,
            Behavior::Panic => panic!("MockPresence blew up"),
        }
    }
}

// ---------------------------------------------------------------------------
// MockProcessor
// ---------------------------------------------------------------------------

/// Stand-in for a whole company pipeline. Sleeps `work`, then returns a
/// successful result unless the token was marked failing or panicking.
pub struct MockProcessor {
    work: Duration,
    failing: HashSet<String>,
    panicking: HashSet<String>,
    starts: Mutex<Vec<(usize, Instant)>>,
}

impl MockProcessor {
    pub fn new(work: Duration) -> Self {
        Self {
            work,
            failing: HashSet::new(),
            panicking: HashSet::new(),
            starts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_on(mut self, token: &str) -> Self {
        self.failing.insert(token.to_string());
        self
    }

    pub fn panicking_on(mut self, token: &str) -> Self {
        self.panicking.insert(token.to_string());
        self
    }

    /// Start instant per submitted index, ordered by index.
    pub fn starts(&self) -> Vec<(usize, Instant)> {
        let mut starts = self.starts.lock().unwrap().clone();
        starts.sort_by_key(|(index, _)| *index);
        starts
    }
}

#[async_trait]
impl CompanyProcessor for MockProcessor {
    async fn process(&self, index: usize, input: &CompanyInput) -> Result<ProcessingResult> {
        self.starts.lock().unwrap().push((index, Instant::now()));
        tokio::time::sleep(self.work).await;

        if self.panicking.contains(&input.token) {
            panic!("MockProcessor: {} exploded", input.token);
        }
        if self.failing.contains(&input.token) {
            bail!("MockProcessor: {} failed", input.token);
        }
        Ok(successful_result(index, input))
    }
}

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

/// Candidate with a default raw confidence of 80.
pub fn candidate(name: &str, title: Option<&str>) -> ExecutiveCandidate {
    candidate_with_confidence(name, title, 80)
}

pub fn candidate_with_confidence(name: &str, title: Option<&str>, raw_confidence: u8) -> ExecutiveCandidate {
    ExecutiveCandidate {
        name: name.to_string(),
        title: title.map(str::to_string),
        provider: "mock".to_string(),
        raw_confidence,
    }
}

/// Result with a filled finance role and no errors.
pub fn successful_result(index: usize, input: &CompanyInput) -> ProcessingResult {
    let company = CompanyRecord::from_defaults(&input.token, &input.defaults);
    let finance = crate::verification::score(
        Some(&candidate("Pat Lee", Some("CFO"))),
        Role::FinanceLeader,
        &company,
        &[],
    );
    let mut result = ProcessingResult::degraded(
        index,
        input,
        leadsignal_common::ErrorKind::ProviderError,
        "",
        0,
    );
    result.overall_confidence = leadsignal_common::overall_confidence(&finance, &result.revenue);
    result.finance = finance;
    result.success = true;
    result.error = None;
    result.error_message = None;
    result
}
