use std::sync::Arc;

use tracing::{debug, info, warn};

use leadsignal_common::{
    CompanyRecord, ContactField, ContactRecord, ExecutiveCandidate, Stage, StageFailure,
};

use crate::stage::StageRunner;
use crate::traits::{ContactFields, ContactProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactFieldKind {
    Email,
    Phone,
    Handle,
}

impl ContactFieldKind {
    pub const ALL: [ContactFieldKind; 3] = [
        ContactFieldKind::Email,
        ContactFieldKind::Phone,
        ContactFieldKind::Handle,
    ];

    fn pick(&self, fields: &ContactFields) -> Option<String> {
        let raw = match self {
            ContactFieldKind::Email => fields.email.as_deref(),
            ContactFieldKind::Phone => fields.phone.as_deref(),
            ContactFieldKind::Handle => fields.handle.as_deref(),
        };
        raw.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
    }
}

/// Contact record for one candidate plus provider failures along the way.
#[derive(Debug, Clone, Default)]
pub struct Enrichment {
    pub contact: ContactRecord,
    pub failures: Vec<StageFailure>,
}

/// Provider indices to consult for each field, in order.
#[derive(Debug, Clone)]
struct FieldPriority {
    email: Vec<usize>,
    phone: Vec<usize>,
    handle: Vec<usize>,
}

impl FieldPriority {
    fn get(&self, field: ContactFieldKind) -> &[usize] {
        match field {
            ContactFieldKind::Email => &self.email,
            ContactFieldKind::Phone => &self.phone,
            ContactFieldKind::Handle => &self.handle,
        }
    }

    fn set(&mut self, field: ContactFieldKind, order: Vec<usize>) {
        match field {
            ContactFieldKind::Email => self.email = order,
            ContactFieldKind::Phone => self.phone = order,
            ContactFieldKind::Handle => self.handle = order,
        }
    }
}

/// Adds contact fields to a discovered candidate.
pub struct EnrichmentStage {
    providers: Vec<Arc<dyn ContactProvider>>,
    priority: FieldPriority,
    runner: StageRunner,
}

impl EnrichmentStage {
    /// Every field consults providers in registration order.
    pub fn new(providers: Vec<Arc<dyn ContactProvider>>, runner: StageRunner) -> Self {
        let all: Vec<usize> = (0..providers.len()).collect();
        Self {
            providers,
            priority: FieldPriority {
                email: all.clone(),
                phone: all.clone(),
                handle: all,
            },
            runner,
        }
    }

    /// Override the provider order for one field. Unknown names are ignored.
    pub fn with_field_priority<S: AsRef<str>>(mut self, field: ContactFieldKind, order: &[S]) -> Self {
        let mut indices = Vec::new();
        for name in order.iter().map(AsRef::as_ref) {
            match self.providers.iter().position(|p| p.name() == name) {
                Some(idx) if !indices.contains(&idx) => indices.push(idx),
                Some(_) => {}
                None => warn!(provider = name, ?field, "Unknown contact provider in priority list"),
            }
        }
        self.priority.set(field, indices);
        self
    }

    /// For each field, the first non-empty value in that field's priority
    /// order wins. Each provider is queried at most once per call. No
    /// candidate means no queries and an empty record.
    pub async fn enrich(
        &self,
        company: &CompanyRecord,
        candidate: Option<&ExecutiveCandidate>,
    ) -> Enrichment {
        let Some(candidate) = candidate else {
            return Enrichment::default();
        };

        // None = not queried yet, Some(None) = queried and fell back.
        let mut responses: Vec<Option<Option<ContactFields>>> = vec![None; self.providers.len()];
        let mut failures = Vec::new();
        let mut contact = ContactRecord::default();

        for field in ContactFieldKind::ALL {
            for &idx in self.priority.get(field) {
                let provider = &self.providers[idx];
                if responses[idx].is_none() {
                    let outcome = self
                        .runner
                        .invoke(
                            Stage::Enrichment,
                            Some(provider.name()),
                            None,
                            async { provider.enrich_contact(company, candidate).await.map(Some) },
                        )
                        .await;
                    let (fields, failure) = outcome.into_parts();
                    failures.extend(failure);
                    responses[idx] = Some(fields);
                }

                let value = responses[idx]
                    .as_ref()
                    .and_then(|fields| fields.as_ref())
                    .and_then(|fields| field.pick(fields));
                if let Some(value) = value {
                    let found = ContactField {
                        value,
                        provider: provider.name().to_string(),
                    };
                    match field {
                        ContactFieldKind::Email => contact.email = Some(found),
                        ContactFieldKind::Phone => contact.phone = Some(found),
                        ContactFieldKind::Handle => contact.handle = Some(found),
                    }
                    break;
                }
            }
            debug!(company = %company.token, candidate = %candidate.name, ?field, "Field enrichment done");
        }

        info!(
            company = %company.token,
            candidate = %candidate.name,
            fields_found = contact.found_count(),
            "Contact enriched"
        );
        Enrichment { contact, failures }
    }
}
