use std::collections::BTreeMap;

use serde::Serialize;

use leadsignal_common::{Authenticity, ErrorKind, ProcessingResult, Role};

/// Running stats for a batch. Updated after each chunk completes.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct BatchStats {
    pub companies_total: u32,
    pub chunks_total: u32,
    pub chunks_completed: u32,
    pub processed: u32,
    pub succeeded: u32,
    pub degraded: u32,
    pub orchestration_failures: u32,
    pub roles_filled: u32,
    pub contacts_found: u32,
    pub fallback_assignments: u32,
    pub corroborated_assignments: u32,
    pub failures_by_kind: BTreeMap<ErrorKind, u32>,
    pub total_processing_ms: u64,
    /// Wall-clock time of the whole batch, pacing included.
    pub elapsed_ms: u64,
}

impl BatchStats {
    pub fn new(companies_total: usize, chunks_total: usize) -> Self {
        Self {
            companies_total: companies_total as u32,
            chunks_total: chunks_total as u32,
            ..Default::default()
        }
    }

    pub fn record_chunk(&mut self, results: &[ProcessingResult]) {
        self.chunks_completed += 1;
        for result in results {
            self.processed += 1;
            if result.success {
                self.succeeded += 1;
            }
            if result.error.is_some() {
                self.degraded += 1;
            }
            if result.error == Some(ErrorKind::OrchestrationFailure) {
                self.orchestration_failures += 1;
            }
            self.total_processing_ms += result.processing_time_ms;
            for failure in &result.failures {
                *self.failures_by_kind.entry(failure.kind).or_insert(0) += 1;
            }
            if result.failures.is_empty() {
                if let Some(kind) = result.error {
                    *self.failures_by_kind.entry(kind).or_insert(0) += 1;
                }
            }
            for role in Role::ALL {
                let assignment = result.assignment(role);
                if !assignment.is_filled() {
                    continue;
                }
                self.roles_filled += 1;
                self.contacts_found += result.contact(role).found_count();
                if assignment.authenticity == Authenticity::Fallback {
                    self.fallback_assignments += 1;
                }
                if assignment.method.is_some() {
                    self.corroborated_assignments += 1;
                }
            }
        }
    }

    pub fn average_processing_ms(&self) -> u64 {
        self.total_processing_ms / u64::from(self.processed.max(1))
    }
}

impl std::fmt::Display for BatchStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Batch Run Complete ===")?;
        writeln!(f, "Companies:          {}", self.companies_total)?;
        writeln!(f, "Chunks:             {}/{}", self.chunks_completed, self.chunks_total)?;
        writeln!(f, "Processed:          {}", self.processed)?;
        writeln!(f, "Succeeded:          {}", self.succeeded)?;
        writeln!(f, "Degraded:           {}", self.degraded)?;
        writeln!(f, "Task failures:      {}", self.orchestration_failures)?;
        writeln!(f, "Elapsed:            {}ms", self.elapsed_ms)?;
        writeln!(f, "Avg time per co.:   {}ms", self.average_processing_ms())?;
        let roles = self.roles_filled.max(1);
        writeln!(f, "\nRoles filled:       {}", self.roles_filled)?;
        writeln!(
            f,
            "  Fallbacks:        {} ({:.0}%)",
            self.fallback_assignments,
            self.fallback_assignments as f64 / roles as f64 * 100.0
        )?;
        writeln!(
            f,
            "  Corroborated:     {} ({:.0}%)",
            self.corroborated_assignments,
            self.corroborated_assignments as f64 / roles as f64 * 100.0
        )?;
        writeln!(f, "Contact fields:     {}", self.contacts_found)?;
        if !self.failures_by_kind.is_empty() {
            writeln!(f, "\nFailures:")?;
            for (kind, count) in &self.failures_by_kind {
                writeln!(f, "  {kind}: {count}")?;
            }
        }
        Ok(())
    }
}
