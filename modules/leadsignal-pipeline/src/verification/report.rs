use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

use leadsignal_common::{Authenticity, CorroborationSource, ProcessingResult, RoleAssignment};

/// Fallback share above which a run is flagged.
const FALLBACK_RATE_WARNING: f64 = 0.30;
/// Average confidence below which a run is flagged.
const LOW_CONFIDENCE_WARNING: f64 = 70.0;

/// Aggregate view over a set of role assignments.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VerificationReport {
    pub total: usize,
    pub filled: usize,
    pub fallback_count: usize,
    /// Share of filled assignments that are fallbacks.
    pub fallback_rate: f64,
    /// Mean adjusted confidence over filled assignments.
    pub average_confidence: f64,
    pub sources: BTreeSet<CorroborationSource>,
    pub authenticity_counts: BTreeMap<Authenticity, usize>,
    pub recommendations: Vec<String>,
}

impl VerificationReport {
    /// Report over both role assignments of every result.
    pub fn from_results(results: &[ProcessingResult]) -> Self {
        let assignments: Vec<RoleAssignment> = results
            .iter()
            .flat_map(|r| [r.finance.clone(), r.revenue.clone()])
            .collect();
        Self::from_assignments(&assignments)
    }

    pub fn from_assignments(assignments: &[RoleAssignment]) -> Self {
        let filled: Vec<&RoleAssignment> = assignments.iter().filter(|a| a.is_filled()).collect();

        let mut authenticity_counts = BTreeMap::new();
        let mut sources = BTreeSet::new();
        for assignment in &filled {
            *authenticity_counts.entry(assignment.authenticity).or_insert(0) += 1;
            sources.extend(assignment.corroborations.iter().copied());
        }

        let fallback_count = authenticity_counts
            .get(&Authenticity::Fallback)
            .copied()
            .unwrap_or(0);
        let (fallback_rate, average_confidence) = if filled.is_empty() {
            (0.0, 0.0)
        } else {
            let n = filled.len() as f64;
            let sum: f64 = filled.iter().map(|a| a.adjusted_confidence as f64).sum();
            (fallback_count as f64 / n, sum / n)
        };

        let mut report = Self {
            total: assignments.len(),
            filled: filled.len(),
            fallback_count,
            fallback_rate,
            average_confidence,
            sources,
            authenticity_counts,
            recommendations: Vec::new(),
        };
        report.recommendations = report.recommend();
        report
    }

    fn recommend(&self) -> Vec<String> {
        let mut out = Vec::new();
        if self.total == 0 {
            return out;
        }
        if self.filled * 2 < self.total {
            out.push(format!(
                "Only {} of {} roles filled; add leadership providers or check company inputs",
                self.filled, self.total
            ));
        }
        if self.filled == 0 {
            return out;
        }
        if self.fallback_rate > FALLBACK_RATE_WARNING {
            out.push(format!(
                "{:.0}% of assignments are fallbacks; review them before outreach",
                self.fallback_rate * 100.0
            ));
        }
        if self.average_confidence < LOW_CONFIDENCE_WARNING {
            out.push(format!(
                "Average confidence {:.1} is low; consider a higher pipeline tier",
                self.average_confidence
            ));
        }
        if self.sources.is_empty() {
            out.push("No assignment was corroborated; enable presence checks".to_string());
        }
        out
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n=== Verification Report ===")?;
        writeln!(f, "Roles:              {}", self.total)?;
        writeln!(f, "Filled:             {}", self.filled)?;
        writeln!(
            f,
            "Fallbacks:          {} ({:.0}%)",
            self.fallback_count,
            self.fallback_rate * 100.0
        )?;
        writeln!(f, "Average confidence: {:.1}", self.average_confidence)?;
        if !self.authenticity_counts.is_empty() {
            writeln!(f, "\nBy authenticity:")?;
            for (authenticity, count) in &self.authenticity_counts {
                writeln!(f, "  {authenticity:<10} {count}")?;
            }
        }
        if !self.sources.is_empty() {
            let names: Vec<&str> = self.sources.iter().map(|s| s.as_str()).collect();
            writeln!(f, "\nCorroborated by: {}", names.join(", "))?;
        }
        if !self.recommendations.is_empty() {
            writeln!(f, "\nRecommendations:")?;
            for rec in &self.recommendations {
                writeln!(f, "  - {rec}")?;
            }
        }
        Ok(())
    }
}
