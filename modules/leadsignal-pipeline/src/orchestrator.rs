//! Batch fan-out: contiguous chunks of `concurrency_limit` companies, every
//! member of a chunk in its own task, pacing between chunks.
//!
//! Every submitted company yields exactly one result at its submission
//! index. A processor error or panic becomes a degraded result with
//! `OrchestrationFailure` and leaves siblings untouched.

use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use serde::Serialize;
use tokio::task::JoinError;
use tracing::{info, warn};

use leadsignal_common::{BatchJob, CompanyInput, ErrorKind, ProcessingResult};

use crate::pipeline::CompanyProcessor;
use crate::stats::BatchStats;
use crate::verification::VerificationReport;

/// Everything a batch run produced.
#[derive(Debug, Clone, Serialize)]
pub struct BatchRun {
    pub results: Vec<ProcessingResult>,
    pub stats: BatchStats,
}

impl BatchRun {
    /// Report over every role assignment in the run.
    pub fn report(&self) -> VerificationReport {
        VerificationReport::from_results(&self.results)
    }
}

pub struct BatchOrchestrator<P> {
    processor: Arc<P>,
}

impl<P: CompanyProcessor + 'static> BatchOrchestrator<P> {
    pub fn new(processor: Arc<P>) -> Self {
        Self { processor }
    }

    pub async fn run(&self, job: BatchJob) -> BatchRun {
        let batch_started = Instant::now();
        let limit = job.concurrency_limit.max(1);
        let chunk_count = job.chunk_count();
        let mut stats = BatchStats::new(job.companies.len(), chunk_count);
        let mut results = Vec::with_capacity(job.companies.len());

        info!(
            companies = job.companies.len(),
            chunks = chunk_count,
            concurrency = limit,
            pacing_ms = job.pacing_delay.as_millis() as u64,
            "Starting batch"
        );

        for (chunk_index, chunk) in job.companies.chunks(limit).enumerate() {
            if chunk_index > 0 && !job.pacing_delay.is_zero() {
                tokio::time::sleep(job.pacing_delay).await;
            }

            let base = chunk_index * limit;
            let chunk_results = self.run_chunk(base, chunk).await;

            stats.record_chunk(&chunk_results);
            info!(
                chunk = chunk_index + 1,
                of = chunk_count,
                succeeded = stats.succeeded,
                degraded = stats.degraded,
                "Chunk complete"
            );
            results.extend(chunk_results);
        }

        stats.elapsed_ms = batch_started.elapsed().as_millis() as u64;
        info!(
            processed = stats.processed,
            succeeded = stats.succeeded,
            degraded = stats.degraded,
            elapsed_ms = stats.elapsed_ms,
            "Batch complete"
        );
        BatchRun { results, stats }
    }

    /// Process every member concurrently and wait for all of them.
    async fn run_chunk(&self, base: usize, chunk: &[CompanyInput]) -> Vec<ProcessingResult> {
        let started = Instant::now();
        let handles = chunk.iter().enumerate().map(|(offset, input)| {
            let processor = Arc::clone(&self.processor);
            let input = input.clone();
            let index = base + offset;
            tokio::spawn(async move { processor.process(index, &input).await })
        });
        let outcomes = join_all(handles).await;

        outcomes
            .into_iter()
            .zip(chunk)
            .enumerate()
            .map(|(offset, (outcome, input))| {
                let index = base + offset;
                let elapsed_ms = started.elapsed().as_millis() as u64;
                match outcome {
                    Ok(Ok(mut result)) => {
                        result.index = index;
                        result
                    }
                    Ok(Err(e)) => {
                        warn!(index, company = %input.token, error = %e, "Company pipeline failed");
                        ProcessingResult::degraded(
                            index,
                            input,
                            ErrorKind::OrchestrationFailure,
                            e.to_string(),
                            elapsed_ms,
                        )
                    }
                    Err(join_error) => {
                        let message = join_failure(join_error);
                        warn!(index, company = %input.token, error = %message, "Company task aborted");
                        ProcessingResult::degraded(
                            index,
                            input,
                            ErrorKind::OrchestrationFailure,
                            message,
                            elapsed_ms,
                        )
                    }
                }
            })
            .collect()
    }
}

fn join_failure(error: JoinError) -> String {
    if !error.is_panic() {
        return format!("task cancelled: {error}");
    }
    let panic = error.into_panic();
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("pipeline panicked: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("pipeline panicked: {s}")
    } else {
        "pipeline panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::testing::MockProcessor;

    fn companies(tokens: &[&str]) -> Vec<CompanyInput> {
        tokens.iter().map(|t| CompanyInput::new(t)).collect()
    }

    #[tokio::test]
    async fn chunks_are_paced_and_ordered() {
        let processor = Arc::new(MockProcessor::new(Duration::from_millis(20)));
        let orchestrator = BatchOrchestrator::new(processor.clone());
        let job = BatchJob::new(
            companies(&["a.com", "b.com", "c.com", "d.com", "e.com"]),
            3,
            Duration::from_millis(150),
        );

        let run = orchestrator.run(job).await;
        assert_eq!(run.results.len(), 5);
        for (i, result) in run.results.iter().enumerate() {
            assert_eq!(result.index, i);
        }
        assert_eq!(run.results[3].token, "d.com");
        assert_eq!(run.stats.chunks_completed, 2);
        assert!(run.stats.elapsed_ms >= 150);

        let starts = processor.starts();
        let last_of_first = starts[..3].iter().map(|(_, t)| *t).max().unwrap();
        let first_of_second = starts[3..].iter().map(|(_, t)| *t).min().unwrap();
        assert!(first_of_second.duration_since(last_of_first) >= Duration::from_millis(150));
    }

    #[tokio::test]
    async fn failures_and_panics_are_isolated() {
        let processor = Arc::new(
            MockProcessor::new(Duration::from_millis(5))
                .failing_on("b.com")
                .panicking_on("d.com"),
        );
        let orchestrator = BatchOrchestrator::new(processor);
        let job = BatchJob::new(
            companies(&["a.com", "b.com", "c.com", "d.com", "e.com"]),
            3,
            Duration::ZERO,
        );

        let run = orchestrator.run(job).await;
        assert_eq!(run.results.len(), 5);
        assert_eq!(run.results.iter().filter(|r| r.success).count(), 3);
        assert_eq!(run.results[1].error, Some(ErrorKind::OrchestrationFailure));
        assert_eq!(run.results[3].error, Some(ErrorKind::OrchestrationFailure));
        assert!(run.results[3]
            .error_message
            .as_deref()
            .is_some_and(|m| m.contains("d.com exploded")));
        assert_eq!(run.stats.succeeded, 3);
        assert_eq!(run.stats.degraded, 2);
    }

    #[tokio::test]
    async fn empty_batch_is_empty() {
        let orchestrator = BatchOrchestrator::new(Arc::new(MockProcessor::new(Duration::ZERO)));
        let run = orchestrator.run(BatchJob::new(Vec::new(), 3, Duration::from_secs(5))).await;
        assert!(run.results.is_empty());
        assert_eq!(run.stats.chunks_completed, 0);
    }

    #[tokio::test]
    async fn report_covers_both_roles() {
        let orchestrator = BatchOrchestrator::new(Arc::new(MockProcessor::new(Duration::ZERO)));
        let run = orchestrator
            .run(BatchJob::new(companies(&["a.com", "b.com"]), 2, Duration::ZERO))
            .await;
        let report = run.report();
        assert_eq!(report.total, 4);
        assert_eq!(report.filled, 2);
    }
}
