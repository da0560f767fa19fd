//! Deadline-bounded wrapper for every external provider call.
//!
//! A stage call either completes before its deadline or is replaced by a
//! caller-supplied fallback. Errors and panics from the provider are caught
//! here and recorded as a [`StageFailure`]; nothing propagates upward.
//!
//! On timeout the provider future is dropped, so a late answer has nowhere
//! to land.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use tracing::warn;

use leadsignal_common::{Stage, StageDeadlines, StageFailure};

/// Result of a stage call: the provider's value, or the fallback plus the
/// reason it was used.
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome<T> {
    Completed(T),
    Fallback { value: T, failure: StageFailure },
}

impl<T> StageOutcome<T> {
    pub fn value(&self) -> &T {
        match self {
            StageOutcome::Completed(value) => value,
            StageOutcome::Fallback { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        self.into_parts().0
    }

    pub fn failure(&self) -> Option<&StageFailure> {
        match self {
            StageOutcome::Completed(_) => None,
            StageOutcome::Fallback { failure, .. } => Some(failure),
        }
    }

    pub fn into_parts(self) -> (T, Option<StageFailure>) {
        match self {
            StageOutcome::Completed(value) => (value, None),
            StageOutcome::Fallback { value, failure } => (value, Some(failure)),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, StageOutcome::Fallback { .. })
    }
}

/// Applies the configured per-stage deadlines.
#[derive(Debug, Clone, Copy)]
pub struct StageRunner {
    deadlines: StageDeadlines,
}

impl StageRunner {
    pub fn new(deadlines: StageDeadlines) -> Self {
        Self { deadlines }
    }

    pub fn deadline(&self, stage: Stage) -> Duration {
        self.deadlines.for_stage(stage)
    }

    /// Run `call` under the stage's configured deadline.
    pub async fn invoke<T, F>(
        &self,
        stage: Stage,
        provider: Option<&str>,
        fallback: T,
        call: F,
    ) -> StageOutcome<T>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        invoke_within(stage, provider, self.deadline(stage), fallback, call).await
    }
}

/// Run `call` with an explicit deadline. Always resolves; never errors.
pub async fn invoke_within<T, F>(
    stage: Stage,
    provider: Option<&str>,
    deadline: Duration,
    fallback: T,
    call: F,
) -> StageOutcome<T>
where
    F: Future<Output = anyhow::Result<T>>,
{
    let guarded = AssertUnwindSafe(call).catch_unwind();
    let failure = match tokio::time::timeout(deadline, guarded).await {
        Ok(Ok(Ok(value))) => return StageOutcome::Completed(value),
        Ok(Ok(Err(e))) => {
            warn!(%stage, provider, error = %e, "Stage call failed, using fallback");
            StageFailure::provider_error(stage, provider, e.to_string())
        }
        Ok(Err(panic)) => {
            let message = panic_message(panic.as_ref());
            warn!(%stage, provider, panic = %message, "Stage call panicked, using fallback");
            StageFailure::provider_error(stage, provider, format!("provider panicked: {message}"))
        }
        Err(_) => {
            let deadline_ms = deadline.as_millis() as u64;
            warn!(%stage, provider, deadline_ms, "Stage call timed out, using fallback");
            StageFailure::timeout(stage, provider, deadline_ms)
        }
    };

    StageOutcome::Fallback {
        value: fallback,
        failure,
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
