pub mod discovery;
pub mod enrichment;
pub mod orchestrator;
pub mod pipeline;
pub mod providers;
pub mod resolution;
pub mod stage;
pub mod stats;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;
pub mod verification;
