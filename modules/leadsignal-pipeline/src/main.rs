use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use leadsignal_common::{BatchJob, CompanyInput, Config, PipelineTier};
use leadsignal_pipeline::orchestrator::{BatchOrchestrator, BatchRun};
use leadsignal_pipeline::pipeline::CompanyPipeline;
use leadsignal_pipeline::stats::BatchStats;
use leadsignal_pipeline::providers::deps_from_config;
use leadsignal_pipeline::verification::VerificationReport;

#[derive(Parser)]
#[command(name = "leadsignal", about = "Find and verify finance and revenue leaders for a list of companies")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one batch of companies through the pipeline
    Run(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    /// JSON array of `{ "domain": ..., "companyName": ..., "accountOwner": ... }`
    #[arg(long)]
    input: PathBuf,

    /// Overrides PIPELINE_TIER
    #[arg(long)]
    tier: Option<PipelineTier>,

    /// Process only the first N companies
    #[arg(long)]
    limit: Option<usize>,

    /// Overrides BATCH_CONCURRENCY
    #[arg(long)]
    concurrency: Option<usize>,

    /// Overrides BATCH_PACING_MS
    #[arg(long)]
    pacing_ms: Option<u64>,

    /// Where to write results (stdout when omitted)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Where to write batch stats and the verification report as JSON
    #[arg(long)]
    summary: Option<PathBuf>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RunSummary<'a> {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    tier: PipelineTier,
    stats: &'a BatchStats,
    report: &'a VerificationReport,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("leadsignal=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let Command::Run(args) = Cli::parse().command;
    run(args).await
}

async fn run(args: RunArgs) -> Result<()> {
    let mut config = Config::from_env()?;
    if let Some(tier) = args.tier {
        config.pipeline.tier = tier;
    }
    if let Some(n) = args.concurrency {
        config.pipeline.concurrency_limit = n.max(1);
    }
    if let Some(ms) = args.pacing_ms {
        config.pipeline.pacing_delay = Duration::from_millis(ms);
    }
    config.log_redacted();

    let raw = std::fs::read_to_string(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let mut companies: Vec<CompanyInput> =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", args.input.display()))?;
    if let Some(limit) = args.limit {
        companies.truncate(limit);
    }

    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    info!(%run_id, companies = companies.len(), tier = %config.pipeline.tier, "LeadSignal starting...");

    let pipeline = CompanyPipeline::new(deps_from_config(&config)?);
    let orchestrator = BatchOrchestrator::new(Arc::new(pipeline));
    let job = BatchJob::new(
        companies,
        config.pipeline.concurrency_limit,
        config.pipeline.pacing_delay,
    );
    let BatchRun { results, stats } = orchestrator.run(job).await;
    let report = VerificationReport::from_results(&results);

    info!("{stats}");
    info!("{report}");

    let json = serde_json::to_string_pretty(&results)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), "Results written");
        }
        None => println!("{json}"),
    }

    if let Some(path) = &args.summary {
        let summary = RunSummary {
            run_id,
            started_at,
            finished_at: Utc::now(),
            tier: config.pipeline.tier,
            stats: &stats,
            report: &report,
        };
        std::fs::write(path, serde_json::to_string_pretty(&summary)?)
            .with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "Summary written");
    }

    Ok(())
}
