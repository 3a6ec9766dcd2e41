//! `serve`: the orchestrator's long-running process.

use run_core::config::AppConfig;
use run_engine::Scheduler;

pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let deps = crate::wiring::build(&config).await?;
    let scheduler = Scheduler::new(deps, config.run_defaults.clone(), config.scheduler.clone());

    let resumed = scheduler.resume_all().await?;
    tracing::info!(resumed, "scheduler resumed non-terminal runs from persisted state");

    scheduler.run().await;
    Ok(())
}
