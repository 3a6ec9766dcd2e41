//! `force-settle`: admin `forceSettle(runId)` (spec §6). Same one-shot
//! actor-spawn approach as `cancel_run`; see its module doc for the
//! dual-writer caveat.

use run_core::config::AppConfig;

pub async fn run(config: AppConfig, run_id: &str) -> anyhow::Result<()> {
    let deps = crate::wiring::build(&config).await?;
    let scheduler = run_engine::Scheduler::new(deps, config.run_defaults.clone(), config.scheduler.clone());
    scheduler.resume_all().await?;

    scheduler.force_settle(run_id).await?;
    println!("run {run_id} force-settled");
    Ok(())
}
