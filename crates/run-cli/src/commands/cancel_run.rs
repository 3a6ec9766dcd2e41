//! `cancel-run`: admin `cancelRun(runId, reason)` (spec §6, §7). Spawns a
//! short-lived actor for the target run in this process (reusing
//! `RunActor::handle_cancel` rather than duplicating its
//! close-position/settle/refund logic), issues the cancel, and exits. Do
//! not run this against a run a `serve` process is also actively driving —
//! both would become writers for the same run.

use run_core::config::AppConfig;

pub async fn run(config: AppConfig, run_id: &str, reason: &str) -> anyhow::Result<()> {
    let deps = crate::wiring::build(&config).await?;
    let scheduler = run_engine::Scheduler::new(deps, config.run_defaults.clone(), config.scheduler.clone());
    scheduler.resume_all().await?;

    scheduler.cancel_run(run_id, reason).await?;
    println!("run {run_id} cancelled: {reason}");
    Ok(())
}
