//! `create-run`: admin `createRun(cfg)` (spec §4.1, §6). Overrides layer on
//! top of `run_defaults`; the actual run is only spawned into a live actor
//! by whichever `serve` process's resume sweep next notices it (or the next
//! `serve` process to start, since creation only touches persisted state
//! and the chain).

use run_core::config::AppConfig;
use run_core::models::RunConfig;

pub struct Overrides {
    pub pair: Option<String>,
    pub duration_minutes: Option<u32>,
    pub voting_interval_minutes: Option<u32>,
    pub min_deposit: Option<i64>,
    pub max_deposit: Option<i64>,
    pub max_participants: Option<u32>,
    pub lobby_duration_seconds: Option<u32>,
    pub cooldown_seconds: Option<u32>,
    pub platform_fee_bps: Option<u32>,
}

pub async fn run(config: AppConfig, overrides: Overrides) -> anyhow::Result<()> {
    let defaults = &config.run_defaults;
    let cfg = RunConfig {
        pair: overrides.pair.unwrap_or_else(|| defaults.pair.clone()),
        duration_minutes: overrides.duration_minutes.unwrap_or(defaults.duration_minutes),
        voting_interval_minutes: overrides
            .voting_interval_minutes
            .unwrap_or(defaults.voting_interval_minutes),
        min_deposit: overrides.min_deposit.unwrap_or(defaults.min_deposit),
        max_deposit: overrides.max_deposit.unwrap_or(defaults.max_deposit),
        max_participants: overrides.max_participants.unwrap_or(defaults.max_participants),
        lobby_duration_seconds: overrides
            .lobby_duration_seconds
            .unwrap_or(defaults.lobby_duration_seconds),
        cooldown_seconds: overrides.cooldown_seconds.unwrap_or(defaults.cooldown_seconds),
        platform_fee_bps: overrides.platform_fee_bps.unwrap_or(defaults.platform_fee_bps),
    };

    let deps = crate::wiring::build(&config).await?;
    let scheduler = run_engine::Scheduler::new(deps, config.run_defaults.clone(), config.scheduler.clone());
    let run = scheduler.create_run(cfg).await?;

    println!("created {} (numeric id {}), status {:?}", run.id, run.numeric_id, run.status);
    Ok(())
}
