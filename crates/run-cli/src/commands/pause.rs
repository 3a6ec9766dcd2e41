//! `pause` / `unpause`: admin `pausePlatform()` / `unpausePlatform()`
//! (spec §6). These only touch the persisted flag `Store` exposes, so
//! unlike `cancel_run`/`force_settle` they need no live actor and are safe
//! to run alongside a `serve` process.

use run_core::config::AppConfig;
use run_core::traits::Store;

pub async fn run(config: AppConfig, paused: bool) -> anyhow::Result<()> {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?;
    let store = run_store::PgStore::new(pool);

    store.set_platform_paused(paused).await?;
    println!("platform {}", if paused { "paused" } else { "unpaused" });
    Ok(())
}
