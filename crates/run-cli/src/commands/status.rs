//! `status`: prints the persisted state of a run directly from `Store` —
//! no live actor needed for a read-only query.

use run_core::config::AppConfig;
use run_core::traits::Store;

pub async fn run(config: AppConfig, run_id: &str) -> anyhow::Result<()> {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?;
    let store = run_store::PgStore::new(pool);

    match store.get_run(run_id).await? {
        Some(run) => println!("{}", serde_json::to_string_pretty(&run)?),
        None => println!("run {run_id} not found"),
    }
    Ok(())
}
