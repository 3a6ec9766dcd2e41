//! Postgres-backed implementation of `run_core::traits::Store`.

pub mod pg_store;
pub mod repositories;
pub mod rows;

pub use pg_store::PgStore;

#[cfg(test)]
mod tests {
    use super::*;
    use run_core::models::RunConfig;
    use run_core::traits::Store;
    use sqlx::postgres::PgPoolOptions;

    fn sample_config() -> RunConfig {
        RunConfig {
            pair: "SOL/USDC".to_string(),
            duration_minutes: 60,
            voting_interval_minutes: 10,
            min_deposit: 10,
            max_deposit: 100,
            max_participants: 50,
            lobby_duration_seconds: 600,
            cooldown_seconds: 60,
            platform_fee_bps: 1_500,
        }
    }

    /// Exercises the lifecycle against a real database; skipped unless
    /// `TEST_DATABASE_URL` is set, mirroring how the reference workspace
    /// gates its own Postgres-backed integration tests.
    #[tokio::test]
    async fn run_lifecycle_round_trips_through_postgres() {
        let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
            eprintln!("skipping: TEST_DATABASE_URL not set");
            return;
        };
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await
            .expect("connect to test database");
        let store = PgStore::new(pool);
        store.run_migrations().await.expect("run migrations");

        let cfg = sample_config();
        let numeric_id = store.next_numeric_run_id().await.unwrap();
        let run = store
            .create_run_tx("run-lifecycle-test", numeric_id, &cfg)
            .await
            .unwrap();
        assert_eq!(run.status, run_core::models::RunStatus::Waiting);
        assert_eq!(run.total_rounds, 6);

        let participant = store.join_tx(&run.id, "user-1", 50).await.unwrap();
        assert_eq!(participant.deposit, 50);

        let refreshed = store.get_run(&run.id).await.unwrap().unwrap();
        assert_eq!(refreshed.total_pool, 50);
    }
}
