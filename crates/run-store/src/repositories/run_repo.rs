//! Run repository: creation, status transitions, and atomic counter updates.

use crate::rows::{log_kind_to_str, status_to_str, RunRow};
use run_core::errors::{OrchestratorError, Result};
use run_core::models::{Run, RunConfig, RunStatus, SystemLogKind};
use sqlx::PgPool;

#[derive(Debug, Clone)]
pub struct RunRepository {
    pool: PgPool,
}

const RUN_COLUMNS: &str = "id, numeric_id, pair, status, lobby_duration_seconds, \
    round_duration_seconds, cooldown_seconds, total_rounds, current_round, min_deposit, \
    max_deposit, max_participants, total_pool, platform_fee_bps, created_at, started_at, ended_at";

impl RunRepository {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Allocates the next strictly-monotonic numeric run id from the
    /// database sequence (spec §9 resolution: never derived from the id
    /// string or a timestamp).
    pub async fn next_numeric_run_id(&self) -> Result<u64> {
        let (value,): (i64,) = sqlx::query_as("SELECT nextval('run_numeric_id_seq')")
            .fetch_one(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(u64::try_from(value).unwrap_or(0))
    }

    pub async fn create_run_tx(&self, id: &str, numeric_id: u64, cfg: &RunConfig) -> Result<Run> {
        let total_rounds = cfg.validate()?;
        let numeric_id = i64::try_from(numeric_id).map_err(|_| {
            OrchestratorError::InvalidConfig("numeric_id overflowed i64".to_string())
        })?;

        let mut tx = self.pool.begin().await.map_err(store_err)?;

        let insert = sqlx::query_as::<_, RunRow>(&format!(
            r"
            INSERT INTO runs (
                id, numeric_id, pair, status, lobby_duration_seconds, round_duration_seconds,
                cooldown_seconds, total_rounds, current_round, min_deposit, max_deposit,
                max_participants, total_pool, platform_fee_bps
            )
            VALUES ($1, $2, $3, 'WAITING', $4, $5, $6, $7, 0, $8, $9, $10, 0, $11)
            RETURNING {RUN_COLUMNS}
            "
        ))
        .bind(id)
        .bind(numeric_id)
        .bind(&cfg.pair)
        .bind(i32::try_from(cfg.lobby_duration_seconds).unwrap_or(i32::MAX))
        .bind(i32::try_from(cfg.voting_interval_minutes * 60).unwrap_or(i32::MAX))
        .bind(i32::try_from(cfg.cooldown_seconds).unwrap_or(i32::MAX))
        .bind(i16::try_from(total_rounds).unwrap_or(i16::MAX))
        .bind(cfg.min_deposit)
        .bind(cfg.max_deposit)
        .bind(i32::try_from(cfg.max_participants).unwrap_or(i32::MAX))
        .bind(i32::try_from(cfg.platform_fee_bps).unwrap_or(i32::MAX))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("runs_single_non_terminal") {
                    return OrchestratorError::SingleRunViolation;
                }
            }
            store_err(e)
        })?;

        sqlx::query(
            r"INSERT INTO system_logs (run_id, kind, message) VALUES ($1, $2, $3)",
        )
        .bind(id)
        .bind(log_kind_to_str(SystemLogKind::RunCreated))
        .bind(format!("run {id} created in lobby ({} rounds)", total_rounds))
        .execute(&mut *tx)
        .await
        .map_err(store_err)?;

        tx.commit().await.map_err(store_err)?;
        insert.into_domain()
    }

    pub async fn get_run(&self, run_id: &str) -> Result<Option<Run>> {
        let row = sqlx::query_as::<_, RunRow>(&format!(
            "SELECT {RUN_COLUMNS} FROM runs WHERE id = $1"
        ))
        .bind(run_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;
        row.map(RunRow::into_domain).transpose()
    }

    pub async fn list_non_terminal_runs(&self) -> Result<Vec<Run>> {
        let rows = sqlx::query_as::<_, RunRow>(&format!(
            "SELECT {RUN_COLUMNS} FROM runs \
             WHERE status IN ('WAITING', 'ACTIVE', 'SETTLING', 'COOLDOWN')"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;
        rows.into_iter().map(RunRow::into_domain).collect()
    }

    pub async fn transition_run_status_tx(
        &self,
        run_id: &str,
        new_status: RunStatus,
        log_kind: SystemLogKind,
        message: &str,
    ) -> Result<Run> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        let (stamp_started, stamp_ended) = (
            new_status == RunStatus::Active,
            matches!(new_status, RunStatus::Ended | RunStatus::Cancelled),
        );

        let row = sqlx::query_as::<_, RunRow>(&format!(
            r"
            UPDATE runs SET
                status = $2,
                started_at = CASE WHEN $3 THEN now() ELSE started_at END,
                ended_at = CASE WHEN $4 THEN now() ELSE ended_at END
            WHERE id = $1
            RETURNING {RUN_COLUMNS}
            "
        ))
        .bind(run_id)
        .bind(status_to_str(new_status))
        .bind(stamp_started)
        .bind(stamp_ended)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("runs_single_non_terminal") {
                    return OrchestratorError::SingleRunViolation;
                }
            }
            store_err(e)
        })?
        .ok_or_else(|| not_found(run_id))?;

        sqlx::query("INSERT INTO system_logs (run_id, kind, message) VALUES ($1, $2, $3)")
            .bind(run_id)
            .bind(log_kind_to_str(log_kind))
            .bind(message)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;

        tx.commit().await.map_err(store_err)?;
        row.into_domain()
    }

    pub async fn advance_round_tx(&self, run_id: &str, current_round: u16) -> Result<Run> {
        let row = sqlx::query_as::<_, RunRow>(&format!(
            "UPDATE runs SET current_round = $2 WHERE id = $1 RETURNING {RUN_COLUMNS}"
        ))
        .bind(run_id)
        .bind(i16::try_from(current_round).unwrap_or(i16::MAX))
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?
        .ok_or_else(|| not_found(run_id))?;
        row.into_domain()
    }

    pub async fn set_final_balance_tx(
        &self,
        run_id: &str,
        final_realized_balance: i64,
        platform_fee_amount: i64,
    ) -> Result<Run> {
        let row = sqlx::query_as::<_, RunRow>(&format!(
            r"
            UPDATE runs
            SET final_realized_balance = $2, platform_fee_amount = $3
            WHERE id = $1
            RETURNING {RUN_COLUMNS}
            "
        ))
        .bind(run_id)
        .bind(final_realized_balance)
        .bind(platform_fee_amount)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?
        .ok_or_else(|| not_found(run_id))?;
        row.into_domain()
    }

    /// Atomically adds `delta` to `total_pool` via a conditional `UPDATE`,
    /// never a read-modify-write (spec §5).
    pub async fn increment_pool_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        run_id: &str,
        delta: i64,
    ) -> Result<()> {
        sqlx::query("UPDATE runs SET total_pool = total_pool + $2 WHERE id = $1")
            .bind(run_id)
            .bind(delta)
            .execute(&mut **tx)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    pub async fn mark_chain_unsynced_tx(&self, run_id: &str) -> Result<()> {
        sqlx::query("UPDATE runs SET chain_unsynced = TRUE WHERE id = $1")
            .bind(run_id)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    pub async fn clear_chain_unsynced_tx(&self, run_id: &str) -> Result<()> {
        sqlx::query("UPDATE runs SET chain_unsynced = FALSE WHERE id = $1")
            .bind(run_id)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    pub async fn is_chain_unsynced(&self, run_id: &str) -> Result<bool> {
        let row: Option<(bool,)> =
            sqlx::query_as("SELECT chain_unsynced FROM runs WHERE id = $1")
                .bind(run_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(store_err)?;
        Ok(row.map_or(false, |(unsynced,)| unsynced))
    }

    pub async fn set_platform_paused(&self, paused: bool) -> Result<()> {
        sqlx::query("UPDATE platform_state SET paused = $1 WHERE id = TRUE")
            .bind(paused)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    pub async fn is_platform_paused(&self) -> Result<bool> {
        let row: Option<(bool,)> =
            sqlx::query_as("SELECT paused FROM platform_state WHERE id = TRUE")
                .fetch_optional(&self.pool)
                .await
                .map_err(store_err)?;
        Ok(row.map_or(false, |(paused,)| paused))
    }

    pub(crate) fn pool(&self) -> &PgPool {
        &self.pool
    }
}

pub(crate) fn store_err(err: sqlx::Error) -> OrchestratorError {
    OrchestratorError::ExternalTransient {
        service: "postgres".to_string(),
        source: anyhow::Error::new(err),
    }
}

pub(crate) fn not_found(run_id: &str) -> OrchestratorError {
    OrchestratorError::StateInvariantViolation(format!("run {run_id} not found"))
}
