//! Participant repository: join/leave, withdrawal, and pool-total bookkeeping.

use crate::repositories::run_repo::{not_found, store_err};
use crate::rows::ParticipantRow;
use run_core::errors::{OrchestratorError, Result};
use run_core::models::Participant;
use sqlx::PgPool;

const PARTICIPANT_COLUMNS: &str = "run_id, user_id, deposit, withdrawn, final_share, joined_at";

#[derive(Debug, Clone)]
pub struct ParticipantRepository {
    pool: PgPool,
}

impl ParticipantRepository {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts the participant and atomically increments the owning run's
    /// `total_pool`, one transaction (spec §4.1 `join`).
    pub async fn join_tx(&self, run_id: &str, user_id: &str, deposit: i64) -> Result<Participant> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        let row = sqlx::query_as::<_, ParticipantRow>(&format!(
            r"
            INSERT INTO run_participants (run_id, user_id, deposit)
            VALUES ($1, $2, $3)
            RETURNING {PARTICIPANT_COLUMNS}
            "
        ))
        .bind(run_id)
        .bind(user_id)
        .bind(deposit)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("run_participants_pkey") {
                    return OrchestratorError::AlreadyJoined {
                        run_id: run_id.to_string(),
                        user_id: user_id.to_string(),
                    };
                }
            }
            store_err(e)
        })?;

        sqlx::query("UPDATE runs SET total_pool = total_pool + $2 WHERE id = $1")
            .bind(run_id)
            .bind(deposit)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;

        tx.commit().await.map_err(store_err)?;
        Ok(row.into_domain())
    }

    pub async fn leave_tx(&self, run_id: &str, user_id: &str) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        let deleted: Option<(i64,)> = sqlx::query_as(
            "DELETE FROM run_participants WHERE run_id = $1 AND user_id = $2 RETURNING deposit",
        )
        .bind(run_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(store_err)?;

        let Some((deposit,)) = deleted else {
            return Err(OrchestratorError::NotParticipant {
                run_id: run_id.to_string(),
                user_id: user_id.to_string(),
            });
        };

        sqlx::query("UPDATE runs SET total_pool = total_pool - $2 WHERE id = $1")
            .bind(run_id)
            .bind(deposit)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;

        tx.commit().await.map_err(store_err)?;
        Ok(())
    }

    pub async fn get_participant(&self, run_id: &str, user_id: &str) -> Result<Option<Participant>> {
        let row = sqlx::query_as::<_, ParticipantRow>(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM run_participants WHERE run_id = $1 AND user_id = $2"
        ))
        .bind(run_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(row.map(ParticipantRow::into_domain))
    }

    pub async fn list_participants(&self, run_id: &str) -> Result<Vec<Participant>> {
        let rows = sqlx::query_as::<_, ParticipantRow>(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM run_participants WHERE run_id = $1 ORDER BY joined_at ASC"
        ))
        .bind(run_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(rows.into_iter().map(ParticipantRow::into_domain).collect())
    }

    pub async fn count_participants(&self, run_id: &str) -> Result<u32> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM run_participants WHERE run_id = $1")
                .bind(run_id)
                .fetch_one(&self.pool)
                .await
                .map_err(store_err)?;
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    pub async fn set_final_shares_tx(&self, run_id: &str, shares: &[(String, i64)]) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;
        for (user_id, share) in shares {
            sqlx::query(
                "UPDATE run_participants SET final_share = $3 WHERE run_id = $1 AND user_id = $2",
            )
            .bind(run_id)
            .bind(user_id)
            .bind(share)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;
        }
        tx.commit().await.map_err(store_err)?;
        Ok(())
    }

    pub async fn mark_withdrawn_tx(&self, run_id: &str, user_id: &str) -> Result<Participant> {
        let row = sqlx::query_as::<_, ParticipantRow>(&format!(
            r"
            UPDATE run_participants SET withdrawn = TRUE
            WHERE run_id = $1 AND user_id = $2
            RETURNING {PARTICIPANT_COLUMNS}
            "
        ))
        .bind(run_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?
        .ok_or_else(|| not_found(run_id))?;
        Ok(row.into_domain())
    }
}
