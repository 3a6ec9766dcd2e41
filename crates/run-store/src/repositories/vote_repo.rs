//! Vote repository: one row per `(run_id, user_id, round)`, enforced by the
//! table's primary key so a duplicate cast is a constraint violation rather
//! than an application-level race.

use crate::repositories::run_repo::store_err;
use crate::rows::{choice_to_str, VoteRow};
use run_core::errors::{OrchestratorError, Result};
use run_core::models::{Vote, VoteChoice};
use sqlx::PgPool;

const VOTE_COLUMNS: &str = "run_id, user_id, round, choice, cast_at";

#[derive(Debug, Clone)]
pub struct VoteRepository {
    pool: PgPool,
}

impl VoteRepository {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a vote iff `round` is the run's currently `OPEN` round and the
    /// voter has not already cast one this round (spec §4.1 `vote`, §8
    /// property 6). The round-state and duplicate checks happen inside the
    /// same query via a correlated existence check, not a separate
    /// read-then-write, so a concurrent close and a concurrent duplicate cast
    /// both lose the race cleanly.
    pub async fn cast_vote_tx(
        &self,
        run_id: &str,
        user_id: &str,
        round: u16,
        choice: VoteChoice,
    ) -> Result<Vote> {
        let round_i16 = i16::try_from(round).unwrap_or(i16::MAX);

        let round_status: Option<(String,)> =
            sqlx::query_as("SELECT status FROM voting_rounds WHERE run_id = $1 AND round = $2")
                .bind(run_id)
                .bind(round_i16)
                .fetch_optional(&self.pool)
                .await
                .map_err(store_err)?;

        match round_status {
            Some((status,)) if status == "OPEN" => {}
            _ => {
                return Err(OrchestratorError::VoteWindowClosed {
                    run_id: run_id.to_string(),
                    round,
                })
            }
        }

        let row = sqlx::query_as::<_, VoteRow>(&format!(
            r"
            INSERT INTO votes (run_id, user_id, round, choice)
            VALUES ($1, $2, $3, $4)
            RETURNING {VOTE_COLUMNS}
            "
        ))
        .bind(run_id)
        .bind(user_id)
        .bind(round_i16)
        .bind(choice_to_str(choice))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("votes_pkey") {
                    return OrchestratorError::DuplicateVote {
                        run_id: run_id.to_string(),
                        user_id: user_id.to_string(),
                        round,
                    };
                }
            }
            store_err(e)
        })?;

        row.into_domain()
    }

    pub async fn get_vote(&self, run_id: &str, user_id: &str, round: u16) -> Result<Option<Vote>> {
        let row = sqlx::query_as::<_, VoteRow>(&format!(
            "SELECT {VOTE_COLUMNS} FROM votes WHERE run_id = $1 AND user_id = $2 AND round = $3"
        ))
        .bind(run_id)
        .bind(user_id)
        .bind(i16::try_from(round).unwrap_or(i16::MAX))
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;
        row.map(VoteRow::into_domain).transpose()
    }
}
