//! Voting round repository: open/close/execute/settle transitions.

use crate::repositories::run_repo::{not_found, store_err};
use crate::rows::VotingRoundRow;
use run_core::errors::Result;
use run_core::models::VotingRound;
use rust_decimal::Decimal;
use sqlx::PgPool;

const ROUND_COLUMNS: &str = "run_id, round, status, current_price, vote_long, vote_short, \
    vote_skip, opened_at, closed_at, settled_at";

#[derive(Debug, Clone)]
pub struct VotingRoundRepository {
    pool: PgPool,
}

impl VotingRoundRepository {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn open_voting_round_tx(
        &self,
        run_id: &str,
        round: u16,
        current_price: Decimal,
    ) -> Result<VotingRound> {
        let row = sqlx::query_as::<_, VotingRoundRow>(&format!(
            r"
            INSERT INTO voting_rounds (run_id, round, status, current_price)
            VALUES ($1, $2, 'OPEN', $3)
            RETURNING {ROUND_COLUMNS}
            "
        ))
        .bind(run_id)
        .bind(i16::try_from(round).unwrap_or(i16::MAX))
        .bind(current_price)
        .fetch_one(&self.pool)
        .await
        .map_err(store_err)?;
        row.into_domain()
    }

    pub async fn get_voting_round(&self, run_id: &str, round: u16) -> Result<Option<VotingRound>> {
        let row = sqlx::query_as::<_, VotingRoundRow>(&format!(
            "SELECT {ROUND_COLUMNS} FROM voting_rounds WHERE run_id = $1 AND round = $2"
        ))
        .bind(run_id)
        .bind(i16::try_from(round).unwrap_or(i16::MAX))
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;
        row.map(VotingRoundRow::into_domain).transpose()
    }

    /// Restart recovery (spec §4.3, scenario S6): rounds a crash left in
    /// `EXECUTING` with no terminal outcome recorded.
    pub async fn list_rounds_in_executing(&self, run_id: &str) -> Result<Vec<VotingRound>> {
        let rows = sqlx::query_as::<_, VotingRoundRow>(&format!(
            "SELECT {ROUND_COLUMNS} FROM voting_rounds WHERE run_id = $1 AND status = 'EXECUTING'"
        ))
        .bind(run_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;
        rows.into_iter().map(VotingRoundRow::into_domain).collect()
    }

    /// Tallies every cast vote for `(run_id, round)` into the round's
    /// distribution columns and marks it `CLOSED`, one transaction.
    pub async fn close_voting_round_tx(&self, run_id: &str, round: u16) -> Result<VotingRound> {
        let round_i16 = i16::try_from(round).unwrap_or(i16::MAX);
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        let (long, short, skip): (i64, i64, i64) = sqlx::query_as(
            r"
            SELECT
                COUNT(*) FILTER (WHERE choice = 'LONG'),
                COUNT(*) FILTER (WHERE choice = 'SHORT'),
                COUNT(*) FILTER (WHERE choice = 'SKIP')
            FROM votes WHERE run_id = $1 AND round = $2
            ",
        )
        .bind(run_id)
        .bind(round_i16)
        .fetch_one(&mut *tx)
        .await
        .map_err(store_err)?;

        let row = sqlx::query_as::<_, VotingRoundRow>(&format!(
            r"
            UPDATE voting_rounds SET
                status = 'CLOSED',
                vote_long = $3, vote_short = $4, vote_skip = $5,
                closed_at = now()
            WHERE run_id = $1 AND round = $2
            RETURNING {ROUND_COLUMNS}
            "
        ))
        .bind(run_id)
        .bind(round_i16)
        .bind(i32::try_from(long).unwrap_or(0))
        .bind(i32::try_from(short).unwrap_or(0))
        .bind(i32::try_from(skip).unwrap_or(0))
        .fetch_optional(&mut *tx)
        .await
        .map_err(store_err)?
        .ok_or_else(|| not_found(run_id))?;

        tx.commit().await.map_err(store_err)?;
        row.into_domain()
    }

    pub async fn mark_round_executing_tx(&self, run_id: &str, round: u16) -> Result<VotingRound> {
        self.transition(run_id, round, "EXECUTING", None).await
    }

    pub async fn mark_round_settled_tx(&self, run_id: &str, round: u16) -> Result<VotingRound> {
        self.transition(run_id, round, "SETTLED", Some("settled_at"))
            .await
    }

    async fn transition(
        &self,
        run_id: &str,
        round: u16,
        status: &str,
        stamp_column: Option<&str>,
    ) -> Result<VotingRound> {
        let stamp_clause = stamp_column.map_or(String::new(), |col| format!(", {col} = now()"));
        let row = sqlx::query_as::<_, VotingRoundRow>(&format!(
            r"
            UPDATE voting_rounds SET status = $3{stamp_clause}
            WHERE run_id = $1 AND round = $2
            RETURNING {ROUND_COLUMNS}
            "
        ))
        .bind(run_id)
        .bind(i16::try_from(round).unwrap_or(i16::MAX))
        .bind(status)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?
        .ok_or_else(|| not_found(run_id))?;
        row.into_domain()
    }
}
