//! Trade repository: one row per `(run_id, round)`, recorded at open and
//! amended at close.

use crate::repositories::run_repo::{not_found, store_err};
use crate::rows::{direction_to_str, TradeRow};
use run_core::errors::Result;
use run_core::models::Trade;
use rust_decimal::Decimal;
use sqlx::PgPool;

const TRADE_COLUMNS: &str = "run_id, round, direction, leverage_tenths, \
    position_size_percent_tenths, entry_price, exit_price, pnl, opened_at, closed_at";

#[derive(Debug, Clone)]
pub struct TradeRepository {
    pool: PgPool,
}

impl TradeRepository {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts the opened (or SKIP) trade and marks the owning round
    /// `SETTLED` in the same transaction (spec §4.3 SETTLED phase, §4.4 step
    /// 7). A SKIP trade has no exit leg, so it settles the round on insert;
    /// a LONG/SHORT trade settles the round later via `update_trade_exit_tx`.
    pub async fn record_trade_tx(&self, trade: &Trade) -> Result<Trade> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        let row = sqlx::query_as::<_, TradeRow>(&format!(
            r"
            INSERT INTO trades (
                run_id, round, direction, leverage_tenths,
                position_size_percent_tenths, entry_price, opened_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {TRADE_COLUMNS}
            "
        ))
        .bind(&trade.run_id)
        .bind(i16::try_from(trade.round).unwrap_or(i16::MAX))
        .bind(direction_to_str(trade.direction))
        .bind(i32::try_from(trade.leverage_tenths).unwrap_or(0))
        .bind(i32::try_from(trade.position_size_percent_tenths).unwrap_or(0))
        .bind(trade.entry_price)
        .bind(trade.opened_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(store_err)?;

        if trade.direction == run_core::models::TradeDirection::Skip {
            sqlx::query(
                "UPDATE voting_rounds SET status = 'SETTLED', settled_at = now() \
                 WHERE run_id = $1 AND round = $2",
            )
            .bind(&trade.run_id)
            .bind(i16::try_from(trade.round).unwrap_or(i16::MAX))
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;
        }

        tx.commit().await.map_err(store_err)?;
        row.into_domain()
    }

    /// Records the close leg and settles the round, one transaction.
    pub async fn update_trade_exit_tx(
        &self,
        run_id: &str,
        round: u16,
        exit_price: Decimal,
        pnl: i64,
        closed_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<Trade> {
        let round_i16 = i16::try_from(round).unwrap_or(i16::MAX);
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        let row = sqlx::query_as::<_, TradeRow>(&format!(
            r"
            UPDATE trades SET exit_price = $3, pnl = $4, closed_at = $5
            WHERE run_id = $1 AND round = $2
            RETURNING {TRADE_COLUMNS}
            "
        ))
        .bind(run_id)
        .bind(round_i16)
        .bind(exit_price)
        .bind(pnl)
        .bind(closed_at)
        .fetch_optional(&mut *tx)
        .await
        .map_err(store_err)?
        .ok_or_else(|| not_found(run_id))?;

        sqlx::query(
            "UPDATE voting_rounds SET status = 'SETTLED', settled_at = now() \
             WHERE run_id = $1 AND round = $2",
        )
        .bind(run_id)
        .bind(round_i16)
        .execute(&mut *tx)
        .await
        .map_err(store_err)?;

        tx.commit().await.map_err(store_err)?;
        row.into_domain()
    }

    pub async fn get_trade(&self, run_id: &str, round: u16) -> Result<Option<Trade>> {
        let row = sqlx::query_as::<_, TradeRow>(&format!(
            "SELECT {TRADE_COLUMNS} FROM trades WHERE run_id = $1 AND round = $2"
        ))
        .bind(run_id)
        .bind(i16::try_from(round).unwrap_or(i16::MAX))
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;
        row.map(TradeRow::into_domain).transpose()
    }

    pub async fn list_trades(&self, run_id: &str) -> Result<Vec<Trade>> {
        let rows = sqlx::query_as::<_, TradeRow>(&format!(
            "SELECT {TRADE_COLUMNS} FROM trades WHERE run_id = $1 ORDER BY round ASC"
        ))
        .bind(run_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;
        rows.into_iter().map(TradeRow::into_domain).collect()
    }
}
