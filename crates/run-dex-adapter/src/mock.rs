//! Simulated DEX adapter: fills are computed locally, no API calls are ever
//! made. Grounded on the reference workspace's `SimulatedExecutionHandler`
//! (`backtest/src/execution.rs`): fixed-bps slippage applied against
//! direction, commission-free here since spec §4.4 models the platform fee
//! separately at settlement.

use async_trait::async_trait;
use rand::Rng;
use run_core::errors::{OrchestratorError, Result};
use run_core::models::PositionDirection;
use run_core::traits::{DexAccountInfo, DexAdapter, DexPosition, OpenPositionReceipt, ClosePositionReceipt};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Mutex;

pub struct MockDexAdapter {
    collateral: Mutex<i64>,
    positions: Mutex<HashMap<String, DexPosition>>,
    last_prices: Mutex<HashMap<String, Decimal>>,
    slippage_bps: Decimal,
}

impl MockDexAdapter {
    #[must_use]
    pub fn new(starting_collateral: i64, slippage_bps: Decimal) -> Self {
        Self {
            collateral: Mutex::new(starting_collateral),
            positions: Mutex::new(HashMap::new()),
            last_prices: Mutex::new(HashMap::new()),
            slippage_bps,
        }
    }

    fn apply_slippage(&self, price: Decimal, direction: PositionDirection) -> Decimal {
        let slippage = price * self.slippage_bps / Decimal::from(10_000);
        match direction {
            PositionDirection::Long => price + slippage,
            PositionDirection::Short => price - slippage,
        }
    }

    /// Advances the internal simulated price for `market_symbol` by a small
    /// random walk and returns the new value, seeding it at 100 on first use.
    fn walk_price(&self, market_symbol: &str) -> Decimal {
        let mut prices = self.last_prices.lock().expect("lock poisoned");
        let current = *prices.entry(market_symbol.to_string()).or_insert(Decimal::from(100));
        let drift_bps = rand::thread_rng().gen_range(-20..=20);
        let drifted = current + current * Decimal::from(drift_bps) / Decimal::from(10_000);
        prices.insert(market_symbol.to_string(), drifted);
        drifted
    }
}

#[async_trait]
impl DexAdapter for MockDexAdapter {
    async fn get_account_info(&self) -> Result<DexAccountInfo> {
        let available_collateral = *self.collateral.lock().expect("lock poisoned");
        Ok(DexAccountInfo { available_collateral })
    }

    async fn get_open_positions(&self) -> Result<Vec<DexPosition>> {
        Ok(self.positions.lock().expect("lock poisoned").values().cloned().collect())
    }

    async fn get_oracle_price(&self, market_symbol: &str) -> Result<Decimal> {
        Ok(self.walk_price(market_symbol))
    }

    async fn open_position(
        &self,
        market_symbol: &str,
        direction: PositionDirection,
        base_amount: Decimal,
        leverage: Decimal,
    ) -> Result<OpenPositionReceipt> {
        let mark = self.walk_price(market_symbol);
        let entry_price = self.apply_slippage(mark, direction);

        self.positions.lock().expect("lock poisoned").insert(
            market_symbol.to_string(),
            DexPosition {
                market_symbol: market_symbol.to_string(),
                direction,
                base_amount,
                entry_price,
            },
        );
        let _ = leverage; // recorded by the caller's Trade row, not re-derived here

        Ok(OpenPositionReceipt {
            transaction_id: uuid::Uuid::new_v4().to_string(),
            entry_price,
        })
    }

    async fn close_position(&self, market_symbol: &str) -> Result<ClosePositionReceipt> {
        let position = self
            .positions
            .lock()
            .expect("lock poisoned")
            .remove(market_symbol)
            .ok_or_else(|| {
                OrchestratorError::StateInvariantViolation(format!(
                    "no open mock position for {market_symbol}"
                ))
            })?;

        let mark = self.walk_price(market_symbol);
        let exit_price = self.apply_slippage(mark, opposite(position.direction));

        let signed_amount = match position.direction {
            PositionDirection::Long => position.base_amount,
            PositionDirection::Short => -position.base_amount,
        };
        let pnl_decimal = (exit_price - position.entry_price) * signed_amount;
        let realized_pnl = pnl_decimal.round_dp(6).to_i64().unwrap_or(0);

        *self.collateral.lock().expect("lock poisoned") += realized_pnl;

        Ok(ClosePositionReceipt {
            transaction_id: uuid::Uuid::new_v4().to_string(),
            exit_price,
            realized_pnl,
        })
    }
}

const fn opposite(direction: PositionDirection) -> PositionDirection {
    match direction {
        PositionDirection::Long => PositionDirection::Short,
        PositionDirection::Short => PositionDirection::Long,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn open_then_close_realizes_pnl_into_collateral() {
        let adapter = MockDexAdapter::new(1_000_000, dec!(10));
        let account_before = adapter.get_account_info().await.unwrap();

        let receipt = adapter
            .open_position("SOL/USDC", PositionDirection::Long, dec!(10), dec!(5))
            .await
            .unwrap();
        assert!(receipt.entry_price > Decimal::ZERO);

        let positions = adapter.get_open_positions().await.unwrap();
        assert_eq!(positions.len(), 1);

        let close = adapter.close_position("SOL/USDC").await.unwrap();
        let account_after = adapter.get_account_info().await.unwrap();
        assert_eq!(
            account_after.available_collateral,
            account_before.available_collateral + close.realized_pnl
        );

        assert!(adapter.get_open_positions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn closing_unopened_position_errors() {
        let adapter = MockDexAdapter::new(1_000_000, dec!(10));
        assert!(adapter.close_position("SOL/USDC").await.is_err());
    }
}
