//! Trade Executor (spec §4.4): turns one round's majority decision into a
//! DEX position and a persisted `Trade` row. Generalized from the reference
//! workspace's `ExecutionHandler::execute_order` (`execution/src/lib.rs`)
//! into a two-legged open/close shape, since a pooled run keeps exactly one
//! position in flight and closes it only when the next round opens or the
//! run settles (spec §4.4 "ordering guarantee").

use crate::deps::RunDeps;
use run_core::errors::{OrchestratorError, Result};
use run_core::models::{PositionDirection, Run, Trade, TradeDirection};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Market symbol the DEX adapter trades, derived from the run's pair (spec
/// §4.4 step 5: "marketSymbol derived from pair").
#[must_use]
pub fn market_symbol(pair: &str) -> String {
    pair.split('/').next().unwrap_or(pair).to_string()
}

/// Opens (or records a SKIP for) one round's trade. Never closes a prior
/// round's position — that is `close_trade_if_open`'s job, invoked by the
/// round controller before the next round's `execute_trade` call.
///
/// # Errors
/// Returns `InsufficientCollateral` if the drawn size resolves to zero base
/// units, or whatever the DEX/Store calls themselves return.
pub async fn execute_trade(
    deps: &RunDeps,
    run: &Run,
    round: u16,
    decision: TradeDirection,
    reference_price: Decimal,
) -> Result<Trade> {
    let now = deps.clock.now();

    if decision == TradeDirection::Skip {
        let trade = Trade {
            run_id: run.id.clone(),
            round,
            direction: TradeDirection::Skip,
            leverage_tenths: 0,
            position_size_percent_tenths: 0,
            entry_price: reference_price,
            exit_price: Some(reference_price),
            pnl: Some(0),
            opened_at: now,
            closed_at: Some(now),
        };
        let persisted = deps.store.record_trade_tx(&trade).await?;
        record_on_chain_best_effort(deps, run, round, &persisted).await;
        return Ok(persisted);
    }

    let direction = PositionDirection::try_from(decision).map_err(|()| {
        OrchestratorError::StateInvariantViolation(
            "non-SKIP decision failed to convert to a position direction".to_string(),
        )
    })?;

    let account = deps.dex.get_account_info().await?;
    let draw = {
        let mut chaos = deps.chaos.lock().expect("lock poisoned");
        chaos.draw(run.numeric_id, round)
    };
    let leverage = draw.leverage();
    let size_percent = draw.position_size_percent();

    let available = Decimal::from(account.available_collateral);
    let base_amount = available * size_percent / dec!(100) * leverage / reference_price;
    if base_amount <= Decimal::ZERO {
        return Err(OrchestratorError::InsufficientCollateral {
            run_id: run.id.clone(),
            available: account.available_collateral,
            required: 0,
        });
    }

    let market = market_symbol(&run.pair);
    let open = deps
        .dex
        .open_position(&market, direction, base_amount, leverage)
        .await?;

    let trade = Trade {
        run_id: run.id.clone(),
        round,
        direction: decision,
        leverage_tenths: draw.leverage_tenths,
        position_size_percent_tenths: draw.position_size_percent_tenths,
        entry_price: open.entry_price,
        exit_price: None,
        pnl: None,
        opened_at: now,
        closed_at: None,
    };
    let persisted = deps.store.record_trade_tx(&trade).await?;
    record_on_chain_best_effort(deps, run, round, &persisted).await;
    Ok(persisted)
}

/// Closes round `round`'s position if one is still open, recording the exit
/// leg. A no-op for SKIP rounds and rounds already closed — safe to call
/// unconditionally at the top of every round boundary.
///
/// # Errors
/// Propagates `Store`/`DexAdapter` failures; the caller decides whether that
/// is retried or degrades the run.
pub async fn close_trade_if_open(deps: &RunDeps, run: &Run, round: u16) -> Result<()> {
    let Some(trade) = deps.store.get_trade(&run.id, round).await? else {
        return Ok(());
    };
    if trade.direction == TradeDirection::Skip || trade.exit_price.is_some() {
        return Ok(());
    }

    let market = market_symbol(&run.pair);
    let receipt = deps.dex.close_position(&market).await?;
    let now = deps.clock.now();
    deps.store
        .update_trade_exit_tx(&run.id, round, receipt.exit_price, receipt.realized_pnl, now)
        .await?;
    Ok(())
}

/// Chain `record_trade` failure is logged, never propagated (spec §4.4 step
/// 8: "failure is logged but not fatal — Trade in Store is the source of
/// truth"). Only called on the open leg; the on-chain record is never
/// patched with the exit price or pnl (spec §9 open question resolution,
/// `DESIGN.md`).
async fn record_on_chain_best_effort(deps: &RunDeps, run: &Run, round: u16, trade: &Trade) {
    if let Err(e) = deps.chain.record_trade(run.numeric_id, round, trade).await {
        tracing::warn!(
            run_id = %run.id,
            round,
            error = %e,
            "chain record_trade failed; Trade row remains the source of truth"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeBus, FakeChain, FakeOracle, FakeStore, FlakyDex};
    use run_core::clock::FakeClock;
    use run_core::config::ExecutorConfig;
    use run_core::chaos::SeededChaosRng;
    use run_core::models::RunStatus;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    #[test]
    fn market_symbol_takes_base_asset() {
        assert_eq!(market_symbol("SOL/USDC"), "SOL");
    }

    #[test]
    fn market_symbol_falls_back_to_whole_string_without_slash() {
        assert_eq!(market_symbol("SOL"), "SOL");
    }

    fn test_run() -> Run {
        Run {
            id: "run-1".to_string(),
            numeric_id: 1,
            pair: "SOL/USDC".to_string(),
            status: RunStatus::Active,
            lobby_duration_seconds: 600,
            round_duration_seconds: 600,
            cooldown_seconds: 60,
            total_rounds: 6,
            current_round: 1,
            min_deposit: 10,
            max_deposit: 100,
            max_participants: 50,
            total_pool: 1_000,
            platform_fee_bps: 1_500,
            created_at: chrono::Utc::now(),
            started_at: Some(chrono::Utc::now()),
            ended_at: None,
        }
    }

    fn test_deps(available_collateral: i64) -> RunDeps {
        RunDeps {
            store: Arc::new(FakeStore::new()),
            bus: Arc::new(FakeBus::default()),
            oracle: Arc::new(FakeOracle::new(dec!(100))),
            chain: Arc::new(FakeChain),
            dex: Arc::new(FlakyDex::new(available_collateral, 0)),
            clock: Arc::new(FakeClock::new(chrono::Utc::now())),
            chaos: Arc::new(std::sync::Mutex::new(Box::new(SeededChaosRng))),
            executor: ExecutorConfig {
                retries: 3,
                backoff_base_ms: 1,
                backoff_cap_ms: 4,
                chaos_seeded_replay: true,
            },
            oracle_stale_seconds: 30,
        }
    }

    #[tokio::test]
    async fn skip_decision_never_touches_the_dex() {
        let run = test_run();
        let deps = test_deps(10_000);
        let trade = execute_trade(&deps, &run, 1, TradeDirection::Skip, dec!(100))
            .await
            .expect("a SKIP trade records cleanly without any DEX call");
        assert_eq!(trade.leverage_tenths, 0);
        assert_eq!(trade.position_size_percent_tenths, 0);
        assert_eq!(trade.entry_price, dec!(100));
        assert_eq!(trade.exit_price, Some(dec!(100)));
        assert_eq!(trade.pnl, Some(0));
    }

    #[tokio::test]
    async fn long_decision_opens_a_position_and_records_the_trade() {
        let run = test_run();
        let deps = test_deps(10_000);
        let trade = execute_trade(&deps, &run, 1, TradeDirection::Long, dec!(100))
            .await
            .expect("sufficient collateral should open a position");
        assert_eq!(trade.direction, TradeDirection::Long);
        assert!(trade.leverage_tenths > 0);
        assert!(trade.exit_price.is_none());
    }

    #[tokio::test]
    async fn zero_collateral_fails_with_insufficient_collateral() {
        let run = test_run();
        let deps = test_deps(0);
        let err = execute_trade(&deps, &run, 1, TradeDirection::Long, dec!(100))
            .await
            .expect_err("zero collateral should never resolve to a positive base amount");
        assert!(matches!(err, OrchestratorError::InsufficientCollateral { .. }));
    }

    #[tokio::test]
    async fn close_trade_if_open_is_a_no_op_for_an_unseen_round() {
        let run = test_run();
        let deps = test_deps(10_000);
        close_trade_if_open(&deps, &run, 99)
            .await
            .expect("closing a round with no recorded trade is a no-op, not an error");
    }
}
