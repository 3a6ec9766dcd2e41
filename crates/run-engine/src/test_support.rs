//! In-memory test doubles for the round controller / trade executor unit
//! tests. Not a substitute for `run-store`'s `sqlx::test`-backed integration
//! tests — just enough `Store`/`DexAdapter`/`ChainAdapter` behavior to drive
//! the retry/backoff/degrade and crash-recovery logic deterministically.

#![cfg(test)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use run_core::errors::{OrchestratorError, Result};
use run_core::models::{
    Participant, RunConfig, RunStatus, SystemLog, SystemLogKind, Trade, Vote, VoteChoice,
    VotingRound,
};
use run_core::events::Event;
use run_core::traits::{
    BroadcastBus, ChainAdapter, ChainReceipt, ClosePositionReceipt, DexAccountInfo, DexAdapter,
    DexPosition, OpenPositionReceipt, PriceOracle, PriceSample, PriceSource, Store,
};
use run_core::models::{PositionDirection, Run};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;
use tokio::sync::broadcast;

/// Backs every `Store` method a round-controller/trade-executor test
/// actually exercises. Methods the engine's retry/recovery paths don't
/// reach (participant/vote bookkeeping) are stubbed to keep this file
/// focused; they return empty/default values rather than panicking, since
/// an unexercised method returning `Ok(None)`/`Ok(vec![])` is harmless.
#[derive(Default)]
pub struct FakeStore {
    trades: Mutex<HashMap<(String, u16), Trade>>,
    logs: Mutex<Vec<(Option<String>, SystemLogKind, String)>>,
    rounds: Mutex<HashMap<(String, u16), VotingRound>>,
    next_log_id: AtomicI64,
    paused: std::sync::atomic::AtomicBool,
}

impl FakeStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_trade(&self, trade: Trade) {
        self.trades
            .lock()
            .expect("lock poisoned")
            .insert((trade.run_id.clone(), trade.round), trade);
    }

    pub fn logged_kinds(&self) -> Vec<SystemLogKind> {
        self.logs.lock().expect("lock poisoned").iter().map(|(_, k, _)| *k).collect()
    }
}

#[async_trait]
impl Store for FakeStore {
    async fn next_numeric_run_id(&self) -> Result<u64> {
        Ok(1)
    }

    async fn create_run_tx(&self, _id: &str, _numeric_id: u64, _cfg: &RunConfig) -> Result<Run> {
        Err(OrchestratorError::StateInvariantViolation("not exercised by these tests".into()))
    }

    async fn get_run(&self, _run_id: &str) -> Result<Option<Run>> {
        Ok(None)
    }

    async fn list_non_terminal_runs(&self) -> Result<Vec<Run>> {
        Ok(vec![])
    }

    async fn transition_run_status_tx(
        &self,
        _run_id: &str,
        _new_status: RunStatus,
        _log_kind: SystemLogKind,
        _message: &str,
    ) -> Result<Run> {
        Err(OrchestratorError::StateInvariantViolation("not exercised by these tests".into()))
    }

    async fn advance_round_tx(&self, _run_id: &str, _current_round: u16) -> Result<Run> {
        Err(OrchestratorError::StateInvariantViolation("not exercised by these tests".into()))
    }

    async fn set_final_balance_tx(
        &self,
        _run_id: &str,
        _final_realized_balance: i64,
        _platform_fee_amount: i64,
    ) -> Result<Run> {
        Err(OrchestratorError::StateInvariantViolation("not exercised by these tests".into()))
    }

    async fn join_tx(&self, run_id: &str, user_id: &str, deposit: i64) -> Result<Participant> {
        Ok(Participant {
            run_id: run_id.to_string(),
            user_id: user_id.to_string(),
            deposit,
            withdrawn: false,
            final_share: None,
            joined_at: Utc::now(),
        })
    }

    async fn leave_tx(&self, _run_id: &str, _user_id: &str) -> Result<()> {
        Ok(())
    }

    async fn get_participant(&self, _run_id: &str, _user_id: &str) -> Result<Option<Participant>> {
        Ok(None)
    }

    async fn list_participants(&self, _run_id: &str) -> Result<Vec<Participant>> {
        Ok(vec![])
    }

    async fn count_participants(&self, _run_id: &str) -> Result<u32> {
        Ok(0)
    }

    async fn set_final_shares_tx(&self, _run_id: &str, _shares: &[(String, i64)]) -> Result<()> {
        Ok(())
    }

    async fn mark_withdrawn_tx(&self, run_id: &str, user_id: &str) -> Result<Participant> {
        Ok(Participant {
            run_id: run_id.to_string(),
            user_id: user_id.to_string(),
            deposit: 0,
            withdrawn: true,
            final_share: Some(0),
            joined_at: Utc::now(),
        })
    }

    async fn open_voting_round_tx(
        &self,
        run_id: &str,
        round: u16,
        current_price: Decimal,
    ) -> Result<VotingRound> {
        let voting_round = VotingRound {
            run_id: run_id.to_string(),
            round,
            status: run_core::models::RoundStatus::Open,
            current_price,
            vote_distribution: run_core::models::VoteDistribution::default(),
            opened_at: Utc::now(),
            closed_at: None,
            settled_at: None,
        };
        self.rounds
            .lock()
            .expect("lock poisoned")
            .insert((run_id.to_string(), round), voting_round.clone());
        Ok(voting_round)
    }

    async fn get_voting_round(&self, run_id: &str, round: u16) -> Result<Option<VotingRound>> {
        Ok(self.rounds.lock().expect("lock poisoned").get(&(run_id.to_string(), round)).cloned())
    }

    async fn list_rounds_in_executing(&self, _run_id: &str) -> Result<Vec<VotingRound>> {
        Ok(vec![])
    }

    async fn close_voting_round_tx(&self, run_id: &str, round: u16) -> Result<VotingRound> {
        self.get_voting_round(run_id, round)
            .await?
            .ok_or_else(|| OrchestratorError::StateInvariantViolation("round not seeded".into()))
    }

    async fn mark_round_executing_tx(&self, run_id: &str, round: u16) -> Result<VotingRound> {
        self.get_voting_round(run_id, round)
            .await?
            .ok_or_else(|| OrchestratorError::StateInvariantViolation("round not seeded".into()))
    }

    async fn mark_round_settled_tx(&self, run_id: &str, round: u16) -> Result<VotingRound> {
        self.get_voting_round(run_id, round)
            .await?
            .ok_or_else(|| OrchestratorError::StateInvariantViolation("round not seeded".into()))
    }

    async fn cast_vote_tx(
        &self,
        run_id: &str,
        user_id: &str,
        round: u16,
        choice: VoteChoice,
    ) -> Result<Vote> {
        Ok(Vote {
            run_id: run_id.to_string(),
            user_id: user_id.to_string(),
            round,
            choice,
            cast_at: Utc::now(),
        })
    }

    async fn get_vote(&self, _run_id: &str, _user_id: &str, _round: u16) -> Result<Option<Vote>> {
        Ok(None)
    }

    async fn record_trade_tx(&self, trade: &Trade) -> Result<Trade> {
        self.seed_trade(trade.clone());
        Ok(trade.clone())
    }

    async fn update_trade_exit_tx(
        &self,
        run_id: &str,
        round: u16,
        exit_price: Decimal,
        pnl: i64,
        closed_at: DateTime<Utc>,
    ) -> Result<Trade> {
        let mut trades = self.trades.lock().expect("lock poisoned");
        let trade = trades
            .get_mut(&(run_id.to_string(), round))
            .ok_or_else(|| OrchestratorError::StateInvariantViolation("trade not seeded".into()))?;
        trade.exit_price = Some(exit_price);
        trade.pnl = Some(pnl);
        trade.closed_at = Some(closed_at);
        Ok(trade.clone())
    }

    async fn get_trade(&self, run_id: &str, round: u16) -> Result<Option<Trade>> {
        Ok(self.trades.lock().expect("lock poisoned").get(&(run_id.to_string(), round)).cloned())
    }

    async fn list_trades(&self, run_id: &str) -> Result<Vec<Trade>> {
        Ok(self
            .trades
            .lock()
            .expect("lock poisoned")
            .values()
            .filter(|t| t.run_id == run_id)
            .cloned()
            .collect())
    }

    async fn append_system_log(
        &self,
        run_id: Option<&str>,
        kind: SystemLogKind,
        message: &str,
    ) -> Result<SystemLog> {
        self.logs
            .lock()
            .expect("lock poisoned")
            .push((run_id.map(str::to_string), kind, message.to_string()));
        Ok(SystemLog {
            id: self.next_log_id.fetch_add(1, Ordering::SeqCst),
            run_id: run_id.map(str::to_string),
            kind,
            message: message.to_string(),
            created_at: Utc::now(),
        })
    }

    async fn mark_chain_unsynced_tx(&self, _run_id: &str) -> Result<()> {
        Ok(())
    }

    async fn clear_chain_unsynced_tx(&self, _run_id: &str) -> Result<()> {
        Ok(())
    }

    async fn is_chain_unsynced(&self, _run_id: &str) -> Result<bool> {
        Ok(false)
    }

    async fn set_platform_paused(&self, paused: bool) -> Result<()> {
        self.paused.store(paused, Ordering::SeqCst);
        Ok(())
    }

    async fn is_platform_paused(&self) -> Result<bool> {
        Ok(self.paused.load(Ordering::SeqCst))
    }
}

/// `ChainAdapter` double that always succeeds without ever touching a real
/// RPC endpoint, for engine tests that only care whether `record_trade` is
/// called, never about the receipt itself.
#[derive(Default)]
pub struct FakeChain;

#[async_trait]
impl ChainAdapter for FakeChain {
    async fn create_run(&self, _numeric_run_id: u64, _cfg: &RunConfig) -> Result<ChainReceipt> {
        Ok(ChainReceipt { signature: "fake".into(), already_existed: false })
    }

    async fn create_run_vault(&self, _numeric_run_id: u64) -> Result<ChainReceipt> {
        Ok(ChainReceipt { signature: "fake".into(), already_existed: false })
    }

    async fn start_run(&self, _numeric_run_id: u64) -> Result<ChainReceipt> {
        Ok(ChainReceipt { signature: "fake".into(), already_existed: false })
    }

    async fn record_trade(&self, _numeric_run_id: u64, _round: u16, _trade: &Trade) -> Result<ChainReceipt> {
        Ok(ChainReceipt { signature: "fake".into(), already_existed: false })
    }

    async fn settle_run(
        &self,
        _numeric_run_id: u64,
        _final_balance: i64,
        _shares: &[(String, i64)],
    ) -> Result<ChainReceipt> {
        Ok(ChainReceipt { signature: "fake".into(), already_existed: false })
    }

    async fn withdraw(&self, _numeric_run_id: u64, _user_id: &str) -> Result<ChainReceipt> {
        Ok(ChainReceipt { signature: "fake".into(), already_existed: false })
    }
}

/// `DexAdapter` double whose `open_position`/`close_position` calls fail
/// `fail_first_n` times before succeeding, so the retry/backoff/degrade
/// path in `round_controller::execute_with_degrade` can be exercised
/// without a real exchange.
pub struct FlakyDex {
    available_collateral: i64,
    open_calls: AtomicI64,
    fail_first_n: i64,
    open_position: Mutex<Option<DexPosition>>,
}

impl FlakyDex {
    #[must_use]
    pub fn new(available_collateral: i64, fail_first_n: i64) -> Self {
        Self {
            available_collateral,
            open_calls: AtomicI64::new(0),
            fail_first_n,
            open_position: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn call_count(&self) -> i64 {
        self.open_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DexAdapter for FlakyDex {
    async fn get_account_info(&self) -> Result<DexAccountInfo> {
        Ok(DexAccountInfo { available_collateral: self.available_collateral })
    }

    async fn get_open_positions(&self) -> Result<Vec<DexPosition>> {
        Ok(self.open_position.lock().expect("lock poisoned").clone().into_iter().collect())
    }

    async fn get_oracle_price(&self, _market_symbol: &str) -> Result<Decimal> {
        Ok(Decimal::ONE)
    }

    async fn open_position(
        &self,
        market_symbol: &str,
        direction: PositionDirection,
        base_amount: Decimal,
        _leverage: Decimal,
    ) -> Result<OpenPositionReceipt> {
        let attempt = self.open_calls.fetch_add(1, Ordering::SeqCst);
        if attempt < self.fail_first_n {
            return Err(OrchestratorError::ExternalTransient {
                service: "dex".into(),
                source: anyhow::anyhow!("simulated transient failure"),
            });
        }
        let entry_price = Decimal::from(100);
        *self.open_position.lock().expect("lock poisoned") = Some(DexPosition {
            market_symbol: market_symbol.to_string(),
            direction,
            base_amount,
            entry_price,
        });
        Ok(OpenPositionReceipt { transaction_id: "fake".into(), entry_price })
    }

    async fn close_position(&self, _market_symbol: &str) -> Result<ClosePositionReceipt> {
        *self.open_position.lock().expect("lock poisoned") = None;
        Ok(ClosePositionReceipt {
            transaction_id: "fake".into(),
            exit_price: Decimal::from(100),
            realized_pnl: 0,
        })
    }
}

/// `BroadcastBus` double with a single global channel; engine tests don't
/// assert on delivery, so per-run topic isolation isn't worth modeling here
/// (see `run-broadcast::Bus` for that).
pub struct FakeBus {
    sender: broadcast::Sender<Event>,
}

impl Default for FakeBus {
    fn default() -> Self {
        let (sender, _) = broadcast::channel(64);
        Self { sender }
    }
}

#[async_trait]
impl BroadcastBus for FakeBus {
    fn publish(&self, event: Event) {
        let _ = self.sender.send(event);
    }

    async fn subscribe_run(&self, _run_id: &str) -> (Option<Event>, broadcast::Receiver<Event>) {
        (None, self.sender.subscribe())
    }

    fn subscribe_global(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }
}

/// `PriceOracle` double returning a fixed price, never stale.
pub struct FakeOracle {
    price: Decimal,
}

impl FakeOracle {
    #[must_use]
    pub fn new(price: Decimal) -> Self {
        Self { price }
    }
}

#[async_trait]
impl PriceOracle for FakeOracle {
    async fn latest(&self, _symbol: &str) -> Result<PriceSample> {
        Ok(PriceSample { price: self.price, source: PriceSource::BinanceRest, timestamp: Utc::now() })
    }
}
