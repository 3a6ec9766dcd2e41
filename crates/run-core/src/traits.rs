//! Component seams the orchestrator is built against, generalized from the
//! reference workspace's `core::traits` (`DataProvider` / `Strategy` /
//! `ExecutionHandler` / `RiskManager`) into the five collaborators spec §2
//! names: `Store`, `BroadcastBus`, `PriceOracle`, `ChainAdapter`,
//! `DexAdapter`.

use crate::errors::Result;
use crate::events::Event;
use crate::models::{
    Participant, PositionDirection, Run, RunConfig, RunStatus, SystemLog, SystemLogKind, Trade,
    Vote, VoteChoice, VotingRound,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Durable record of runs, participants, votes, rounds, trades, and system
/// logs (spec §2 "Store", §6 persistence schema). Every method that mutates
/// more than one row is transactional: it either commits the full set of
/// writes (including the `SystemLog` audit row) or none of them.
#[async_trait]
pub trait Store: Send + Sync {
    /// Allocates the next strictly-monotonic numeric run id. The sole
    /// resolution to spec §9's "two runs in the same millisecond collide"
    /// open question: an atomic counter, not a timestamp derivation.
    async fn next_numeric_run_id(&self) -> Result<u64>;

    /// Inserts the new `Run` row in `WAITING` plus its `RUN_CREATED`
    /// `SystemLog`, one transaction.
    async fn create_run_tx(&self, id: &str, numeric_id: u64, cfg: &RunConfig) -> Result<Run>;

    async fn get_run(&self, run_id: &str) -> Result<Option<Run>>;

    /// Runs currently in a non-terminal status, used by the scheduler on
    /// startup (crash recovery, spec §4.2) and to enforce the single-run
    /// invariant (spec §4.9).
    async fn list_non_terminal_runs(&self) -> Result<Vec<Run>>;

    /// Atomically transitions `run_id` to `new_status`, stamps the
    /// corresponding timestamp (`started_at`/`ended_at`), and writes a
    /// `SystemLog` row, all in one transaction (spec §4.1).
    async fn transition_run_status_tx(
        &self,
        run_id: &str,
        new_status: RunStatus,
        log_kind: SystemLogKind,
        message: &str,
    ) -> Result<Run>;

    async fn advance_round_tx(&self, run_id: &str, current_round: u16) -> Result<Run>;

    async fn set_final_balance_tx(
        &self,
        run_id: &str,
        final_realized_balance: i64,
        platform_fee_amount: i64,
    ) -> Result<Run>;

    /// Inserts a `Participant` and atomically increments `total_pool` by
    /// `deposit` in the same transaction — a conditional `UPDATE`, never a
    /// read-modify-write (spec §5).
    async fn join_tx(&self, run_id: &str, user_id: &str, deposit: i64) -> Result<Participant>;

    async fn leave_tx(&self, run_id: &str, user_id: &str) -> Result<()>;

    async fn get_participant(&self, run_id: &str, user_id: &str) -> Result<Option<Participant>>;

    async fn list_participants(&self, run_id: &str) -> Result<Vec<Participant>>;

    async fn count_participants(&self, run_id: &str) -> Result<u32>;

    /// Sets `final_share` for every participant of `run_id`, one
    /// transaction (spec §4.1 `withdraw`, §8 property 5).
    async fn set_final_shares_tx(&self, run_id: &str, shares: &[(String, i64)]) -> Result<()>;

    async fn mark_withdrawn_tx(&self, run_id: &str, user_id: &str) -> Result<Participant>;

    async fn open_voting_round_tx(
        &self,
        run_id: &str,
        round: u16,
        current_price: Decimal,
    ) -> Result<VotingRound>;

    async fn get_voting_round(&self, run_id: &str, round: u16) -> Result<Option<VotingRound>>;

    /// Finds rounds left in `EXECUTING` by a crash, for restart recovery
    /// (spec §4.3, scenario S6).
    async fn list_rounds_in_executing(&self, run_id: &str) -> Result<Vec<VotingRound>>;

    /// Reads every vote for `(run_id, round)`, computes and persists the
    /// `VoteDistribution`, and marks the round `CLOSED`, one transaction
    /// (spec §4.3 CLOSED phase).
    async fn close_voting_round_tx(&self, run_id: &str, round: u16) -> Result<VotingRound>;

    async fn mark_round_executing_tx(&self, run_id: &str, round: u16) -> Result<VotingRound>;

    async fn mark_round_settled_tx(&self, run_id: &str, round: u16) -> Result<VotingRound>;

    /// Inserts a vote iff the round is `OPEN` and the user has not already
    /// voted in it; returns `DuplicateVote` or `VoteWindowClosed` otherwise
    /// (spec §4.1 `vote`, §8 property 6).
    async fn cast_vote_tx(
        &self,
        run_id: &str,
        user_id: &str,
        round: u16,
        choice: VoteChoice,
    ) -> Result<Vote>;

    async fn get_vote(&self, run_id: &str, user_id: &str, round: u16) -> Result<Option<Vote>>;

    /// Persists a `Trade` row and stamps the owning `VotingRound` `SETTLED`,
    /// one transaction (spec §4.3 SETTLED phase, §4.4 step 7).
    async fn record_trade_tx(&self, trade: &Trade) -> Result<Trade>;

    async fn update_trade_exit_tx(
        &self,
        run_id: &str,
        round: u16,
        exit_price: Decimal,
        pnl: i64,
        closed_at: DateTime<Utc>,
    ) -> Result<Trade>;

    async fn get_trade(&self, run_id: &str, round: u16) -> Result<Option<Trade>>;

    async fn list_trades(&self, run_id: &str) -> Result<Vec<Trade>>;

    async fn append_system_log(
        &self,
        run_id: Option<&str>,
        kind: SystemLogKind,
        message: &str,
    ) -> Result<SystemLog>;

    /// Flags a run's on-chain counterpart as missing so the scheduler's
    /// self-heal path (`ChainAdapter::sync`) picks it up (spec §4.1, §7).
    async fn mark_chain_unsynced_tx(&self, run_id: &str) -> Result<()>;

    async fn clear_chain_unsynced_tx(&self, run_id: &str) -> Result<()>;

    async fn is_chain_unsynced(&self, run_id: &str) -> Result<bool>;

    /// Admin `pausePlatform()` / `unpausePlatform()` (spec §6): persisted so
    /// a one-shot admin CLI invocation and the long-running scheduler
    /// process agree on the current state without sharing memory.
    async fn set_platform_paused(&self, paused: bool) -> Result<()>;

    async fn is_platform_paused(&self) -> Result<bool>;
}

/// Publish/subscribe bus for the typed events of spec §4.8 / §6. Delivery
/// is best-effort: slow subscribers are dropped, producers never block.
#[async_trait]
pub trait BroadcastBus: Send + Sync {
    /// Publishes to subscribers of `run_id` (and the global topic for
    /// run-agnostic events such as `PriceUpdate`). Never blocks or errors on
    /// a full subscriber queue — that subscriber simply lags.
    fn publish(&self, event: Event);

    /// Subscribes to a specific run's events. The returned snapshot (if the
    /// run is known) is the current `RunUpdate`; callers must deliver it to
    /// the new subscriber *before* anything read off the receiver, since a
    /// `broadcast::Receiver` has no way to carry a per-subscriber initial
    /// message of its own (re-subscribe semantics, spec §4.8).
    async fn subscribe_run(
        &self,
        run_id: &str,
    ) -> (Option<Event>, tokio::sync::broadcast::Receiver<Event>);

    /// Subscribes to platform-wide events (e.g. `PriceUpdate`).
    fn subscribe_global(&self) -> tokio::sync::broadcast::Receiver<Event>;
}

/// A single price sample with source provenance (spec §4.5).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceSample {
    pub price: Decimal,
    pub source: PriceSource,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSource {
    DriftOracle,
    BinanceWs,
    BinanceRest,
}

impl PriceSource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DriftOracle => "drift-oracle",
            Self::BinanceWs => "binance-ws",
            Self::BinanceRest => "binance-rest",
        }
    }
}

/// Continuously-updated latest-price feed (spec §4.5). Staleness is judged
/// by the caller against `PriceSample::timestamp`, not swallowed here.
#[async_trait]
pub trait PriceOracle: Send + Sync {
    async fn latest(&self, symbol: &str) -> Result<PriceSample>;
}

/// Outcome of a chain instruction call: the transaction signature plus
/// whether the call was a no-op because the target account already existed
/// (idempotent resubmission, spec §4.6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainReceipt {
    pub signature: String,
    pub already_existed: bool,
}

/// Client-side issuance of the fixed instruction set against the on-chain
/// program (spec §4.6). This is a client; the program itself is out of
/// scope (spec §1).
#[async_trait]
pub trait ChainAdapter: Send + Sync {
    async fn create_run(&self, numeric_run_id: u64, cfg: &RunConfig) -> Result<ChainReceipt>;

    async fn create_run_vault(&self, numeric_run_id: u64) -> Result<ChainReceipt>;

    async fn start_run(&self, numeric_run_id: u64) -> Result<ChainReceipt>;

    async fn record_trade(&self, numeric_run_id: u64, round: u16, trade: &Trade) -> Result<ChainReceipt>;

    async fn settle_run(
        &self,
        numeric_run_id: u64,
        final_balance: i64,
        shares: &[(String, i64)],
    ) -> Result<ChainReceipt>;

    async fn withdraw(&self, numeric_run_id: u64, user_id: &str) -> Result<ChainReceipt>;

    /// Self-heal helper: issues `create_run` + `create_run_vault` for a run
    /// flagged "unsynced" (spec §4.6, §7).
    async fn sync(&self, numeric_run_id: u64, cfg: &RunConfig) -> Result<()> {
        self.create_run(numeric_run_id, cfg).await?;
        self.create_run_vault(numeric_run_id).await?;
        Ok(())
    }
}

/// Open position summary from the exchange (spec §4.7 `getOpenPositions`).
#[derive(Debug, Clone, PartialEq)]
pub struct DexPosition {
    pub market_symbol: String,
    pub direction: PositionDirection,
    pub base_amount: Decimal,
    pub entry_price: Decimal,
}

/// Account equity snapshot (spec §4.7 `getAccountInfo`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DexAccountInfo {
    pub available_collateral: i64,
}

/// Perp-position open/close contract the real and mock DEX implementations
/// both satisfy (spec §4.7, Design Note "capability interface with two
/// implementations").
#[async_trait]
pub trait DexAdapter: Send + Sync {
    async fn get_account_info(&self) -> Result<DexAccountInfo>;

    async fn get_open_positions(&self) -> Result<Vec<DexPosition>>;

    async fn get_oracle_price(&self, market_symbol: &str) -> Result<Decimal>;

    async fn open_position(
        &self,
        market_symbol: &str,
        direction: PositionDirection,
        base_amount: Decimal,
        leverage: Decimal,
    ) -> Result<OpenPositionReceipt>;

    async fn close_position(&self, market_symbol: &str) -> Result<ClosePositionReceipt>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct OpenPositionReceipt {
    pub transaction_id: String,
    pub entry_price: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClosePositionReceipt {
    pub transaction_id: String,
    pub exit_price: Decimal,
    pub realized_pnl: i64,
}
