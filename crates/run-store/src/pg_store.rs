//! `PgStore`: composes the per-entity repositories into the single
//! `run_core::traits::Store` implementation the rest of the orchestrator
//! depends on, mirroring how the reference workspace's `PostgresDataStore`
//! composes its table-scoped repository structs behind one facade.

use crate::repositories::participant_repo::ParticipantRepository;
use crate::repositories::run_repo::RunRepository;
use crate::repositories::system_log_repo::SystemLogRepository;
use crate::repositories::trade_repo::TradeRepository;
use crate::repositories::vote_repo::VoteRepository;
use crate::repositories::voting_round_repo::VotingRoundRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use run_core::errors::Result;
use run_core::models::{
    Participant, Run, RunConfig, RunStatus, SystemLog, SystemLogKind, Trade, Vote, VoteChoice,
    VotingRound,
};
use run_core::traits::Store;
use rust_decimal::Decimal;
use sqlx::PgPool;

#[derive(Clone)]
pub struct PgStore {
    runs: RunRepository,
    participants: ParticipantRepository,
    voting_rounds: VotingRoundRepository,
    votes: VoteRepository,
    trades: TradeRepository,
    system_logs: SystemLogRepository,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            runs: RunRepository::new(pool.clone()),
            participants: ParticipantRepository::new(pool.clone()),
            voting_rounds: VotingRoundRepository::new(pool.clone()),
            votes: VoteRepository::new(pool.clone()),
            trades: TradeRepository::new(pool.clone()),
            system_logs: SystemLogRepository::new(pool),
        }
    }

    /// Runs the embedded schema migrations. Called once at startup, mirroring
    /// the reference workspace's `DataStore::run_migrations`.
    ///
    /// # Errors
    /// Propagates any migration failure as an `anyhow::Error`.
    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(self.runs.pool()).await?;
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn next_numeric_run_id(&self) -> Result<u64> {
        self.runs.next_numeric_run_id().await
    }

    async fn create_run_tx(&self, id: &str, numeric_id: u64, cfg: &RunConfig) -> Result<Run> {
        self.runs.create_run_tx(id, numeric_id, cfg).await
    }

    async fn get_run(&self, run_id: &str) -> Result<Option<Run>> {
        self.runs.get_run(run_id).await
    }

    async fn list_non_terminal_runs(&self) -> Result<Vec<Run>> {
        self.runs.list_non_terminal_runs().await
    }

    async fn transition_run_status_tx(
        &self,
        run_id: &str,
        new_status: RunStatus,
        log_kind: SystemLogKind,
        message: &str,
    ) -> Result<Run> {
        self.runs
            .transition_run_status_tx(run_id, new_status, log_kind, message)
            .await
    }

    async fn advance_round_tx(&self, run_id: &str, current_round: u16) -> Result<Run> {
        self.runs.advance_round_tx(run_id, current_round).await
    }

    async fn set_final_balance_tx(
        &self,
        run_id: &str,
        final_realized_balance: i64,
        platform_fee_amount: i64,
    ) -> Result<Run> {
        self.runs
            .set_final_balance_tx(run_id, final_realized_balance, platform_fee_amount)
            .await
    }

    async fn join_tx(&self, run_id: &str, user_id: &str, deposit: i64) -> Result<Participant> {
        self.participants.join_tx(run_id, user_id, deposit).await
    }

    async fn leave_tx(&self, run_id: &str, user_id: &str) -> Result<()> {
        self.participants.leave_tx(run_id, user_id).await
    }

    async fn get_participant(&self, run_id: &str, user_id: &str) -> Result<Option<Participant>> {
        self.participants.get_participant(run_id, user_id).await
    }

    async fn list_participants(&self, run_id: &str) -> Result<Vec<Participant>> {
        self.participants.list_participants(run_id).await
    }

    async fn count_participants(&self, run_id: &str) -> Result<u32> {
        self.participants.count_participants(run_id).await
    }

    async fn set_final_shares_tx(&self, run_id: &str, shares: &[(String, i64)]) -> Result<()> {
        self.participants.set_final_shares_tx(run_id, shares).await
    }

    async fn mark_withdrawn_tx(&self, run_id: &str, user_id: &str) -> Result<Participant> {
        self.participants.mark_withdrawn_tx(run_id, user_id).await
    }

    async fn open_voting_round_tx(
        &self,
        run_id: &str,
        round: u16,
        current_price: Decimal,
    ) -> Result<VotingRound> {
        self.voting_rounds
            .open_voting_round_tx(run_id, round, current_price)
            .await
    }

    async fn get_voting_round(&self, run_id: &str, round: u16) -> Result<Option<VotingRound>> {
        self.voting_rounds.get_voting_round(run_id, round).await
    }

    async fn list_rounds_in_executing(&self, run_id: &str) -> Result<Vec<VotingRound>> {
        self.voting_rounds.list_rounds_in_executing(run_id).await
    }

    async fn close_voting_round_tx(&self, run_id: &str, round: u16) -> Result<VotingRound> {
        self.voting_rounds.close_voting_round_tx(run_id, round).await
    }

    async fn mark_round_executing_tx(&self, run_id: &str, round: u16) -> Result<VotingRound> {
        self.voting_rounds
            .mark_round_executing_tx(run_id, round)
            .await
    }

    async fn mark_round_settled_tx(&self, run_id: &str, round: u16) -> Result<VotingRound> {
        self.voting_rounds
            .mark_round_settled_tx(run_id, round)
            .await
    }

    async fn cast_vote_tx(
        &self,
        run_id: &str,
        user_id: &str,
        round: u16,
        choice: VoteChoice,
    ) -> Result<Vote> {
        self.votes.cast_vote_tx(run_id, user_id, round, choice).await
    }

    async fn get_vote(&self, run_id: &str, user_id: &str, round: u16) -> Result<Option<Vote>> {
        self.votes.get_vote(run_id, user_id, round).await
    }

    async fn record_trade_tx(&self, trade: &Trade) -> Result<Trade> {
        self.trades.record_trade_tx(trade).await
    }

    async fn update_trade_exit_tx(
        &self,
        run_id: &str,
        round: u16,
        exit_price: Decimal,
        pnl: i64,
        closed_at: DateTime<Utc>,
    ) -> Result<Trade> {
        self.trades
            .update_trade_exit_tx(run_id, round, exit_price, pnl, closed_at)
            .await
    }

    async fn get_trade(&self, run_id: &str, round: u16) -> Result<Option<Trade>> {
        self.trades.get_trade(run_id, round).await
    }

    async fn list_trades(&self, run_id: &str) -> Result<Vec<Trade>> {
        self.trades.list_trades(run_id).await
    }

    async fn append_system_log(
        &self,
        run_id: Option<&str>,
        kind: SystemLogKind,
        message: &str,
    ) -> Result<SystemLog> {
        self.system_logs.append(run_id, kind, message).await
    }

    async fn mark_chain_unsynced_tx(&self, run_id: &str) -> Result<()> {
        self.runs.mark_chain_unsynced_tx(run_id).await
    }

    async fn clear_chain_unsynced_tx(&self, run_id: &str) -> Result<()> {
        self.runs.clear_chain_unsynced_tx(run_id).await
    }

    async fn is_chain_unsynced(&self, run_id: &str) -> Result<bool> {
        self.runs.is_chain_unsynced(run_id).await
    }

    async fn set_platform_paused(&self, paused: bool) -> Result<()> {
        self.runs.set_platform_paused(paused).await
    }

    async fn is_platform_paused(&self) -> Result<bool> {
        self.runs.is_platform_paused().await
    }
}
