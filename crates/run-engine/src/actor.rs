//! `RunActor`/`RunHandle`: one task owns one run end-to-end, generalized
//! from the reference workspace's `BotActor`/`BotHandle`
//! (`bot-orchestrator/src/bot_actor.rs`, `bot_handle.rs`) — a command
//! channel plus an internal phase loop, except here the phases are the
//! fixed WAITING/ACTIVE/SETTLING/COOLDOWN sequence of spec §4.1 rather than
//! a start/stop/pause toggle.

use crate::commands::RunCommand;
use crate::deps::RunDeps;
use crate::round_controller;
use crate::state_machine::{self, LobbyOutcome};
use crate::trade_executor;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use run_core::errors::{OrchestratorError, Result};
use run_core::events::Event;
use run_core::models::{
    Participant, Run, RunStatus, SystemLogKind, Vote, VoteChoice, VoteDistribution,
};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// Command-channel handle to a running `RunActor`. Cheap to clone; every
/// method is a channel send (plus a `oneshot` round-trip for reads).
#[derive(Clone)]
pub struct RunHandle {
    tx: mpsc::Sender<RunCommand>,
}

impl RunHandle {
    #[must_use]
    pub const fn new(tx: mpsc::Sender<RunCommand>) -> Self {
        Self { tx }
    }

    /// # Errors
    /// Returns an error if the actor has already shut down, or the actor's
    /// own validation/persistence call failed.
    pub async fn join(&self, user_id: String, deposit: i64) -> Result<Participant> {
        let (reply_to, rx) = oneshot::channel();
        self.send(RunCommand::Join {
            user_id,
            deposit,
            reply_to,
        })
        .await?;
        rx.await.map_err(channel_closed)?
    }

    /// # Errors
    /// See [`RunHandle::join`].
    pub async fn leave(&self, user_id: String) -> Result<()> {
        let (reply_to, rx) = oneshot::channel();
        self.send(RunCommand::Leave { user_id, reply_to }).await?;
        rx.await.map_err(channel_closed)?
    }

    /// # Errors
    /// See [`RunHandle::join`].
    pub async fn vote(&self, user_id: String, round: u16, choice: VoteChoice) -> Result<Vote> {
        let (reply_to, rx) = oneshot::channel();
        self.send(RunCommand::Vote {
            user_id,
            round,
            choice,
            reply_to,
        })
        .await?;
        rx.await.map_err(channel_closed)?
    }

    /// # Errors
    /// See [`RunHandle::join`].
    pub async fn withdraw(&self, user_id: String) -> Result<Participant> {
        let (reply_to, rx) = oneshot::channel();
        self.send(RunCommand::Withdraw { user_id, reply_to }).await?;
        rx.await.map_err(channel_closed)?
    }

    /// # Errors
    /// See [`RunHandle::join`].
    pub async fn cancel(&self, reason: String) -> Result<()> {
        let (reply_to, rx) = oneshot::channel();
        self.send(RunCommand::Cancel { reason, reply_to }).await?;
        rx.await.map_err(channel_closed)?
    }

    /// # Errors
    /// Returns an error if the actor has already shut down, or the run is
    /// not currently ACTIVE.
    pub async fn force_settle(&self) -> Result<()> {
        let (reply_to, rx) = oneshot::channel();
        self.send(RunCommand::ForceSettle { reply_to }).await?;
        rx.await.map_err(channel_closed)?
    }

    /// # Errors
    /// See [`RunHandle::join`].
    pub async fn status(&self) -> Result<Run> {
        let (reply_to, rx) = oneshot::channel();
        self.send(RunCommand::GetStatus(reply_to)).await?;
        rx.await.map_err(channel_closed)?
    }

    /// # Errors
    /// Returns an error if the actor has already shut down.
    pub async fn shutdown(&self) -> Result<()> {
        self.send(RunCommand::Shutdown).await
    }

    async fn send(&self, cmd: RunCommand) -> Result<()> {
        self.tx.send(cmd).await.map_err(|_| {
            OrchestratorError::StateInvariantViolation("run actor has already shut down".to_string())
        })
    }
}

fn channel_closed<T>(_: T) -> OrchestratorError {
    OrchestratorError::StateInvariantViolation("run actor dropped the reply channel".to_string())
}

/// Whether a wait loop should keep waiting or the actor is winding down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopSignal {
    Continue,
    Terminate,
}

pub struct RunActor {
    run_id: String,
    deps: RunDeps,
    rx: mpsc::Receiver<RunCommand>,
    /// Running tally for the round currently OPEN, for live `VoteUpdate`
    /// broadcasts; the authoritative count is recomputed by
    /// `Store::close_voting_round_tx` at CLOSE and this is discarded.
    live_tally: VoteDistribution,
    /// Per-run monotonic sequence counter (spec §5, §8 property 7). A fresh
    /// `RunActor` is the sole writer for exactly one run for its whole
    /// lifetime, so an instance field — not a process-wide static — is
    /// enough to satisfy "events emitted for run r are strictly ordered".
    seq: std::sync::atomic::AtomicU64,
}

impl RunActor {
    #[must_use]
    pub fn new(run_id: String, deps: RunDeps, rx: mpsc::Receiver<RunCommand>) -> Self {
        Self {
            run_id,
            deps,
            rx,
            live_tally: VoteDistribution::default(),
            seq: std::sync::atomic::AtomicU64::new(0),
        }
    }

    /// Drives the run from whatever status it is currently persisted in
    /// through to a terminal one. Safe to call again after a restart: every
    /// decision is derived from `Store`, never from in-memory state (spec
    /// §4.2 crash recovery).
    pub async fn run(mut self) {
        tracing::info!(run_id = %self.run_id, "run actor starting");
        loop {
            let run = match self.deps.store.get_run(&self.run_id).await {
                Ok(Some(run)) => run,
                Ok(None) => {
                    tracing::error!(run_id = %self.run_id, "run actor found no persisted run; exiting");
                    return;
                }
                Err(e) => {
                    tracing::error!(run_id = %self.run_id, error = %e, "failed to load run; exiting");
                    return;
                }
            };

            let signal = match run.status {
                RunStatus::Waiting => self.drive_waiting(&run).await,
                RunStatus::Active => self.drive_active(&run).await,
                RunStatus::Settling => self.drive_settling(&run).await,
                RunStatus::Cooldown => self.drive_cooldown(&run).await,
                RunStatus::Ended | RunStatus::Cancelled => {
                    tracing::info!(run_id = %self.run_id, status = ?run.status, "run actor reached a terminal status; exiting");
                    return;
                }
            };

            if let Err(e) = signal {
                tracing::error!(run_id = %self.run_id, error = %e, "run actor phase failed; exiting");
                return;
            }
            if signal == Ok(LoopSignal::Terminate) {
                return;
            }
        }
    }

    async fn wait_until(&mut self, deadline: DateTime<Utc>) -> LoopSignal {
        loop {
            let now = self.deps.clock.now();
            if now >= deadline {
                return LoopSignal::Continue;
            }
            let remaining = (deadline - now).to_std().unwrap_or(Duration::ZERO);
            tokio::select! {
                () = self.deps.clock.sleep(remaining) => {}
                maybe_cmd = self.rx.recv() => {
                    match maybe_cmd {
                        Some(cmd) => {
                            if self.handle_command(cmd).await == LoopSignal::Terminate {
                                return LoopSignal::Terminate;
                            }
                        }
                        None => return LoopSignal::Terminate,
                    }
                }
            }
        }
    }

    async fn drive_waiting(&mut self, run: &Run) -> Result<LoopSignal> {
        let deadline = run.created_at + ChronoDuration::seconds(i64::from(run.lobby_duration_seconds));
        if self.wait_until(deadline).await == LoopSignal::Terminate {
            return Ok(LoopSignal::Terminate);
        }

        let count = self.deps.store.count_participants(&run.id).await?;
        match state_machine::lobby_outcome(count) {
            LobbyOutcome::Activate => {
                let updated = self
                    .deps
                    .store
                    .transition_run_status_tx(
                        &run.id,
                        RunStatus::Active,
                        SystemLogKind::RunStateChanged,
                        &format!("lobby closed with {count} participants; run is now ACTIVE"),
                    )
                    .await?;
                self.publish_run_update(&updated);
            }
            LobbyOutcome::Cancel => {
                let updated = self
                    .deps
                    .store
                    .transition_run_status_tx(
                        &run.id,
                        RunStatus::Cancelled,
                        SystemLogKind::RunStateChanged,
                        "lobby closed with no participants; run CANCELLED",
                    )
                    .await?;
                self.publish_run_update(&updated);
            }
        }
        Ok(LoopSignal::Continue)
    }

    async fn drive_active(&mut self, run: &Run) -> Result<LoopSignal> {
        for round in self.deps.store.list_rounds_in_executing(&run.id).await? {
            round_controller::reconcile_executing_round(&self.deps, run, &round).await?;
        }

        for round in (run.current_round + 1)..=run.total_rounds {
            match self.drive_round(run, round).await? {
                LoopSignal::Terminate => return Ok(LoopSignal::Terminate),
                LoopSignal::Continue => {}
            }
            if self.deps.store.get_run(&run.id).await?.map(|r| r.status) != Some(RunStatus::Active) {
                return Ok(LoopSignal::Continue);
            }
        }

        let updated = self
            .deps
            .store
            .transition_run_status_tx(
                &run.id,
                RunStatus::Settling,
                SystemLogKind::RunStateChanged,
                "all rounds executed; run is now SETTLING",
            )
            .await?;
        self.publish_run_update(&updated);
        Ok(LoopSignal::Continue)
    }

    /// Runs one round's OPEN -> CLOSED -> EXECUTING -> SETTLED phases (spec
    /// §4.3). Returns `Terminate` if a shutdown/cancel arrived mid-round.
    async fn drive_round(&mut self, run: &Run, round: u16) -> Result<LoopSignal> {
        let sample = self.deps.oracle.latest(&run.pair).await?;
        let age = (self.deps.clock.now() - sample.timestamp).num_seconds();
        if age > self.deps.oracle_stale_seconds {
            self.deps
                .store
                .append_system_log(
                    Some(&run.id),
                    SystemLogKind::OracleStale,
                    &format!("oracle sample for {} is {age}s old at round {round} open; skipping remaining rounds", run.pair),
                )
                .await?;
            return Ok(LoopSignal::Continue);
        }

        // Close the previous round's position (if any) before opening a new
        // one — "opening round r+1 requires closing round r" (spec §4.4).
        if round > 1 {
            trade_executor::close_trade_if_open(&self.deps, run, round - 1).await?;
        }

        self.deps
            .store
            .open_voting_round_tx(&run.id, round, sample.price)
            .await?;
        self.live_tally = VoteDistribution::default();
        self.deps
            .store
            .append_system_log(Some(&run.id), SystemLogKind::RoundOpened, &format!("round {round} opened at {}", sample.price))
            .await?;
        self.publish_vote_update(&run.id, round, self.live_tally.clone());

        let voting_deadline = self.deps.clock.now() + ChronoDuration::seconds(i64::from(run.round_duration_seconds));
        if self.wait_until(voting_deadline).await == LoopSignal::Terminate {
            return Ok(LoopSignal::Terminate);
        }

        let closed = self.deps.store.close_voting_round_tx(&run.id, round).await?;
        self.deps
            .store
            .append_system_log(Some(&run.id), SystemLogKind::RoundClosed, &format!("round {round} closed"))
            .await?;
        self.publish_vote_update(&run.id, round, closed.vote_distribution.clone());

        self.deps.store.mark_round_executing_tx(&run.id, round).await?;
        let decision = closed.vote_distribution.majority();
        let trade = round_controller::execute_with_degrade(
            &self.deps,
            run,
            round,
            decision.into(),
            closed.current_price,
        )
        .await?;

        self.deps.store.mark_round_settled_tx(&run.id, round).await?;
        let updated = self.deps.store.advance_round_tx(&run.id, round).await?;
        self.publish_run_update(&updated);
        self.publish_trade_update(&run.id, trade);
        self.deps
            .store
            .append_system_log(Some(&run.id), SystemLogKind::TradeExecuted, &format!("round {round} trade executed"))
            .await?;

        Ok(LoopSignal::Continue)
    }

    async fn drive_settling(&mut self, run: &Run) -> Result<LoopSignal> {
        trade_executor::close_trade_if_open(&self.deps, run, run.total_rounds).await?;

        let trades = self.deps.store.list_trades(&run.id).await?;
        let pnl_sum: i64 = trades.iter().map(|t| t.pnl.unwrap_or(0)).sum();
        let final_balance = run.total_pool + pnl_sum;
        let positive_delta = (final_balance - run.total_pool).max(0);
        let platform_fee = (positive_delta * i64::from(run.platform_fee_bps)) / 10_000;

        let participants = self.deps.store.list_participants(&run.id).await?;
        let shares = compute_shares(&participants, run.total_pool, final_balance, platform_fee);

        let mut backoff = Duration::from_millis(self.deps.executor.backoff_base_ms);
        loop {
            match self.deps.chain.settle_run(run.numeric_id, final_balance, &shares).await {
                Ok(_) => break,
                Err(e) => {
                    self.deps
                        .store
                        .append_system_log(
                            Some(&run.id),
                            SystemLogKind::ExternalError,
                            &format!("settle_run failed, retrying: {e}"),
                        )
                        .await?;
                    let deadline = self.deps.clock.now() + ChronoDuration::from_std(backoff).unwrap_or_default();
                    if self.wait_until(deadline).await == LoopSignal::Terminate {
                        return Ok(LoopSignal::Terminate);
                    }
                    backoff = backoff
                        .saturating_mul(2)
                        .min(Duration::from_millis(self.deps.executor.backoff_cap_ms));
                }
            }
        }

        self.deps.store.set_final_shares_tx(&run.id, &shares).await?;
        self.deps
            .store
            .set_final_balance_tx(&run.id, final_balance, platform_fee)
            .await?;
        let updated = self
            .deps
            .store
            .transition_run_status_tx(
                &run.id,
                RunStatus::Cooldown,
                SystemLogKind::RunStateChanged,
                &format!("settled: final_balance={final_balance} platform_fee={platform_fee}"),
            )
            .await?;
        self.publish_run_update(&updated);
        Ok(LoopSignal::Continue)
    }

    async fn drive_cooldown(&mut self, run: &Run) -> Result<LoopSignal> {
        // The persisted schema has no dedicated cooldown-entry timestamp, so
        // a restart mid-cooldown waits the full interval again rather than
        // the exact remainder — idempotent, just not restart-exact.
        let deadline = self.deps.clock.now() + ChronoDuration::seconds(i64::from(run.cooldown_seconds));
        if self.wait_until(deadline).await == LoopSignal::Terminate {
            return Ok(LoopSignal::Terminate);
        }
        let updated = self
            .deps
            .store
            .transition_run_status_tx(&run.id, RunStatus::Ended, SystemLogKind::RunStateChanged, "cooldown elapsed; run ENDED")
            .await?;
        self.publish_run_update(&updated);
        Ok(LoopSignal::Continue)
    }

    async fn handle_command(&mut self, cmd: RunCommand) -> LoopSignal {
        match cmd {
            RunCommand::Join { user_id, deposit, reply_to } => {
                let result = self.handle_join(&user_id, deposit).await;
                let _ = reply_to.send(result);
                LoopSignal::Continue
            }
            RunCommand::Leave { user_id, reply_to } => {
                let result = self.handle_leave(&user_id).await;
                let _ = reply_to.send(result);
                LoopSignal::Continue
            }
            RunCommand::Vote { user_id, round, choice, reply_to } => {
                let result = self.handle_vote(&user_id, round, choice).await;
                let _ = reply_to.send(result);
                LoopSignal::Continue
            }
            RunCommand::Withdraw { user_id, reply_to } => {
                let result = self.handle_withdraw(&user_id).await;
                let _ = reply_to.send(result);
                LoopSignal::Continue
            }
            RunCommand::Cancel { reason, reply_to } => {
                let result = self.handle_cancel(&reason).await;
                let terminate = result.is_ok();
                let _ = reply_to.send(result);
                if terminate {
                    LoopSignal::Terminate
                } else {
                    LoopSignal::Continue
                }
            }
            RunCommand::ForceSettle { reply_to } => {
                let result = self.handle_force_settle().await;
                // Terminate this actor; the run is now persisted as
                // SETTLING and the scheduler's resume sweep spawns a fresh
                // actor for it next tick, which picks up `drive_settling`
                // purely from persisted state — the same path crash
                // recovery already takes.
                let terminate = result.is_ok();
                let _ = reply_to.send(result);
                if terminate {
                    LoopSignal::Terminate
                } else {
                    LoopSignal::Continue
                }
            }
            RunCommand::GetStatus(reply_to) => {
                let result = self
                    .deps
                    .store
                    .get_run(&self.run_id)
                    .await
                    .and_then(|maybe| maybe.ok_or_else(|| not_found(&self.run_id)));
                let _ = reply_to.send(result);
                LoopSignal::Continue
            }
            RunCommand::Shutdown => LoopSignal::Terminate,
        }
    }

    async fn handle_join(&self, user_id: &str, deposit: i64) -> Result<Participant> {
        let run = self.deps.store.get_run(&self.run_id).await?.ok_or_else(|| not_found(&self.run_id))?;
        let count = self.deps.store.count_participants(&run.id).await?;
        state_machine::validate_join(&run, count, deposit)?;
        let participant = self.deps.store.join_tx(&run.id, user_id, deposit).await?;
        self.deps
            .store
            .append_system_log(Some(&run.id), SystemLogKind::UserJoined, &format!("{user_id} joined with {deposit}"))
            .await?;
        if let Some(updated) = self.deps.store.get_run(&run.id).await? {
            self.publish_run_update(&updated);
        }
        Ok(participant)
    }

    async fn handle_leave(&self, user_id: &str) -> Result<()> {
        let run = self.deps.store.get_run(&self.run_id).await?.ok_or_else(|| not_found(&self.run_id))?;
        state_machine::validate_leave(&run)?;
        self.deps.store.leave_tx(&run.id, user_id).await?;
        self.deps
            .store
            .append_system_log(Some(&run.id), SystemLogKind::UserLeft, &format!("{user_id} left"))
            .await?;
        if let Some(updated) = self.deps.store.get_run(&run.id).await? {
            self.publish_run_update(&updated);
        }
        Ok(())
    }

    async fn handle_vote(&mut self, user_id: &str, round: u16, choice: VoteChoice) -> Result<Vote> {
        let vote = self.deps.store.cast_vote_tx(&self.run_id, user_id, round, choice).await?;
        match choice {
            VoteChoice::Long => self.live_tally.long += 1,
            VoteChoice::Short => self.live_tally.short += 1,
            VoteChoice::Skip => self.live_tally.skip += 1,
        }
        self.publish_vote_update(&self.run_id, round, self.live_tally.clone());
        Ok(vote)
    }

    async fn handle_withdraw(&self, user_id: &str) -> Result<Participant> {
        let run = self.deps.store.get_run(&self.run_id).await?.ok_or_else(|| not_found(&self.run_id))?;
        if let Some(existing) = self.deps.store.get_participant(&run.id, user_id).await? {
            if existing.withdrawn {
                return Ok(existing);
            }
        }
        state_machine::validate_withdraw(&run)?;
        self.deps.chain.withdraw(run.numeric_id, user_id).await?;
        self.deps.store.mark_withdrawn_tx(&run.id, user_id).await
    }

    /// Admin `force_settle(runId)` (spec §6): only meaningful for a run
    /// still ACTIVE. Closes whatever position is currently open, then
    /// transitions straight to SETTLING — the same degrade path oracle
    /// staleness takes (spec §4.5), just admin-triggered instead.
    async fn handle_force_settle(&self) -> Result<()> {
        let run = self.deps.store.get_run(&self.run_id).await?.ok_or_else(|| not_found(&self.run_id))?;
        if run.status != RunStatus::Active {
            return Err(OrchestratorError::StateInvariantViolation(format!(
                "force_settle requested for run {} while status is {:?}, expected ACTIVE",
                run.id, run.status
            )));
        }

        let trades = self.deps.store.list_trades(&run.id).await?;
        if let Some(open_trade) = trades.iter().find(|t| t.exit_price.is_none()) {
            trade_executor::close_trade_if_open(&self.deps, &run, open_trade.round).await?;
        }

        let updated = self
            .deps
            .store
            .transition_run_status_tx(
                &run.id,
                RunStatus::Settling,
                SystemLogKind::AdminAction,
                "force-settled by admin; remaining rounds skipped",
            )
            .await?;
        self.publish_run_update(&updated);
        Ok(())
    }

    async fn handle_cancel(&mut self, reason: &str) -> Result<()> {
        let run = self.deps.store.get_run(&self.run_id).await?.ok_or_else(|| not_found(&self.run_id))?;
        if run.status.is_terminal() {
            return Ok(());
        }

        if matches!(run.status, RunStatus::Active | RunStatus::Settling) {
            let market = trade_executor::market_symbol(&run.pair);
            if self.deps.dex.get_open_positions().await?.iter().any(|p| p.market_symbol == market) {
                let _ = self.deps.dex.close_position(&market).await;
            }
            let trades = self.deps.store.list_trades(&run.id).await?;
            let pnl_sum: i64 = trades.iter().map(|t| t.pnl.unwrap_or(0)).sum();
            let final_balance = run.total_pool + pnl_sum;
            let _ = self.deps.chain.settle_run(run.numeric_id, final_balance, &[]).await;
            self.deps.store.set_final_balance_tx(&run.id, final_balance, 0).await?;
        }

        let updated = self
            .deps
            .store
            .transition_run_status_tx(
                &run.id,
                RunStatus::Cancelled,
                SystemLogKind::AdminAction,
                &format!("cancelled: {reason}"),
            )
            .await?;
        self.publish_run_update(&updated);
        Ok(())
    }

    fn publish_run_update(&self, run: &Run) {
        let seq = self.next_seq();
        self.deps.bus.publish(Event::RunUpdate { run: run.clone(), seq });
    }

    fn publish_vote_update(&self, run_id: &str, round: u16, distribution: VoteDistribution) {
        let seq = self.next_seq();
        self.deps.bus.publish(Event::VoteUpdate {
            run_id: run_id.to_string(),
            round,
            distribution,
            seq,
        });
    }

    fn publish_trade_update(&self, run_id: &str, trade: run_core::models::Trade) {
        let seq = self.next_seq();
        self.deps.bus.publish(Event::TradeUpdate {
            run_id: run_id.to_string(),
            trade,
            seq,
        });
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, std::sync::atomic::Ordering::SeqCst)
    }
}

fn not_found(run_id: &str) -> OrchestratorError {
    OrchestratorError::StateInvariantViolation(format!("run {run_id} not found"))
}

/// Splits `final_balance - platform_fee` pro-rata by deposit, handing any
/// rounding remainder to the last participant so the sum always reconciles
/// exactly (spec §8 property 5).
fn compute_shares(
    participants: &[Participant],
    total_pool: i64,
    final_balance: i64,
    platform_fee: i64,
) -> Vec<(String, i64)> {
    if participants.is_empty() || total_pool == 0 {
        return Vec::new();
    }
    let distributable = final_balance - platform_fee;
    let mut shares = Vec::with_capacity(participants.len());
    let mut allocated = 0i64;
    for (i, p) in participants.iter().enumerate() {
        if i + 1 == participants.len() {
            shares.push((p.user_id.clone(), distributable - allocated));
        } else {
            let share = (distributable * p.deposit) / total_pool;
            allocated += share;
            shares.push((p.user_id.clone(), share));
        }
    }
    shares
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn participant(user_id: &str, deposit: i64) -> Participant {
        Participant {
            run_id: "run-1".to_string(),
            user_id: user_id.to_string(),
            deposit,
            withdrawn: false,
            final_share: None,
            joined_at: Utc::now(),
        }
    }

    #[test]
    fn compute_shares_splits_pro_rata_and_reconciles_exactly() {
        let participants = vec![participant("alice", 50), participant("bob", 50)];
        let shares = compute_shares(&participants, 100, 115, 15);
        let sum: i64 = shares.iter().map(|(_, s)| s).sum();
        assert_eq!(sum, 100);
    }

    #[test]
    fn compute_shares_handles_uneven_split_without_losing_a_unit() {
        let participants = vec![participant("alice", 33), participant("bob", 33), participant("carol", 34)];
        let shares = compute_shares(&participants, 100, 100, 0);
        let sum: i64 = shares.iter().map(|(_, s)| s).sum();
        assert_eq!(sum, 100);
    }

    #[test]
    fn compute_shares_empty_lobby_yields_nothing() {
        assert!(compute_shares(&[], 0, 0, 0).is_empty());
    }
}
