//! Messages accepted by a `RunActor`, generalized from the reference
//! workspace's `BotCommand` (`bot-orchestrator/src/commands.rs`): one
//! fire-and-forget variant per user/admin action, `GetStatus` round-tripping
//! through a `oneshot` reply.

use run_core::errors::Result;
use run_core::models::{Participant, Run, Vote, VoteChoice};
use tokio::sync::oneshot;

pub enum RunCommand {
    Join {
        user_id: String,
        deposit: i64,
        reply_to: oneshot::Sender<Result<Participant>>,
    },
    Leave {
        user_id: String,
        reply_to: oneshot::Sender<Result<()>>,
    },
    Vote {
        user_id: String,
        round: u16,
        choice: VoteChoice,
        reply_to: oneshot::Sender<Result<Vote>>,
    },
    Withdraw {
        user_id: String,
        reply_to: oneshot::Sender<Result<Participant>>,
    },
    Cancel {
        reason: String,
        reply_to: oneshot::Sender<Result<()>>,
    },
    /// Admin `force_settle(runId)` (spec §6): close any open position and
    /// jump straight to SETTLING, skipping remaining rounds.
    ForceSettle {
        reply_to: oneshot::Sender<Result<()>>,
    },
    GetStatus(oneshot::Sender<Result<Run>>),
    Shutdown,
}
