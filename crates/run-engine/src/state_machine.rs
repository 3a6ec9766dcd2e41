//! Run State Machine (spec §4.1): pure guards over the transition table,
//! kept free of I/O so they are unit-testable without a `Store`. Actual
//! transitions are issued by `actor.rs` via `Store::transition_run_status_tx`;
//! this module only decides *whether* one should happen.

use run_core::errors::{OrchestratorError, Result};
use run_core::models::{Run, RunStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LobbyOutcome {
    Activate,
    Cancel,
}

/// WAITING -> ACTIVE requires at least one participant; otherwise CANCELLED.
#[must_use]
pub const fn lobby_outcome(participant_count: u32) -> LobbyOutcome {
    if participant_count >= 1 {
        LobbyOutcome::Activate
    } else {
        LobbyOutcome::Cancel
    }
}

/// Guards `join` (spec §4.1): status, capacity, and deposit bounds.
///
/// # Errors
/// Returns `LobbyClosed`, `LobbyFull`, or `DepositOutOfRange` on the first
/// violated precondition.
pub fn validate_join(run: &Run, participant_count: u32, deposit: i64) -> Result<()> {
    if run.status != RunStatus::Waiting {
        return Err(OrchestratorError::LobbyClosed {
            run_id: run.id.clone(),
        });
    }
    if participant_count >= run.max_participants {
        return Err(OrchestratorError::LobbyFull {
            run_id: run.id.clone(),
        });
    }
    if deposit < run.min_deposit || deposit > run.max_deposit {
        return Err(OrchestratorError::DepositOutOfRange {
            amount: deposit,
            min: run.min_deposit,
            max: run.max_deposit,
        });
    }
    Ok(())
}

/// Guards `leave` (spec §4.1): only while the lobby is still open.
///
/// # Errors
/// Returns `LobbyClosed` if the run has already left WAITING.
pub fn validate_leave(run: &Run) -> Result<()> {
    if run.status != RunStatus::Waiting {
        return Err(OrchestratorError::LobbyClosed {
            run_id: run.id.clone(),
        });
    }
    Ok(())
}

/// Guards `withdraw` (spec §4.1): only after settlement has posted a final
/// share. Idempotent — callers that already withdrew get `Ok(())` back from
/// the caller, not an error, so this only rejects the premature case.
///
/// # Errors
/// Returns `StateInvariantViolation` if the run has not reached ENDED.
pub fn validate_withdraw(run: &Run) -> Result<()> {
    if run.status != RunStatus::Ended {
        return Err(OrchestratorError::StateInvariantViolation(format!(
            "withdraw requested for run {} before it reached ENDED (status {:?})",
            run.id, run.status
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_run(status: RunStatus) -> Run {
        Run {
            id: "run-1".to_string(),
            numeric_id: 1,
            pair: "SOL/USDC".to_string(),
            status,
            lobby_duration_seconds: 600,
            round_duration_seconds: 600,
            cooldown_seconds: 60,
            total_rounds: 6,
            current_round: 0,
            min_deposit: 10,
            max_deposit: 100,
            max_participants: 2,
            total_pool: 0,
            platform_fee_bps: 1_500,
            created_at: Utc::now(),
            started_at: None,
            ended_at: None,
        }
    }

    #[test]
    fn lobby_outcome_activates_with_one_participant() {
        assert_eq!(lobby_outcome(1), LobbyOutcome::Activate);
    }

    #[test]
    fn lobby_outcome_cancels_empty_lobby() {
        assert_eq!(lobby_outcome(0), LobbyOutcome::Cancel);
    }

    #[test]
    fn join_rejects_once_lobby_full() {
        let run = sample_run(RunStatus::Waiting);
        assert!(validate_join(&run, 2, 50).is_err());
    }

    #[test]
    fn join_rejects_deposit_out_of_range() {
        let run = sample_run(RunStatus::Waiting);
        assert!(validate_join(&run, 0, 5).is_err());
    }

    #[test]
    fn join_rejects_outside_waiting() {
        let run = sample_run(RunStatus::Active);
        assert!(validate_join(&run, 0, 50).is_err());
    }

    #[test]
    fn leave_rejects_outside_waiting() {
        let run = sample_run(RunStatus::Active);
        assert!(validate_leave(&run).is_err());
    }

    #[test]
    fn withdraw_rejects_before_ended() {
        let run = sample_run(RunStatus::Cooldown);
        assert!(validate_withdraw(&run).is_err());
    }

    #[test]
    fn withdraw_allows_ended() {
        let run = sample_run(RunStatus::Ended);
        assert!(validate_withdraw(&run).is_ok());
    }
}
