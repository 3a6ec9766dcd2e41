//! Raw row shapes and the enum<->TEXT mapping between Postgres and
//! `run-core`'s domain enums. Kept separate from the repositories so the
//! `FromRow` derives stay next to the conversion logic, mirroring how the
//! reference workspace's `data/src/models/*.rs` keep `FromRow` structs next
//! to their domain conversions.

use run_core::errors::{OrchestratorError, Result};
use run_core::models::{
    Participant, Run, RunStatus, SystemLog, SystemLogKind, Trade, TradeDirection, Vote,
    VoteChoice, VoteDistribution, VotingRound, RoundStatus,
};
use rust_decimal::Decimal;

pub fn status_to_str(status: RunStatus) -> &'static str {
    match status {
        RunStatus::Waiting => "WAITING",
        RunStatus::Active => "ACTIVE",
        RunStatus::Settling => "SETTLING",
        RunStatus::Cooldown => "COOLDOWN",
        RunStatus::Ended => "ENDED",
        RunStatus::Cancelled => "CANCELLED",
    }
}

pub fn str_to_status(s: &str) -> Result<RunStatus> {
    Ok(match s {
        "WAITING" => RunStatus::Waiting,
        "ACTIVE" => RunStatus::Active,
        "SETTLING" => RunStatus::Settling,
        "COOLDOWN" => RunStatus::Cooldown,
        "ENDED" => RunStatus::Ended,
        "CANCELLED" => RunStatus::Cancelled,
        other => {
            return Err(OrchestratorError::StateInvariantViolation(format!(
                "unknown run status in store: {other}"
            )))
        }
    })
}

pub fn round_status_to_str(status: RoundStatus) -> &'static str {
    match status {
        RoundStatus::Open => "OPEN",
        RoundStatus::Closed => "CLOSED",
        RoundStatus::Executing => "EXECUTING",
        RoundStatus::Settled => "SETTLED",
    }
}

pub fn str_to_round_status(s: &str) -> Result<RoundStatus> {
    Ok(match s {
        "OPEN" => RoundStatus::Open,
        "CLOSED" => RoundStatus::Closed,
        "EXECUTING" => RoundStatus::Executing,
        "SETTLED" => RoundStatus::Settled,
        other => {
            return Err(OrchestratorError::StateInvariantViolation(format!(
                "unknown round status in store: {other}"
            )))
        }
    })
}

pub fn choice_to_str(choice: VoteChoice) -> &'static str {
    match choice {
        VoteChoice::Long => "LONG",
        VoteChoice::Short => "SHORT",
        VoteChoice::Skip => "SKIP",
    }
}

pub fn str_to_choice(s: &str) -> Result<VoteChoice> {
    Ok(match s {
        "LONG" => VoteChoice::Long,
        "SHORT" => VoteChoice::Short,
        "SKIP" => VoteChoice::Skip,
        other => {
            return Err(OrchestratorError::StateInvariantViolation(format!(
                "unknown vote choice in store: {other}"
            )))
        }
    })
}

pub fn direction_to_str(direction: TradeDirection) -> &'static str {
    match direction {
        TradeDirection::Long => "LONG",
        TradeDirection::Short => "SHORT",
        TradeDirection::Skip => "SKIP",
    }
}

pub fn str_to_direction(s: &str) -> Result<TradeDirection> {
    Ok(match s {
        "LONG" => TradeDirection::Long,
        "SHORT" => TradeDirection::Short,
        "SKIP" => TradeDirection::Skip,
        other => {
            return Err(OrchestratorError::StateInvariantViolation(format!(
                "unknown trade direction in store: {other}"
            )))
        }
    })
}

pub fn log_kind_to_str(kind: SystemLogKind) -> &'static str {
    match kind {
        SystemLogKind::RunCreated => "RUN_CREATED",
        SystemLogKind::RunStateChanged => "RUN_STATE_CHANGED",
        SystemLogKind::UserJoined => "USER_JOINED",
        SystemLogKind::UserLeft => "USER_LEFT",
        SystemLogKind::RoundOpened => "ROUND_OPENED",
        SystemLogKind::RoundClosed => "ROUND_CLOSED",
        SystemLogKind::TradeExecuted => "TRADE_EXECUTED",
        SystemLogKind::TradeDegraded => "TRADE_DEGRADED",
        SystemLogKind::OracleStale => "ORACLE_STALE",
        SystemLogKind::ExternalError => "EXTERNAL_ERROR",
        SystemLogKind::AdminAction => "ADMIN_ACTION",
        SystemLogKind::ChainUnsynced => "CHAIN_UNSYNCED",
    }
}

pub fn str_to_log_kind(s: &str) -> Result<SystemLogKind> {
    Ok(match s {
        "RUN_CREATED" => SystemLogKind::RunCreated,
        "RUN_STATE_CHANGED" => SystemLogKind::RunStateChanged,
        "USER_JOINED" => SystemLogKind::UserJoined,
        "USER_LEFT" => SystemLogKind::UserLeft,
        "ROUND_OPENED" => SystemLogKind::RoundOpened,
        "ROUND_CLOSED" => SystemLogKind::RoundClosed,
        "TRADE_EXECUTED" => SystemLogKind::TradeExecuted,
        "TRADE_DEGRADED" => SystemLogKind::TradeDegraded,
        "ORACLE_STALE" => SystemLogKind::OracleStale,
        "EXTERNAL_ERROR" => SystemLogKind::ExternalError,
        "ADMIN_ACTION" => SystemLogKind::AdminAction,
        "CHAIN_UNSYNCED" => SystemLogKind::ChainUnsynced,
        other => {
            return Err(OrchestratorError::StateInvariantViolation(format!(
                "unknown system log kind in store: {other}"
            )))
        }
    })
}

#[derive(Debug, sqlx::FromRow)]
pub struct RunRow {
    pub id: String,
    pub numeric_id: i64,
    pub pair: String,
    pub status: String,
    pub lobby_duration_seconds: i32,
    pub round_duration_seconds: i32,
    pub cooldown_seconds: i32,
    pub total_rounds: i16,
    pub current_round: i16,
    pub min_deposit: i64,
    pub max_deposit: i64,
    pub max_participants: i32,
    pub total_pool: i64,
    pub platform_fee_bps: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub ended_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl RunRow {
    pub fn into_domain(self) -> Result<Run> {
        Ok(Run {
            id: self.id,
            numeric_id: u64::try_from(self.numeric_id).unwrap_or(0),
            pair: self.pair,
            status: str_to_status(&self.status)?,
            lobby_duration_seconds: u32::try_from(self.lobby_duration_seconds).unwrap_or(0),
            round_duration_seconds: u32::try_from(self.round_duration_seconds).unwrap_or(0),
            cooldown_seconds: u32::try_from(self.cooldown_seconds).unwrap_or(0),
            total_rounds: u16::try_from(self.total_rounds).unwrap_or(0),
            current_round: u16::try_from(self.current_round).unwrap_or(0),
            min_deposit: self.min_deposit,
            max_deposit: self.max_deposit,
            max_participants: u32::try_from(self.max_participants).unwrap_or(0),
            total_pool: self.total_pool,
            platform_fee_bps: u32::try_from(self.platform_fee_bps).unwrap_or(0),
            created_at: self.created_at,
            started_at: self.started_at,
            ended_at: self.ended_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct ParticipantRow {
    pub run_id: String,
    pub user_id: String,
    pub deposit: i64,
    pub withdrawn: bool,
    pub final_share: Option<i64>,
    pub joined_at: chrono::DateTime<chrono::Utc>,
}

impl ParticipantRow {
    pub fn into_domain(self) -> Participant {
        Participant {
            run_id: self.run_id,
            user_id: self.user_id,
            deposit: self.deposit,
            withdrawn: self.withdrawn,
            final_share: self.final_share,
            joined_at: self.joined_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct VotingRoundRow {
    pub run_id: String,
    pub round: i16,
    pub status: String,
    pub current_price: Decimal,
    pub vote_long: i32,
    pub vote_short: i32,
    pub vote_skip: i32,
    pub opened_at: chrono::DateTime<chrono::Utc>,
    pub closed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub settled_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl VotingRoundRow {
    pub fn into_domain(self) -> Result<VotingRound> {
        Ok(VotingRound {
            run_id: self.run_id,
            round: u16::try_from(self.round).unwrap_or(0),
            status: str_to_round_status(&self.status)?,
            current_price: self.current_price,
            vote_distribution: VoteDistribution {
                long: u32::try_from(self.vote_long).unwrap_or(0),
                short: u32::try_from(self.vote_short).unwrap_or(0),
                skip: u32::try_from(self.vote_skip).unwrap_or(0),
            },
            opened_at: self.opened_at,
            closed_at: self.closed_at,
            settled_at: self.settled_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct VoteRow {
    pub run_id: String,
    pub user_id: String,
    pub round: i16,
    pub choice: String,
    pub cast_at: chrono::DateTime<chrono::Utc>,
}

impl VoteRow {
    pub fn into_domain(self) -> Result<Vote> {
        Ok(Vote {
            run_id: self.run_id,
            user_id: self.user_id,
            round: u16::try_from(self.round).unwrap_or(0),
            choice: str_to_choice(&self.choice)?,
            cast_at: self.cast_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct TradeRow {
    pub run_id: String,
    pub round: i16,
    pub direction: String,
    pub leverage_tenths: i32,
    pub position_size_percent_tenths: i32,
    pub entry_price: Decimal,
    pub exit_price: Option<Decimal>,
    pub pnl: Option<i64>,
    pub opened_at: chrono::DateTime<chrono::Utc>,
    pub closed_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl TradeRow {
    pub fn into_domain(self) -> Result<Trade> {
        Ok(Trade {
            run_id: self.run_id,
            round: u16::try_from(self.round).unwrap_or(0),
            direction: str_to_direction(&self.direction)?,
            leverage_tenths: u32::try_from(self.leverage_tenths).unwrap_or(0),
            position_size_percent_tenths: u32::try_from(self.position_size_percent_tenths)
                .unwrap_or(0),
            entry_price: self.entry_price,
            exit_price: self.exit_price,
            pnl: self.pnl,
            opened_at: self.opened_at,
            closed_at: self.closed_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct SystemLogRow {
    pub id: i64,
    pub run_id: Option<String>,
    pub kind: String,
    pub message: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl SystemLogRow {
    pub fn into_domain(self) -> Result<SystemLog> {
        Ok(SystemLog {
            id: self.id,
            run_id: self.run_id,
            kind: str_to_log_kind(&self.kind)?,
            message: self.message,
            created_at: self.created_at,
        })
    }
}
