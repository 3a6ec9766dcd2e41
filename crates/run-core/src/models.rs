//! Domain types shared by every component of the orchestrator.
//!
//! All monetary amounts are signed 64-bit integers in the collateral asset's
//! smallest unit (6 decimals, matching a USDC-style stablecoin). Floats are
//! never used for money; prices use `Decimal` since they are compared and
//! multiplied but never summed into a settlement total.

use crate::errors::{OrchestratorError, Result};
use chrono::{DateTime, Utc};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Lifecycle status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunStatus {
    Waiting,
    Active,
    Settling,
    Cooldown,
    Ended,
    Cancelled,
}

impl RunStatus {
    /// Terminal statuses never transition further.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Ended | Self::Cancelled)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    /// Opaque id exposed to clients.
    pub id: String,
    /// Strictly monotonic numeric id, used as chaos-seed material and as the
    /// on-chain run id (see `run_chain_adapter::numeric_run_id`).
    pub numeric_id: u64,
    pub pair: String,
    pub status: RunStatus,
    pub lobby_duration_seconds: u32,
    pub round_duration_seconds: u32,
    pub cooldown_seconds: u32,
    pub total_rounds: u16,
    pub current_round: u16,
    pub min_deposit: i64,
    pub max_deposit: i64,
    pub max_participants: u32,
    pub total_pool: i64,
    pub platform_fee_bps: u32,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub run_id: String,
    pub user_id: String,
    /// Immutable once recorded; joining again is rejected, not amended.
    pub deposit: i64,
    pub withdrawn: bool,
    pub final_share: Option<i64>,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RoundStatus {
    Open,
    Closed,
    Executing,
    Settled,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoteDistribution {
    pub long: u32,
    pub short: u32,
    pub skip: u32,
}

impl VoteDistribution {
    /// The round's majority decision. Ties (including an all-skip round)
    /// resolve to `VoteChoice::Skip`, matching scenario S3.
    #[must_use]
    pub fn majority(&self) -> VoteChoice {
        if self.long > self.short && self.long > self.skip {
            VoteChoice::Long
        } else if self.short > self.long && self.short > self.skip {
            VoteChoice::Short
        } else {
            VoteChoice::Skip
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VotingRound {
    pub run_id: String,
    pub round: u16,
    pub status: RoundStatus,
    /// Reference price sampled when the round opened (spec §4.3 OPEN
    /// phase); the Trade Executor's entry/exit math is anchored to this
    /// value, not a fresh oracle read at execution time.
    pub current_price: Decimal,
    pub vote_distribution: VoteDistribution,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub settled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VoteChoice {
    Long,
    Short,
    Skip,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    pub run_id: String,
    pub user_id: String,
    pub round: u16,
    pub choice: VoteChoice,
    pub cast_at: DateTime<Utc>,
}

/// A trade's direction. Unlike a DEX position direction (which is always
/// long or short), a `Trade` row also records SKIP rounds (spec §3: "SKIP
/// trades carry zero leverage, zero size, zero pnl"), so `Skip` is a first
/// -class variant here rather than modeled as `Option<TradeDirection>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeDirection {
    Long,
    Short,
    Skip,
}

impl From<VoteChoice> for TradeDirection {
    fn from(choice: VoteChoice) -> Self {
        match choice {
            VoteChoice::Long => Self::Long,
            VoteChoice::Short => Self::Short,
            VoteChoice::Skip => Self::Skip,
        }
    }
}

/// A position direction accepted by the DEX adapter; SKIP rounds never
/// reach `DexAdapter::open_position` (spec §4.4 step 1), so this conversion
/// is partial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionDirection {
    Long,
    Short,
}

impl TryFrom<TradeDirection> for PositionDirection {
    type Error = ();

    fn try_from(direction: TradeDirection) -> std::result::Result<Self, Self::Error> {
        match direction {
            TradeDirection::Long => Ok(Self::Long),
            TradeDirection::Short => Ok(Self::Short),
            TradeDirection::Skip => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub run_id: String,
    pub round: u16,
    pub direction: TradeDirection,
    /// Leverage in tenths, e.g. `55` means 5.5x. Integer so the chaos draw's
    /// 0.1 step never falls out of floating-point representation.
    pub leverage_tenths: u32,
    /// Position size as a percentage of available collateral, in tenths.
    pub position_size_percent_tenths: u32,
    pub entry_price: Decimal,
    pub exit_price: Option<Decimal>,
    pub pnl: Option<i64>,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SystemLogKind {
    RunCreated,
    RunStateChanged,
    UserJoined,
    UserLeft,
    RoundOpened,
    RoundClosed,
    TradeExecuted,
    TradeDegraded,
    OracleStale,
    ExternalError,
    AdminAction,
    ChainUnsynced,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemLog {
    pub id: i64,
    pub run_id: Option<String>,
    pub kind: SystemLogKind,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

fn pair_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z]{2,10}/[A-Z]{2,10}$").expect("static regex is valid"))
}

/// Input to `createRun` (spec §4.1), validated before any chain or store
/// call is issued. Every bound here mirrors spec §4.1's literal ranges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub pair: String,
    pub duration_minutes: u32,
    pub voting_interval_minutes: u32,
    pub min_deposit: i64,
    pub max_deposit: i64,
    pub max_participants: u32,
    pub lobby_duration_seconds: u32,
    pub cooldown_seconds: u32,
    pub platform_fee_bps: u32,
}

impl RunConfig {
    /// Validates the config and returns the derived `total_rounds`.
    ///
    /// # Errors
    /// Returns `OrchestratorError::InvalidConfig` describing the first
    /// violated bound.
    pub fn validate(&self) -> Result<u16> {
        if !pair_regex().is_match(&self.pair) {
            return Err(OrchestratorError::InvalidConfig(format!(
                "pair {:?} does not match /^[A-Z]{{2,10}}/[A-Z]{{2,10}}$/",
                self.pair
            )));
        }
        if !(60..=480).contains(&self.duration_minutes) {
            return Err(OrchestratorError::InvalidConfig(format!(
                "duration_minutes {} outside [60, 480]",
                self.duration_minutes
            )));
        }
        if !(5..=60).contains(&self.voting_interval_minutes) {
            return Err(OrchestratorError::InvalidConfig(format!(
                "voting_interval_minutes {} outside [5, 60]",
                self.voting_interval_minutes
            )));
        }
        if !(10..=100).contains(&self.min_deposit) || !(10..=100).contains(&self.max_deposit) {
            return Err(OrchestratorError::InvalidConfig(format!(
                "min/max deposit {}/{} outside [10, 100]",
                self.min_deposit, self.max_deposit
            )));
        }
        if self.min_deposit > self.max_deposit {
            return Err(OrchestratorError::InvalidConfig(format!(
                "min_deposit {} exceeds max_deposit {}",
                self.min_deposit, self.max_deposit
            )));
        }
        if !(10..=100).contains(&self.max_participants) {
            return Err(OrchestratorError::InvalidConfig(format!(
                "max_participants {} outside [10, 100]",
                self.max_participants
            )));
        }
        let total_rounds = self.duration_minutes / self.voting_interval_minutes;
        if total_rounds < 1 {
            return Err(OrchestratorError::InvalidConfig(
                "duration/voting_interval must yield at least one round".to_string(),
            ));
        }
        Ok(u16::try_from(total_rounds).unwrap_or(u16::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> RunConfig {
        RunConfig {
            pair: "SOL/USDC".to_string(),
            duration_minutes: 60,
            voting_interval_minutes: 10,
            min_deposit: 10,
            max_deposit: 100,
            max_participants: 50,
            lobby_duration_seconds: 600,
            cooldown_seconds: 60,
            platform_fee_bps: 1_500,
        }
    }

    #[test]
    fn valid_config_derives_total_rounds() {
        assert_eq!(valid_config().validate().unwrap(), 6);
    }

    #[test]
    fn rejects_malformed_pair() {
        let mut cfg = valid_config();
        cfg.pair = "sol-usdc".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_duration_out_of_range() {
        let mut cfg = valid_config();
        cfg.duration_minutes = 30;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_inverted_deposit_bounds() {
        let mut cfg = valid_config();
        cfg.min_deposit = 80;
        cfg.max_deposit = 20;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn vote_distribution_tie_resolves_to_skip() {
        let dist = VoteDistribution {
            long: 2,
            short: 2,
            skip: 0,
        };
        assert_eq!(dist.majority(), VoteChoice::Skip);
    }

    #[test]
    fn vote_distribution_majority_wins() {
        let dist = VoteDistribution {
            long: 3,
            short: 1,
            skip: 1,
        };
        assert_eq!(dist.majority(), VoteChoice::Long);
    }
}
