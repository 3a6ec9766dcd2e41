//! Broadcast event payloads (spec §6) and the typed `SystemLog` emission
//! helper, generalized from the reference workspace's `BotEvent`.

use crate::models::{Run, Trade, Vote, VoteDistribution};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Event {
    RunUpdate {
        run: Run,
        seq: u64,
    },
    VoteUpdate {
        run_id: String,
        round: u16,
        distribution: VoteDistribution,
        seq: u64,
    },
    TradeUpdate {
        run_id: String,
        trade: Trade,
        seq: u64,
    },
    PriceUpdate {
        symbol: String,
        price: Decimal,
        source: String,
        timestamp: DateTime<Utc>,
    },
    ChatMessage {
        run_id: String,
        user_id: String,
        message: String,
        sent_at: DateTime<Utc>,
    },
}

impl Event {
    /// The topic a subscriber keys on: a specific run, or "global" for
    /// platform-wide events (price updates span all runs trading that
    /// symbol, so they are published globally and per-run symbol match is
    /// left to the subscriber).
    #[must_use]
    pub fn run_id(&self) -> Option<&str> {
        match self {
            Self::RunUpdate { run, .. } => Some(run.id.as_str()),
            Self::VoteUpdate { run_id, .. }
            | Self::TradeUpdate { run_id, .. }
            | Self::ChatMessage { run_id, .. } => Some(run_id.as_str()),
            Self::PriceUpdate { .. } => None,
        }
    }
}

/// A cast of `Vote` into the subset of fields worth logging loudly; kept
/// separate from the persisted `Vote` row since broadcast payloads are
/// allowed to evolve independently of storage schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteCast {
    pub vote: Vote,
}
