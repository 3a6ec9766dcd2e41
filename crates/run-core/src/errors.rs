use thiserror::Error;

/// Error kinds the orchestrator distinguishes by *policy*, not just message.
///
/// Callers match on variant, never on `to_string()` content — the reference
/// workspace's `anyhow`-at-the-edges style is kept for operational glue, but
/// the state machine and round controller need to decide retry-vs-abort
/// programmatically, which a bag of `anyhow::Error` cannot express.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("another run is already active; only one run may be active at a time")]
    SingleRunViolation,

    #[error("lobby for run {run_id} is full")]
    LobbyFull { run_id: String },

    #[error("lobby for run {run_id} is no longer accepting participants")]
    LobbyClosed { run_id: String },

    #[error("deposit {amount} outside allowed range [{min}, {max}]")]
    DepositOutOfRange { amount: i64, min: i64, max: i64 },

    #[error("user {user_id} already joined run {run_id}")]
    AlreadyJoined { run_id: String, user_id: String },

    #[error("user {user_id} is not a participant of run {run_id}")]
    NotParticipant { run_id: String, user_id: String },

    #[error("voting window for run {run_id} round {round} is closed")]
    VoteWindowClosed { run_id: String, round: u16 },

    #[error("user {user_id} already voted in run {run_id} round {round}")]
    DuplicateVote {
        run_id: String,
        round: u16,
        user_id: String,
    },

    #[error("price oracle data for {symbol} is stale (age {age_seconds}s)")]
    OracleStale { symbol: String, age_seconds: i64 },

    #[error("transient external failure calling {service}: {source}")]
    ExternalTransient {
        service: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("permanent external failure calling {service}: {source}")]
    ExternalPermanent {
        service: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("insufficient collateral for run {run_id}: have {available}, need {required}")]
    InsufficientCollateral {
        run_id: String,
        available: i64,
        required: i64,
    },

    #[error("state invariant violated: {0}")]
    StateInvariantViolation(String),
}

impl OrchestratorError {
    /// Transient external failures are retried by the round controller
    /// (spec §4.3, §7). `OracleStale` is deliberately excluded: it is not
    /// retried within a round, it degrades the run straight to `SETTLING`
    /// with remaining rounds skipped (spec §4.5, §7).
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ExternalTransient { .. })
    }
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
