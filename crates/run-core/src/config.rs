//! Application configuration, shaped like the reference workspace's
//! `core::config::AppConfig` — one struct per subsystem, loaded through
//! `ConfigLoader` (see `run-cli`) via `figment`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub run_defaults: RunDefaultsConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub executor: ExecutorConfig,
    #[serde(default)]
    pub oracle: OracleConfig,
    #[serde(default)]
    pub dex: DexConfig,
    #[serde(default)]
    pub chain: ChainConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

const fn default_max_connections() -> u32 {
    10
}

/// Defaults applied by `createRun` when the cron scheduler auto-creates a
/// run (spec §4.2 step 5) and the baseline validation bounds for operator
/// `create-run` calls (spec §4.1, §6 config table).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunDefaultsConfig {
    pub pair: String,
    pub duration_minutes: u32,
    pub voting_interval_minutes: u32,
    pub min_deposit: i64,
    pub max_deposit: i64,
    pub max_participants: u32,
    #[serde(default = "default_lobby_duration_seconds")]
    pub lobby_duration_seconds: u32,
    #[serde(default = "default_cooldown_seconds")]
    pub cooldown_seconds: u32,
    #[serde(default = "default_platform_fee_bps")]
    pub platform_fee_bps: u32,
}

const fn default_lobby_duration_seconds() -> u32 {
    600
}

const fn default_cooldown_seconds() -> u32 {
    60
}

const fn default_platform_fee_bps() -> u32 {
    1_500 // 15%, matching scenario S1
}

impl Default for RunDefaultsConfig {
    fn default() -> Self {
        Self {
            pair: "SOL/USDC".to_string(),
            duration_minutes: 60,
            voting_interval_minutes: 10,
            min_deposit: 10,
            max_deposit: 100,
            max_participants: 50,
            lobby_duration_seconds: default_lobby_duration_seconds(),
            cooldown_seconds: default_cooldown_seconds(),
            platform_fee_bps: default_platform_fee_bps(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// When set, the scheduler auto-creates a run on this cron schedule
    /// whenever no non-terminal run exists (spec §4.2 step 5).
    pub cron_schedule: Option<String>,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

const fn default_tick_interval_ms() -> u64 {
    1_000
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            cron_schedule: None,
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    #[serde(default = "default_backoff_cap_ms")]
    pub backoff_cap_ms: u64,
    /// Enables `SeededChaosRng` instead of `OsChaosRng` for deterministic
    /// replay (spec §6 `chaosSeededReplay`).
    #[serde(default)]
    pub chaos_seeded_replay: bool,
}

const fn default_retries() -> u32 {
    3
}

const fn default_backoff_base_ms() -> u64 {
    2_000
}

const fn default_backoff_cap_ms() -> u64 {
    30_000
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            retries: default_retries(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_cap_ms: default_backoff_cap_ms(),
            chaos_seeded_replay: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    #[serde(default = "default_stale_seconds")]
    pub stale_seconds: i64,
    #[serde(default = "default_drift_rpc_url")]
    pub drift_rpc_url: String,
    #[serde(default = "default_binance_ws_url")]
    pub binance_ws_url: String,
    #[serde(default = "default_binance_rest_url")]
    pub binance_rest_url: String,
    /// Base58-encoded on-chain perp oracle account per tracked symbol,
    /// parsed into a `Pubkey` at wiring time (spec §4.5: the primary
    /// source). Empty for a deployment tracking only the fallback feed.
    #[serde(default)]
    pub oracle_accounts: HashMap<String, String>,
}

const fn default_stale_seconds() -> i64 {
    30
}

fn default_drift_rpc_url() -> String {
    "https://api.mainnet-beta.solana.com".to_string()
}

fn default_binance_ws_url() -> String {
    "wss://stream.binance.com:9443/ws".to_string()
}

fn default_binance_rest_url() -> String {
    "https://api.binance.com".to_string()
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            stale_seconds: default_stale_seconds(),
            drift_rpc_url: default_drift_rpc_url(),
            binance_ws_url: default_binance_ws_url(),
            binance_rest_url: default_binance_rest_url(),
            oracle_accounts: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DexConfig {
    /// Selects the `RealDexAdapter` vs `MockDexAdapter` at wiring time
    /// (spec §4.7, §6 `enableRealTrading`).
    #[serde(default)]
    pub enable_real_trading: bool,
    #[serde(default = "default_dex_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub subaccount: Option<String>,
    #[serde(default = "default_slippage_bps")]
    pub slippage_bps: u32,
}

fn default_dex_api_url() -> String {
    "https://api.hyperliquid.xyz".to_string()
}

const fn default_slippage_bps() -> u32 {
    10 // 0.1%, matching spec §4.4 step 3
}

impl Default for DexConfig {
    fn default() -> Self {
        Self {
            enable_real_trading: false,
            api_url: default_dex_api_url(),
            subaccount: None,
            slippage_bps: default_slippage_bps(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    pub program_id: Option<String>,
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,
    /// Path to the fee-payer keypair file (Solana CLI JSON format). When
    /// unset, `run-cli` generates an ephemeral keypair at startup — usable
    /// against a localnet/devnet deployment but never for a funded mainnet
    /// payer.
    #[serde(default)]
    pub payer_keypair_path: Option<String>,
}

fn default_rpc_url() -> String {
    "https://api.mainnet-beta.solana.com".to_string()
}

const fn default_call_timeout_ms() -> u64 {
    30_000
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            program_id: None,
            call_timeout_ms: default_call_timeout_ms(),
            payer_keypair_path: None,
        }
    }
}
