//! Builds the full `RunDeps` collaborator set from `AppConfig`, generalized
//! from the reference workspace's `main.rs` pattern of constructing each
//! provider/handler once at startup and handing the bundle to whatever
//! drives the process.

use run_core::chaos::{ChaosRng, OsChaosRng, SeededChaosRng};
use run_core::clock::SystemClock;
use run_core::config::AppConfig;
use run_engine::RunDeps;
use run_price_oracle::composite::{CompositeOracle, OracleConfig as CompositeOracleConfig};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{read_keypair_file, Keypair};
use sqlx::postgres::PgPoolOptions;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// All symbols the orchestrator currently needs an oracle feed for. The run
/// pair is always `SOL/USDC` in practice (spec scenarios), but the oracle is
/// wired for whatever `run_defaults.pair` names so a differently-configured
/// deployment needs no code change.
fn tracked_symbols(config: &AppConfig) -> Vec<String> {
    vec![config.run_defaults.pair.clone()]
}

fn load_payer(config: &AppConfig) -> anyhow::Result<Keypair> {
    match &config.chain.payer_keypair_path {
        Some(path) => read_keypair_file(path)
            .map_err(|e| anyhow::anyhow!("failed to read payer keypair from {path}: {e}")),
        None => {
            tracing::warn!(
                "chain.payer_keypair_path unset; generated an ephemeral keypair, usable only \
                 against a localnet/devnet deployment"
            );
            Ok(Keypair::new())
        }
    }
}

fn parse_oracle_accounts(config: &AppConfig) -> anyhow::Result<HashMap<String, Pubkey>> {
    config
        .oracle
        .oracle_accounts
        .iter()
        .map(|(symbol, encoded)| {
            let pubkey = Pubkey::from_str(encoded)
                .map_err(|e| anyhow::anyhow!("invalid oracle account for {symbol}: {e}"))?;
            Ok((symbol.clone(), pubkey))
        })
        .collect()
}

/// Builds every collaborator and bundles them into a `RunDeps`.
///
/// # Errors
/// Returns an error if the database pool cannot connect, migrations fail,
/// the payer keypair cannot be read, an oracle account fails to parse, or
/// `chain.program_id` is unset or invalid.
pub async fn build(config: &AppConfig) -> anyhow::Result<RunDeps> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?;
    let store = run_store::PgStore::new(pool);
    store.run_migrations().await?;

    let bus = run_broadcast::Bus::new();

    let oracle_accounts = parse_oracle_accounts(config)?;
    let oracle = CompositeOracle::spawn(
        CompositeOracleConfig {
            rpc_url: config.oracle.drift_rpc_url.clone(),
            binance_ws_url: config.oracle.binance_ws_url.clone(),
            binance_rest_url: config.oracle.binance_rest_url.clone(),
            drift_poll_interval: Duration::from_secs(5),
        },
        &tracked_symbols(config),
        oracle_accounts,
    );

    let program_id_str = config
        .chain
        .program_id
        .clone()
        .ok_or_else(|| anyhow::anyhow!("chain.program_id must be set"))?;
    let program_id = Pubkey::from_str(&program_id_str)
        .map_err(|e| anyhow::anyhow!("invalid chain.program_id: {e}"))?;
    let payer = load_payer(config)?;
    let chain = run_chain_adapter::SolanaChainAdapter::new(
        config.chain.rpc_url.clone(),
        program_id,
        payer,
        Duration::from_millis(config.chain.call_timeout_ms),
    );

    let dex: Arc<dyn run_core::traits::DexAdapter> = if config.dex.enable_real_trading {
        Arc::new(run_dex_adapter::RealDexAdapter::new(
            config.dex.api_url.clone(),
            config.dex.subaccount.clone().unwrap_or_default(),
        ))
    } else {
        tracing::warn!("dex.enable_real_trading is false; trades execute against the in-memory mock adapter");
        Arc::new(run_dex_adapter::MockDexAdapter::new(
            config.run_defaults.max_deposit * i64::from(config.run_defaults.max_participants),
            rust_decimal::Decimal::new(i64::from(config.dex.slippage_bps), 4),
        ))
    };

    let chaos: Box<dyn ChaosRng> = if config.executor.chaos_seeded_replay {
        Box::new(SeededChaosRng)
    } else {
        Box::new(OsChaosRng)
    };

    Ok(RunDeps {
        store: Arc::new(store),
        bus: Arc::new(bus),
        oracle: Arc::new(oracle),
        chain: Arc::new(chain),
        dex,
        clock: Arc::new(SystemClock),
        chaos: Arc::new(Mutex::new(chaos)),
        executor: config.executor.clone(),
        oracle_stale_seconds: config.oracle.stale_seconds,
    })
}
