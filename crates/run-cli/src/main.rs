//! Entrypoint for the run orchestrator process, generalized from the
//! reference workspace's `cli/src/main.rs` clap/tracing-subscriber scaffold.
//!
//! `serve` is the long-running mode: it wires every collaborator, resumes
//! any non-terminal run left over from a prior process, and then drives the
//! scheduler forever. The admin subcommands (`create-run`, `cancel-run`,
//! `force-settle`, `pause`, `unpause`) operate against persisted state
//! directly rather than through a running process's in-memory actor table —
//! this crate implements only the operations themselves (spec §6 "not HTTP
//! specifics"); the transport an admin would use to reach a live `serve`
//! process is an external concern.

mod commands;
mod config;
mod wiring;

use clap::{Parser, Subcommand};
use config::ConfigLoader;

#[derive(Parser)]
#[command(name = "run-orchestrator")]
#[command(about = "Pooled perpetual-futures trading run orchestrator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Runs the orchestrator: resumes in-flight runs, then drives the
    /// scheduler (cron auto-create + resume sweep) until killed.
    Serve {
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
    },
    /// Admin `createRun` (spec §4.1, §6): creates a run from
    /// `run_defaults`, overridable per flag. Picked up by whichever `serve`
    /// process is running, or the next one to start.
    CreateRun {
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
        #[arg(long)]
        pair: Option<String>,
        #[arg(long)]
        duration_minutes: Option<u32>,
        #[arg(long)]
        voting_interval_minutes: Option<u32>,
        #[arg(long)]
        min_deposit: Option<i64>,
        #[arg(long)]
        max_deposit: Option<i64>,
        #[arg(long)]
        max_participants: Option<u32>,
        #[arg(long)]
        lobby_duration_seconds: Option<u32>,
        #[arg(long)]
        cooldown_seconds: Option<u32>,
        #[arg(long)]
        platform_fee_bps: Option<u32>,
    },
    /// Admin `cancelRun(runId, reason)` (spec §6, §7): refunds from the
    /// lobby, or closes the open position and realizes pnl from ACTIVE
    /// onward.
    CancelRun {
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
        run_id: String,
        #[arg(long, default_value = "cancelled by admin")]
        reason: String,
    },
    /// Admin `forceSettle(runId)` (spec §6): only valid while ACTIVE; closes
    /// the open position and jumps straight to SETTLING.
    ForceSettle {
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
        run_id: String,
    },
    /// Admin `pausePlatform()` (spec §6): flips a persisted flag the cron
    /// auto-create path checks before creating the next run. Runs already
    /// in flight are unaffected.
    #[command(name = "pause-platform")]
    PausePlatform {
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
    },
    /// Admin `unpausePlatform()` (spec §6).
    #[command(name = "unpause-platform")]
    UnpausePlatform {
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
    },
    /// Prints the persisted status of a run.
    Status {
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
        run_id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config } => {
            let app_config = ConfigLoader::load(&config)?;
            commands::serve::run(app_config).await
        }
        Commands::CreateRun {
            config,
            pair,
            duration_minutes,
            voting_interval_minutes,
            min_deposit,
            max_deposit,
            max_participants,
            lobby_duration_seconds,
            cooldown_seconds,
            platform_fee_bps,
        } => {
            let app_config = ConfigLoader::load(&config)?;
            let overrides = commands::create_run::Overrides {
                pair,
                duration_minutes,
                voting_interval_minutes,
                min_deposit,
                max_deposit,
                max_participants,
                lobby_duration_seconds,
                cooldown_seconds,
                platform_fee_bps,
            };
            commands::create_run::run(app_config, overrides).await
        }
        Commands::CancelRun { config, run_id, reason } => {
            let app_config = ConfigLoader::load(&config)?;
            commands::cancel_run::run(app_config, &run_id, &reason).await
        }
        Commands::ForceSettle { config, run_id } => {
            let app_config = ConfigLoader::load(&config)?;
            commands::force_settle::run(app_config, &run_id).await
        }
        Commands::PausePlatform { config } => {
            let app_config = ConfigLoader::load(&config)?;
            commands::pause::run(app_config, true).await
        }
        Commands::UnpausePlatform { config } => {
            let app_config = ConfigLoader::load(&config)?;
            commands::pause::run(app_config, false).await
        }
        Commands::Status { config, run_id } => {
            let app_config = ConfigLoader::load(&config)?;
            commands::status::run(app_config, &run_id).await
        }
    }
}
