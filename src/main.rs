use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use rank_engine::{
    config::Settings,
    engine::{run_scheduled, ReconcileContext},
    render::render_groups,
    status::{HttpStatusSource, StatusSource},
    sync::{DryRunPresence, DryRunRoleApi},
};

// Distinct exit codes per fatal startup failure category.
const EXIT_BAD_CONFIG: i32 = 1;
const EXIT_DB_UNAVAILABLE: i32 = 2;

#[derive(Parser)]
#[clap(name = "rank-engine")]
#[clap(about = "Reconciles activity-based ranks with chat-platform roles", long_about = None)]
struct Cli {
    /// Path to the main configuration file
    #[clap(short, long, global = true)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the reconciliation loop on the configured schedule
    Run,

    /// Run one pass and print the rendered leaderboard
    Leaderboard,

    /// Print the clan rosters for the current activity data
    Clans,
}

fn load_settings(config: Option<&PathBuf>) -> Settings {
    let loaded = match config {
        Some(path) => Settings::from_file(path),
        None => Settings::new(),
    };

    let settings = match loaded {
        Ok(settings) => settings,
        Err(e) => {
            error!("Invalid config: {}", e);
            process::exit(EXIT_BAD_CONFIG);
        }
    };

    if let Err(e) = settings.validate() {
        error!("Invalid config: {}", e);
        process::exit(EXIT_BAD_CONFIG);
    }

    settings
}

async fn connect(settings: Settings) -> ReconcileContext {
    match ReconcileContext::initialize(settings).await {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("Could not reach the datastore: {}", e);
            process::exit(EXIT_DB_UNAVAILABLE);
        }
    }
}

fn status_source(settings: &Settings) -> Option<Arc<dyn StatusSource>> {
    let server = match settings.status.normalized_server() {
        Some(server) => server,
        None => {
            warn!("status.lookup_server is not set, will not display server player count");
            return None;
        }
    };

    let timeout = Duration::from_secs(settings.status.timeout_seconds);
    match HttpStatusSource::new(&server, timeout) {
        Ok(source) => Some(Arc::new(source)),
        Err(e) => {
            warn!("Could not build status client for {}: {}", server, e);
            None
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_ref());

    match cli.command {
        Commands::Run => {
            let status = status_source(&settings);
            let ctx = Arc::new(connect(settings).await);

            info!("Starting reconciliation loop");
            run_scheduled(
                ctx,
                Arc::new(DryRunRoleApi),
                Arc::new(DryRunPresence),
                status,
            )
            .await;
        }

        Commands::Leaderboard => {
            let ctx = connect(settings).await;
            match ctx.leaderboard().await {
                Ok(board) => print!("{}", board),
                Err(e) => error!("Failed to build leaderboard: {}", e),
            }
        }

        Commands::Clans => {
            let ctx = connect(settings).await;
            match ctx.clan_roster().await {
                Ok(groups) => {
                    for field in render_groups(&groups) {
                        println!("{}: {}", field.name, field.value);
                    }
                }
                Err(e) => error!("Failed to build clan roster: {}", e),
            }
        }
    }
}
