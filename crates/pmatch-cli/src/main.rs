mod calculate;
mod db;
mod results;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::db::DbCommands;
use crate::results::ResultsCommands;

#[derive(Debug, Parser)]
#[command(name = "pmatch-cli")]
#[command(about = "Profile matching: rank candidates against role target profiles")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Score and rank candidates for a role
    Calculate {
        /// Role to rank candidates for
        #[arg(long)]
        role: i64,
        /// Restrict the run to these candidates (repeatable)
        #[arg(long = "candidate")]
        candidates: Vec<i64>,
        /// Read inputs from the dataset file instead of the database; nothing is stored
        #[arg(long)]
        offline: bool,
        /// Print the ranking without storing it
        #[arg(long)]
        dry_run: bool,
    },
    /// Inspect stored results
    Results {
        #[command(subcommand)]
        command: ResultsCommands,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    let config = pmatch_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Some(Commands::Db { command }) => db::run_db(&config, command).await?,
        Some(Commands::Calculate {
            role,
            candidates,
            offline,
            dry_run,
        }) => {
            if offline {
                calculate::run_calculate_offline(&config, role, candidates)?;
            } else {
                let pool = db::connect(&config).await?;
                calculate::run_calculate(&pool, &config, role, candidates, dry_run).await?;
            }
        }
        Some(Commands::Results { command }) => {
            let pool = db::connect(&config).await?;
            match command {
                ResultsCommands::List { role } => results::run_results_list(&pool, role).await?,
                ResultsCommands::Show { id, json } => {
                    results::run_results_show(&pool, id, json).await?;
                }
            }
        }
        None => println!("pmatch-cli ready; run with --help for commands"),
    }

    Ok(())
}
