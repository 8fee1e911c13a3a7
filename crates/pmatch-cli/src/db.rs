//! `db` subcommands and pool setup shared by the other handlers.

use clap::Subcommand;
use pmatch_core::{AppConfig, Environment};

/// Sub-commands available under `db`.
#[derive(Debug, Subcommand)]
pub enum DbCommands {
    /// Check that the database is reachable
    Ping,
    /// Apply pending migrations
    Migrate,
    /// Upsert the dataset file into the database
    Seed {
        /// Overwrite stored records even when `PMATCH_ENV=production`
        #[arg(long)]
        force: bool,
    },
}

/// Connect to the configured database.
///
/// # Errors
///
/// Returns an error if `DATABASE_URL` is unset or the connection fails.
pub(crate) async fn connect(config: &AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let pool = pmatch_db::connect_pool_from_config(config).await?;
    Ok(pool)
}

/// Refuse to seed a production database unless `--force` was given.
///
/// Seeding upserts by id, so it overwrites any record edited since the
/// dataset file was written.
fn check_seed_allowed(env: Environment, force: bool) -> anyhow::Result<()> {
    if env == Environment::Production && !force {
        anyhow::bail!(
            "refusing to seed with PMATCH_ENV=production; \
             rerun with --force to overwrite stored records"
        );
    }
    Ok(())
}

pub(crate) async fn run_db(config: &AppConfig, command: DbCommands) -> anyhow::Result<()> {
    if let DbCommands::Seed { force } = command {
        check_seed_allowed(config.env, force)?;
    }

    let pool = connect(config).await?;

    match command {
        DbCommands::Ping => {
            pmatch_db::ping(&pool).await?;
            println!("database ok");
        }
        DbCommands::Migrate => {
            let applied = pmatch_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
        }
        DbCommands::Seed { force } => {
            if force && config.env == Environment::Production {
                tracing::warn!(env = %config.env, "seeding production with --force");
            }
            let dataset = pmatch_core::load_dataset(&config.dataset_path)?;
            let count = pmatch_db::seed_dataset(&pool, &dataset).await?;
            println!(
                "seeded {count} records from {}",
                config.dataset_path.display()
            );
        }
    }

    Ok(())
}
