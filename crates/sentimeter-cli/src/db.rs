//! `db` sub-commands and the shared connection helper.

use clap::Subcommand;
use sentimeter_core::AppConfig;
use sqlx::PgPool;

#[derive(Debug, Subcommand)]
pub enum DbCommands {
    /// Apply pending migrations
    Migrate,
    /// Check database connectivity
    Ping,
    /// Insert the sample annotated tweets into an empty table
    Seed,
}

/// Load configuration and open a pool sized by it.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the pool cannot connect.
pub(crate) async fn connect() -> anyhow::Result<(AppConfig, PgPool)> {
    let config = sentimeter_core::load_app_config()?;
    let pool_config = sentimeter_db::PoolConfig::from_app_config(&config);
    let pool = sentimeter_db::connect_pool(&config.database_url, pool_config).await?;
    Ok((config, pool))
}

/// # Errors
///
/// Returns an error if the database is unreachable or the command fails.
pub(crate) async fn run_db_command(command: DbCommands) -> anyhow::Result<()> {
    let (_, pool) = connect().await?;

    match command {
        DbCommands::Migrate => {
            let applied = sentimeter_db::run_migrations(&pool).await?;
            println!("migrations applied: {applied}");
        }
        DbCommands::Ping => {
            sentimeter_db::health_check(&pool).await?;
            println!("database: ok");
        }
        DbCommands::Seed => {
            sentimeter_db::run_migrations(&pool).await?;
            let inserted = sentimeter_db::seed_sample_examples(&pool).await?;
            if inserted == 0 {
                println!("tweets table already populated; nothing seeded");
            } else {
                println!("seeded {inserted} sample tweets");
            }
        }
    }

    Ok(())
}
