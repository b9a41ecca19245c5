mod batches;
mod shop;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::batches::BatchCommands;
use crate::shop::ShopCommands;

#[derive(Debug, Parser)]
#[command(name = "spector-cli")]
#[command(about = "Spector bulk-edit history command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Inspect and revert recorded bulk edits
    Batches {
        #[command(subcommand)]
        command: BatchCommands,
    },
    /// Shop-level data maintenance
    Shop {
        #[command(subcommand)]
        command: ShopCommands,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("spector-cli: run with --help to list commands");
        return Ok(());
    };

    let config = spector_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = spector_db::PoolConfig::from_app_config(&config);
    let pool = spector_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Migrate => {
            let applied = spector_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
        }
        Commands::Batches { command } => batches::run(&pool, &config, command).await?,
        Commands::Shop { command } => shop::run(&pool, command).await?,
    }

    pool.close().await;
    Ok(())
}
