mod db;
mod demo;
mod model;
mod report;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::db::DbCommands;

#[derive(Debug, Parser)]
#[command(name = "sentimeter-cli")]
#[command(about = "Sentimeter tweet sentiment command line interface")]
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
    /// Store a human-annotated tweet for the next training run
    Annotate {
        /// Tweet text
        #[arg(long)]
        text: String,

        /// Tweet carries positive sentiment
        #[arg(long)]
        positive: bool,

        /// Tweet carries negative sentiment
        #[arg(long)]
        negative: bool,
    },
    /// Retrain both classifiers from the stored annotations
    Retrain,
    /// Score tweets locally with the persisted (or freshly trained) model
    Analyze {
        /// Tweets to score
        #[arg(required = true)]
        texts: Vec<String>,
    },
    /// Render a markdown evaluation report for the current model
    Report {
        /// Write the report to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Send tweets to a running server and print the scores
    Demo {
        /// Analyze endpoint of the server
        #[arg(long, default_value = demo::DEFAULT_ANALYZE_URL)]
        url: String,

        /// Tweets to send; a built-in sample set is used when omitted
        texts: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(sentimeter_core::log_level_from_env()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Db { command }) => db::run_db_command(command).await?,
        Some(Commands::Annotate {
            text,
            positive,
            negative,
        }) => model::run_annotate(text, positive, negative).await?,
        Some(Commands::Retrain) => model::run_retrain().await?,
        Some(Commands::Analyze { texts }) => model::run_analyze(&texts).await?,
        Some(Commands::Report { output }) => report::run_report(output.as_deref()).await?,
        Some(Commands::Demo { url, texts }) => demo::run_demo(&url, texts).await?,
        None => println!("sentimeter-cli: run with --help to list commands"),
    }

    Ok(())
}

#[cfg(test)]
mod tests;
