use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;
mod tracing_init;

use config::AppConfig;

#[derive(Parser)]
#[command(name = "ledgersort", about = "Rule-based transaction categorization")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Recompute categories for every transaction not edited by hand
    Sweep,
    /// Categorize a JSON array of transactions against the stored rules
    Categorize {
        file: PathBuf,
        /// Store the categorized transactions after printing them
        #[arg(long)]
        save: bool,
    },
    /// Validate a TOML rule set and save its rules
    ImportRules { file: PathBuf },
    /// Report structural problems in a TOML rule set
    Validate { file: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Command::Validate { file } = &cli.command {
        tracing_init::init_tracing("info");
        return commands::validate(file);
    }

    let config = AppConfig::from_env()?;
    tracing_init::init_tracing(&config.log_level);

    match cli.command {
        Command::Sweep => commands::sweep(&config).await,
        Command::Categorize { file, save } => commands::categorize(&config, &file, save).await,
        Command::ImportRules { file } => commands::import_rules(&config, &file).await,
        Command::Validate { .. } => Ok(()),
    }
}
