use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, info};

use super::script::ScriptCommand;
use crate::config::Config;
use crate::tui;

/// Ledgerdesk - personal transactions in your terminal
#[derive(Parser, Debug)]
#[command(
    name = "ledgerdesk",
    version,
    about = "Personal transactions in your terminal",
    long_about = r#"Ledgerdesk keeps a list of income and expense transactions and edits them
through stacked dialogs: forms, confirmations and notices.

Examples:
  ledgerdesk                         # Start interactive mode
  ledgerdesk script steps.json       # Replay dialog operations headlessly
  cat steps.json | ledgerdesk script -"#
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short = 'd', long = "debug", global = true)]
    pub debug: bool,

    /// Configuration file to use instead of the default search paths
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a JSON list of dialog steps and print the visible dialogs
    Script(ScriptCommand),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        if self.debug {
            debug!("Debug logging enabled");
        }

        let config = Config::init(self.config.as_deref()).await?;
        debug!("Configuration initialized");

        match self.command {
            Some(Commands::Script(script)) => script.execute(&config).await,
            None => {
                tui::run(config).await?;
                info!("Application finished");
                Ok(())
            }
        }
    }
}
