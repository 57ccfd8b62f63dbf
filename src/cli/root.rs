use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, info};

use super::{ClassifyCommand, DialogCommand, FetchCommand, SchemaCommand};
use crate::config::Settings;

/// Modal dialogs and asynchronous content frames, driven from the terminal
#[derive(Parser)]
#[command(
    name = "modal-frame",
    version,
    about = "Modal dialogs and asynchronous content frames, driven from the terminal",
    long_about = r#"modal-frame classifies server responses, loads them into content frames and
runs modal dialogs on a headless toolkit.

Examples:
  modal-frame classify page.html --type text/html   # Classify a response body
  modal-frame fetch https://example.com/            # Load a URL into a frame
  modal-frame dialog /edit/1 --title "Edit"         # Open a dialog on a URL
  modal-frame schema --target dialog                # Print the dialog options schema"#
)]
pub struct Cli {
    /// Current working directory
    #[arg(short = 'c', long = "cwd", global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short = 'd', long = "debug", global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Classify a raw value against a declared content type
    Classify(ClassifyCommand),
    /// Fetch a URL into a headless frame
    Fetch(FetchCommand),
    /// Open a headless dialog and describe it
    Dialog(DialogCommand),
    /// Generate and validate configuration schemas
    Schema(SchemaCommand),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        if self.debug {
            debug!("Debug logging enabled");
        }

        if let Some(cwd) = &self.cwd {
            std::env::set_current_dir(cwd)
                .map_err(|e| anyhow::anyhow!("Failed to change directory to {}: {}", cwd.display(), e))?;
            info!("Changed working directory to: {}", cwd.display());
        }

        let settings = Settings::init().await?;
        debug!("Configuration initialized");

        match self.command {
            Commands::Classify(cmd) => cmd.execute().await,
            Commands::Fetch(cmd) => cmd.execute(&settings).await,
            Commands::Dialog(cmd) => cmd.execute(&settings).await,
            Commands::Schema(cmd) => cmd.execute().await,
        }
    }
}
