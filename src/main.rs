use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use gmail2notion::auth::token_manager::TokenManager;
use gmail2notion::config;
use gmail2notion::sync;

#[derive(Parser)]
#[command(name = "gmail2notion")]
#[command(about = "Push labelled Gmail messages into a Notion database", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan the label since the last run and create one Notion page per message
    Run {
        /// Path to the state/config JSON (defaults to the user config dir)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Path to the Google installed-app client secret JSON
        #[arg(long)]
        credentials: Option<PathBuf>,
    },

    /// Write a template config file to edit
    Init {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.cmd {
        Command::Init { config: path } => {
            let path = match path {
                Some(p) => p,
                None => config::default_config_path()?,
            };
            if path.exists() {
                return Err(anyhow!("config already exists at {}", path.display()));
            }
            config::write_template(&path)?;
            println!("Wrote template config to {}", path.display());
            Ok(())
        }

        Command::Run {
            config: path,
            credentials,
        } => {
            let config_path = match path {
                Some(p) => p,
                None => config::default_config_path()?,
            };
            let credentials_path = match credentials {
                Some(p) => p,
                None => config::default_credentials_path()?,
            };

            let notion_token = std::env::var("NOTION_API_KEY")
                .map_err(|_| anyhow!("NOTION_API_KEY environment variable not set"))?;

            let tokens = TokenManager::from_client_secret(&credentials_path)?;
            let report = sync::run(&config_path, &tokens, &notion_token)?;

            if report.uploaded == 0 {
                println!("No new entries found");
            } else {
                println!(
                    "{} entries uploaded to Notion successfully",
                    report.uploaded
                );
            }
            Ok(())
        }
    }
}
