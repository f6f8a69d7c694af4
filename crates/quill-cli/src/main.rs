use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;

use quill::agent::Agent;
use quill::providers::groq::{GroqProvider, GroqProviderConfig};

mod config;
mod output;
mod session;

use config::ConfigManager;
use session::Session;

#[derive(Parser)]
#[command(name = "quill", author, version, about = "A streaming coding assistant with local tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Store your API key in the system keyring
    Setup,
    /// Start a chat session
    Chat {
        /// Answer a single query and exit
        #[arg(short, long)]
        quick: bool,

        /// The query to answer in quick mode
        query: Option<String>,
    },
    /// Show whether an API key is configured
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = ConfigManager::new()?;

    match cli.command {
        Some(Command::Setup) => config.setup_api_key()?,
        Some(Command::Status) => handle_status(&config),
        Some(Command::Chat { quick, query }) => {
            handle_chat(&config, quick, query).await?;
        }
        None => handle_chat(&config, false, None).await?,
    }

    Ok(())
}

fn handle_status(config: &ConfigManager) {
    match config.api_key() {
        Ok(_) => println!("{} API key is configured", style("✓").green()),
        Err(_) => {
            println!("{} No API key found", style("✗").red());
            println!("Run {} to configure one", style("quill setup").cyan());
        }
    }
}

async fn handle_chat(config: &ConfigManager, quick: bool, query: Option<String>) -> Result<()> {
    let api_key = match config.api_key() {
        Ok(key) => key,
        Err(_) => {
            eprintln!("{} No API key found", style("✗").red());
            eprintln!(
                "Run {} or set {}",
                style("quill setup").cyan(),
                style(quill::key_manager::API_KEY_ENV).cyan()
            );
            std::process::exit(1);
        }
    };

    let provider = GroqProvider::new(GroqProviderConfig::new(api_key))?;
    let agent = Agent::new(Box::new(provider));
    let mut session = Session::new(agent);

    match (quick, query) {
        (true, Some(query)) => session.run_once(&query).await,
        _ => session.run().await,
    }
}
