//! Handshake Agent CLI
//!
//! A command-line tool for watching and steering a running handshake
//! agent through its dashboard API.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use commands::{control, status};
use output::OutputFormat;

/// Handshake Agent CLI
#[derive(Parser)]
#[command(name = "hsa")]
#[command(author, version, about = "CLI for the Handshake Agent", long_about = None)]
pub struct Cli {
    /// Agent API URL (can also be set via HSA_API_URL env var)
    #[arg(long, env = "HSA_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short)]
    pub format: Option<OutputFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show mode, current target, mood and session counters
    Status,

    /// Show component health and degradation reasons
    Health,

    /// List observed networks ranked by score
    Targets {
        /// Show at most this many networks
        #[arg(long, short)]
        limit: Option<usize>,

        /// Show the terms behind each score instead of the summary
        #[arg(long)]
        explain: bool,
    },

    /// Attack a specific BSSID on the next cycle
    Target {
        /// BSSID, e.g. aa:bb:cc:dd:ee:ff
        bssid: String,
    },

    /// Force the mode preference
    Mode {
        #[arg(value_enum)]
        mode: ModeArg,
    },

    /// Pause the attack cycle at the next idle boundary
    Pause,

    /// Resume the attack cycle
    Resume,

    /// Forget all learned attack history
    ResetLearning {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },

    /// Manage the local CLI configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
    Auto,
    Real,
    Simulation,
}

impl ModeArg {
    fn as_str(self) -> &'static str {
        match self {
            ModeArg::Auto => "auto",
            ModeArg::Real => "real",
            ModeArg::Simulation => "simulation",
        }
    }
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,

    /// Store a default API URL
    SetUrl { url: String },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run(Cli::parse()).await {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = config::Config::load()?;
    let format = cli
        .format
        .or_else(|| settings.default_format.as_deref().and_then(OutputFormat::from_name))
        .unwrap_or_default();
    let api_url = settings.resolve_api_url(cli.api_url);

    // Constructed per command so `config` works with a broken URL
    let client = || client::ApiClient::new(&api_url);

    // Execute command
    match cli.command {
        Commands::Status => status::show_status(&client()?, format).await?,
        Commands::Health => status::show_health(&client()?, format).await?,
        Commands::Targets { limit, explain } => {
            status::show_targets(&client()?, limit, explain, format).await?
        }
        Commands::Target { bssid } => {
            control::override_target(&client()?, &bssid, format).await?
        }
        Commands::Mode { mode } => control::set_mode(&client()?, mode.as_str(), format).await?,
        Commands::Pause => control::pause(&client()?, format).await?,
        Commands::Resume => control::resume(&client()?, format).await?,
        Commands::ResetLearning { yes } => {
            control::reset_learning(&client()?, yes, format).await?
        }
        Commands::Config(config_cmd) => configure(config_cmd, settings, &api_url)?,
    }

    Ok(())
}

fn configure(command: ConfigCommands, mut settings: config::Config, api_url: &str) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            output::print_json(&settings)?;
            output::print_info(&format!("Effective API URL: {}", api_url));
        }
        ConfigCommands::SetUrl { url } => {
            url::Url::parse(&url)?;
            settings.api_url = Some(url);
            let path = settings.save()?;
            output::print_success(&format!("Saved to {}", path.display()));
        }
    }
    Ok(())
}
