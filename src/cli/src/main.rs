//! Meridian CLI - Command-line interface for the Meridian portal API.
//!
//! Provides commands for application, client-roster, health, and
//! configuration management.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{application, config, health, roster};
use output::OutputFormat;

/// Meridian - customer portal CLI
#[derive(Parser)]
#[command(
    name = "meridian",
    version = "0.1.0",
    about = "Meridian - customer portal CLI",
    long_about = "CLI tool for submitting and reviewing financial-services applications and managing partner client rosters.",
    propagate_version = true
)]
pub struct Cli {
    /// Output format
    #[arg(short, long, global = true, default_value = "table")]
    output: OutputFormat,

    /// API server URL
    #[arg(long, global = true, env = "MERIDIAN_API_URL")]
    api_url: Option<String>,

    /// Bearer token for authenticated endpoints
    #[arg(long, global = true, env = "MERIDIAN_TOKEN")]
    token: Option<String>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Application operations (submit, view, set-status)
    #[command(subcommand)]
    Application(application::ApplicationCommands),

    /// Client roster operations (partner and admin)
    #[command(subcommand)]
    Client(roster::ClientCommands),

    /// Check server health
    Health(health::HealthArgs),

    /// Configuration management
    #[command(subcommand)]
    Config(config::ConfigCommands),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let api_url = cli
        .api_url
        .clone()
        .or_else(|| config::load_value("api-url"))
        .unwrap_or_else(|| "http://localhost:8080".to_string());
    let token = cli.token.clone().or_else(|| config::load_value("token"));

    let client = client::ApiClient::new(&api_url, token)?;
    let format = cli.output;

    let result = match cli.command {
        Commands::Application(cmd) => application::execute(cmd, &client, format).await,
        Commands::Client(cmd) => roster::execute(cmd, &client, format).await,
        Commands::Health(args) => health::execute(args, &client, format).await,
        Commands::Config(cmd) => config::execute(cmd, format).await,
    };

    if let Err(e) = result {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
