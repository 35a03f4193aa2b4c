//! TaskMind CLI — the main entry point.
//!
//! Commands:
//! - `onboard` — Initialize config & generate a signing secret
//! - `serve`   — Start the HTTP chat gateway
//! - `token`   — Mint a bearer token for the protected API
//! - `doctor`  — Diagnose system health

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "taskmind",
    about = "TaskMind — a todo assistant you talk to",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration and generate a signing secret
    Onboard,

    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Mint a bearer token for calling the protected API
    Token {
        /// User id the token is issued for
        #[arg(short, long)]
        user: String,

        /// Email address to embed in the token
        #[arg(short, long)]
        email: Option<String>,
    },

    /// Diagnose system health
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Token { user, email } => commands::token::run(user, email).await?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
