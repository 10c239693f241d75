use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::auth::issue_shared_secret_token;
use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "vibe-trade-api")]
#[command(about = "Vibe Trade API - user-scoped threads and strategies")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve,

    #[command(about = "Print the effective configuration as JSON (secrets omitted)")]
    Config,

    #[command(about = "Mint a NextAuth-compatible HS256 token for local testing")]
    Token {
        #[arg(long, help = "Subject (user id) to put in the token")]
        sub: String,

        #[arg(long, default_value_t = 24, help = "Lifetime in hours")]
        ttl_hours: i64,
    },
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let config = AppConfig::from_env()?;
            crate::server::init_logging(config.logging.format);
            crate::server::run(config).await
        }
        Commands::Config => {
            let config = AppConfig::from_env()?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
        Commands::Token { sub, ttl_hours } => {
            let secret = std::env::var("NEXTAUTH_SECRET").context("NEXTAUTH_SECRET must be set")?;
            if sub.trim().is_empty() {
                anyhow::bail!("--sub must not be empty");
            }
            let token = issue_shared_secret_token(
                secret.as_bytes(),
                &sub,
                chrono::Duration::hours(ttl_hours),
            )?;
            println!("{}", token);
            Ok(())
        }
    }
}
