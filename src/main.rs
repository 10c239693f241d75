use clap::Parser;
use vibe_trade_api::cli::Cli;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up GOOGLE_CLOUD_PROJECT, NEXTAUTH_SECRET, etc.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    if let Err(e) = vibe_trade_api::cli::run(cli).await {
        match std::env::var("VERBOSE").as_deref() {
            Ok("true") | Ok("1") => eprintln!("Error: {e:?}"),
            _ => eprintln!("Error: {e}"),
        }
        std::process::exit(1);
    }
}
