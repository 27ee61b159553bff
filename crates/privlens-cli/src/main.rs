mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use privlens_config::Config;
use privlens_engine::Inspector;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let inspector = Inspector::from_config(&config);

    match cli.command {
        cli::Commands::Inspect {
            file,
            tags,
            media_type,
            show_tags,
        } => commands::inspect::handle(inspector, file, tags, media_type, show_tags).await,
        cli::Commands::Redact {
            file,
            keys,
            tags,
            media_type,
            output,
        } => commands::redact::handle(inspector, file, keys, tags, media_type, output).await,
        cli::Commands::Clean {
            file,
            media_type,
            output,
        } => commands::redact::clean(inspector, file, media_type, output).await,
        cli::Commands::Patterns => commands::patterns::handle(&inspector),
    }
}
