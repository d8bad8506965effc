use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fbzone::app::AppContext;
use fbzone::cli::{commands, Cli, Commands};
use fbzone::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => Config::load_or_create(path)?,
        None => Config::load()?,
    };
    if let Some(preset) = cli.preset {
        config.browser = preset.apply(&config.browser);
    }
    let ctx = AppContext::new(config);

    match cli.command {
        Commands::Serve { port } => {
            commands::serve(&ctx, port).await?;
        }
        Commands::Scrape { url } => {
            commands::scrape(&ctx, &url).await?;
        }
        Commands::Photo { url, output } => {
            commands::photo(&ctx, &url, output).await?;
        }
        Commands::Profile { url, output } => {
            commands::profile(&ctx, &url, output).await?;
        }
        Commands::Candidates { url, profile } => {
            commands::candidates(&ctx, &url, profile).await?;
        }
        Commands::Description { url } => {
            commands::description(&ctx, &url).await?;
        }
    }

    Ok(())
}
