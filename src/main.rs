use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use satchel::app::AppContext;
use satchel::cli::{commands, Cli, Commands};
use satchel::config::Config;
use satchel::domain::QueryKey;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(server) = cli.server {
        config.server.base_url = server;
    }
    let ctx = AppContext::new(config)?;

    match cli.command {
        Commands::Favorites { count } => {
            let count = count.unwrap_or(ctx.config.lists.favorites_count);
            commands::list(&ctx, QueryKey::favorites(count)).await?;
        }
        Commands::Recents { count } => {
            let count = count.unwrap_or(ctx.config.lists.recents_count);
            commands::list(&ctx, QueryKey::recents(count)).await?;
        }
        Commands::Search { query } => {
            commands::list(&ctx, QueryKey::search(query.join(" "))).await?;
        }
        Commands::Add { url } => {
            commands::add(&ctx, &url).await?;
        }
        Commands::Star { url } => {
            commands::set_favorite(&ctx, &url, true).await?;
        }
        Commands::Unstar { url } => {
            commands::set_favorite(&ctx, &url, false).await?;
        }
        Commands::Open { url } => {
            commands::open(&ctx, &url).await?;
        }
        Commands::Shell => {
            commands::shell(&ctx).await?;
        }
    }

    ctx.shutdown();
    Ok(())
}
