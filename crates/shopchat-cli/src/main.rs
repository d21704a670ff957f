mod cli;

use anyhow::Context;
use clap::Parser;
use shopchat_catalog::CatalogSource;
use shopchat_config::{AppConfig, ConfigLoader};
use shopchat_gateway::{GatewayServer, bootstrap};
use shopchat_security::RedactingWriter;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; real environment variables still apply.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = ConfigLoader::new(cli.config.clone())
        .load()
        .context("failed to load configuration")?;

    init_tracing(&config, cli.log_level.as_deref());

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            GatewayServer::new(config)
                .run()
                .await
                .context("gateway failed")?;
        }
        Commands::Products => {
            let catalog = bootstrap::build_catalog(&config.catalog)?;
            let products = catalog
                .fetch_available_products()
                .await
                .context("failed to fetch products")?;
            println!("{}", products.to_prompt_text());
        }
        Commands::History { user_id } => {
            let store = bootstrap::build_history(&config.history).await?;
            let turns = store
                .read_all(&user_id)
                .await
                .with_context(|| format!("failed to read history for {user_id}"))?;
            if turns.is_empty() {
                println!("no history for {user_id}");
            }
            for turn in turns {
                println!("{turn}");
            }
        }
    }

    Ok(())
}

/// `RUST_LOG` wins, then `--log-level`, then `log.level` from config.
fn init_tracing(config: &AppConfig, cli_level: Option<&str>) {
    let level = cli_level.unwrap_or(&config.log.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(RedactingWriter::stderr());

    if config.log.json {
        builder.json().init();
    } else {
        builder.with_target(false).init();
    }
}
