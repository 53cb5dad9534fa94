//! casecache - Court case lookups backed by a 24-hour cache
//!
//! Runs an HTTP server answering `POST /api/scrape`, or resolves a single case
//! from the command line.

use std::env;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use casecache::cache::{default_data_dir, CacheStore};
use casecache::cli::{Cli, Command, StoreArgs, StoreConfig};
use casecache::data::SimulatedScraper;
use casecache::resolver::{CaseResolver, ResolverConfig};
use casecache::server;

/// Builds the resolver from validated store settings
fn build_resolver(args: &StoreArgs) -> Result<CaseResolver> {
    let config = StoreConfig::from_args(args, default_data_dir)?;
    info!(
        data_dir = %config.data_dir.display(),
        ttl_hours = config.ttl.num_hours(),
        "Opening case store"
    );

    let store = CacheStore::with_dir(&config.data_dir);
    let scraper = SimulatedScraper::with_settings(config.success_rate, config.scrape_delay);
    Ok(CaseResolver::new(
        store,
        Arc::new(scraper),
        ResolverConfig {
            freshness_window: config.ttl,
        },
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let log_level = env::var("RUST_LOG")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(Level::INFO);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Serve(cli.serve));

    match command {
        Command::Serve(args) => {
            let resolver = Arc::new(build_resolver(&args.store)?);
            info!("Starting casecache server");
            if let Err(e) = server::serve(args.bind, resolver).await {
                error!(error = %e, "Server error");
                return Err(e.into());
            }
            info!("Shutdown complete.");
        }
        Command::Lookup(args) => {
            let resolver = build_resolver(&args.store)?;
            let resolved = resolver.resolve(&args.case()).await?;
            let body = resolved.into_response_body();
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
    }

    Ok(())
}
