//! Command-line interface parsing for casecache
//!
//! This module handles parsing of CLI arguments using clap and turns them into
//! the settings used to build the cache store, the scraper and the resolver.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use thiserror::Error;

use crate::data::scraper::{DEFAULT_DELAY_MS, DEFAULT_SUCCESS_RATE};
use crate::data::CaseIdentifier;
use crate::resolver::DEFAULT_TTL_HOURS;

/// Default address for the HTTP server
pub const DEFAULT_BIND: &str = "127.0.0.1:5000";

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// The success rate is not a probability
    #[error("Invalid success rate: {0}. Expected a value between 0.0 and 1.0")]
    InvalidSuccessRate(f64),

    /// A zero freshness window would never serve from cache
    #[error("Invalid TTL: must be at least 1 hour")]
    InvalidTtl,

    /// No data directory was given and none could be determined
    #[error("Could not determine a data directory; pass --data-dir")]
    NoDataDir,
}

/// casecache - Serve court case data from a 24-hour cache
#[derive(Parser, Debug)]
#[command(name = "casecache")]
#[command(about = "Court case lookups backed by a durable 24-hour cache")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Server settings used when no subcommand is given
    #[command(flatten)]
    pub serve: ServeArgs,
}

/// Subcommands; `serve` is assumed when none is given
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP server
    Serve(ServeArgs),
    /// Resolve a single case and print the document as JSON
    Lookup(LookupArgs),
}

/// Settings shared by every subcommand
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Directory holding cached case records
    #[arg(long, env = "CASECACHE_DATA_DIR", value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Hours a cached record stays fresh
    #[arg(long, default_value_t = DEFAULT_TTL_HOURS as u64, value_name = "HOURS")]
    pub ttl_hours: u64,

    /// Probability that a simulated scrape succeeds
    #[arg(long, default_value_t = DEFAULT_SUCCESS_RATE, value_name = "RATE")]
    pub success_rate: f64,

    /// Simulated scrape delay in milliseconds
    #[arg(long, default_value_t = DEFAULT_DELAY_MS, value_name = "MS")]
    pub scrape_delay_ms: u64,
}

impl Default for StoreArgs {
    fn default() -> Self {
        Self {
            data_dir: None,
            ttl_hours: DEFAULT_TTL_HOURS as u64,
            success_rate: DEFAULT_SUCCESS_RATE,
            scrape_delay_ms: DEFAULT_DELAY_MS,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "CASECACHE_BIND", default_value = DEFAULT_BIND, value_name = "ADDR")]
    pub bind: SocketAddr,

    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(Args, Debug, Clone)]
pub struct LookupArgs {
    /// Case type, e.g. CRL
    #[arg(long = "type", value_name = "TYPE")]
    pub kind: String,

    /// Case number
    #[arg(long)]
    pub number: String,

    /// Filing year
    #[arg(long)]
    pub year: String,

    #[command(flatten)]
    pub store: StoreArgs,
}

impl LookupArgs {
    pub fn case(&self) -> CaseIdentifier {
        CaseIdentifier::new(&self.kind, &self.number, &self.year)
    }
}

/// Validated settings derived from [`StoreArgs`]
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    /// Data directory for the cache store
    pub data_dir: PathBuf,
    /// Freshness window
    pub ttl: chrono::Duration,
    /// Simulated scrape success probability
    pub success_rate: f64,
    /// Simulated scrape delay
    pub scrape_delay: Duration,
}

impl StoreConfig {
    /// Creates a StoreConfig from parsed CLI arguments.
    ///
    /// `default_dir` supplies the data directory when `--data-dir` is absent.
    ///
    /// # Returns
    /// * `Ok(StoreConfig)` with validated settings
    /// * `Err(CliError)` if a value is out of range or no directory is known
    pub fn from_args(
        args: &StoreArgs,
        default_dir: impl FnOnce() -> Option<PathBuf>,
    ) -> Result<Self, CliError> {
        if !(0.0..=1.0).contains(&args.success_rate) {
            return Err(CliError::InvalidSuccessRate(args.success_rate));
        }
        if args.ttl_hours == 0 {
            return Err(CliError::InvalidTtl);
        }
        let ttl_hours = i64::try_from(args.ttl_hours).map_err(|_| CliError::InvalidTtl)?;
        let ttl = chrono::Duration::try_hours(ttl_hours).ok_or(CliError::InvalidTtl)?;

        let data_dir = match &args.data_dir {
            Some(dir) => dir.clone(),
            None => default_dir().ok_or(CliError::NoDataDir)?,
        };

        Ok(StoreConfig {
            data_dir,
            ttl,
            success_rate: args.success_rate,
            scrape_delay: Duration::from_millis(args.scrape_delay_ms),
        })
    }
}
