//! Server configuration via CLI args and environment variables.

use std::time::Duration;

use clap::Parser;
use keeper_service::ServiceConfig;

/// HTTP server for the Keeper in-memory session store.
#[derive(Parser, Debug, Clone)]
#[command(name = "keeper-server", version, about)]
pub struct Config {
    /// Bind address.
    #[arg(long, default_value = "0.0.0.0", env = "KEEPER_HOST")]
    pub host: String,

    /// Bind port.
    #[arg(long, default_value_t = 8080, env = "KEEPER_PORT")]
    pub port: u16,

    /// Number of store shards. Fixed for the lifetime of the process.
    #[arg(long, default_value_t = 100, env = "KEEPER_SHARDS")]
    pub shards: usize,

    /// Seconds between reaper passes over each shard.
    #[arg(long, default_value_t = 2, env = "KEEPER_REAP_INTERVAL")]
    pub reap_interval: u64,

    /// CORS allowed origins (comma-separated). Empty for no CORS.
    #[arg(long, env = "KEEPER_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Vec<String>,

    /// Log level.
    #[arg(long, default_value = "info", env = "KEEPER_LOG_LEVEL")]
    pub log_level: String,

    /// Log format: "pretty" or "json".
    #[arg(long, default_value = "pretty", env = "KEEPER_LOG_FORMAT")]
    pub log_format: String,
}

impl Config {
    /// Parses configuration from CLI args and env vars.
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// The subset of settings the service layer needs.
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            shard_count: self.shards,
            reap_interval: Duration::from_secs(self.reap_interval),
        }
    }
}
