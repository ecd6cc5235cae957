use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::load_config;

#[derive(Parser)]
#[command(name = "cairn")]
#[command(about = "Multi-chain explorer aggregation service", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    Run(RunCommand),
    /// Pin a provider as the default for one (network, operation) pair.
    PinProvider(PinProviderArgs),
}

#[derive(Args)]
pub struct RunCommand {
    #[command(subcommand)]
    pub mode: RunMode,
}

#[derive(Subcommand)]
pub enum RunMode {
    Server(CliArgs),
}

#[derive(Args, Clone)]
pub struct CliArgs {
    /// Path to the config file
    #[arg(short, long, default_value = "config.toml")]
    pub config_path: String,
}

#[derive(Args, Clone)]
pub struct PinProviderArgs {
    /// Path to the config file
    #[arg(short, long, default_value = "config.toml")]
    pub config_path: String,

    /// Network the pin applies to
    #[arg(long)]
    pub network: String,

    /// Operation to pin, e.g. block_txs or balance
    #[arg(long)]
    pub operation: String,

    /// Provider name
    #[arg(long)]
    pub provider: String,

    /// Optional provider URL id; falls back to the provider default URL
    #[arg(long)]
    pub url_id: Option<i32>,
}

impl From<CliArgs> for Config {
    fn from(args: CliArgs) -> Self {
        load_config(&args.config_path).expect("Failed to load config")
    }
}

impl From<PinProviderArgs> for Config {
    fn from(args: PinProviderArgs) -> Self {
        load_config(&args.config_path).expect("Failed to load config")
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SelectionConfig {
    #[serde(default = "default_lock_timeout_secs")]
    pub lock_timeout_secs: u64,
    #[serde(default = "default_local_cache_ttl_secs")]
    pub local_cache_ttl_secs: u64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        SelectionConfig {
            lock_timeout_secs: default_lock_timeout_secs(),
            local_cache_ttl_secs: default_local_cache_ttl_secs(),
        }
    }
}

fn default_max_connections() -> u32 {
    10
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_lock_timeout_secs() -> u64 {
    10
}

fn default_local_cache_ttl_secs() -> u64 {
    5
}
