// Configuration management for the Proton VPN handle service
// Supports CLI arguments, environment variables and a TOML config file

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::Level;

use crate::detection::fallback::{DEFAULT_FALLBACK_COUNTRIES, FallbackMode};
use crate::detection::{PrefixBucket, PrefixTable};
use crate::error::{AppError, AppResult};

/// Free Proton VPN handle API - flags clients connecting from free VPN ranges
#[derive(Parser, Debug, Clone)]
#[command(name = "proton-handle")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Web server port
    #[arg(short, long, default_value = "3000", env = "PORT")]
    pub port: u16,

    /// Bind address (default: 0.0.0.0)
    #[arg(short, long, env = "HANDLE_BIND")]
    pub bind: Option<String>,

    /// Logging level (error, warn, info, debug, trace)
    #[arg(short, long, env = "HANDLE_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Path to configuration file
    #[arg(short, long, env = "HANDLE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Country assignment for addresses outside the VPN ranges
    #[arg(long, value_enum, env = "HANDLE_FALLBACK")]
    pub fallback: Option<FallbackMode>,

    /// Server name reported by /dc
    #[arg(long, env = "HANDLE_SERVER_NAME")]
    pub server_name: Option<String>,
}

/// Configuration file structure (TOML format)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigFile {
    /// Server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Detection settings
    #[serde(default)]
    pub detection: DetectionConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Name reported in the `server` field of /dc
    #[serde(default = "default_server_name")]
    pub server_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Fallback mode for unmatched addresses
    #[serde(default = "default_fallback")]
    pub fallback: FallbackMode,

    /// Countries picked from in random fallback mode
    #[serde(default = "default_fallback_countries")]
    pub fallback_countries: Vec<String>,

    /// Replacement prefix table, in match order
    #[serde(default)]
    pub buckets: Option<Vec<PrefixBucket>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}
fn default_server_name() -> String {
    "render-proton-handle".to_string()
}
fn default_fallback() -> FallbackMode {
    FallbackMode::Random
}
fn default_fallback_countries() -> Vec<String> {
    DEFAULT_FALLBACK_COUNTRIES.iter().map(|c| c.to_string()).collect()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_address: default_bind_address(),
            server_name: default_server_name(),
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        DetectionConfig {
            fallback: default_fallback(),
            fallback_countries: default_fallback_countries(),
            buckets: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
        }
    }
}

/// Merged configuration from all sources
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub bind_address: String,
    pub log_level: Level,
    pub server_name: String,
    pub fallback: FallbackMode,
    pub fallback_countries: Vec<String>,
    pub prefix_table: PrefixTable,
    /// Config file the settings were read from, if any
    pub source: Option<PathBuf>,
}

impl Config {
    /// Load configuration from all sources (CLI args, env, config file, defaults)
    /// Priority: CLI args > Environment variables > Config file > Defaults
    pub fn load() -> anyhow::Result<Self> {
        let cli_args = CliArgs::parse();
        Ok(Config::from_cli(cli_args)?)
    }

    pub fn from_cli(cli_args: CliArgs) -> AppResult<Self> {
        let source = match &cli_args.config {
            Some(path) => Some(path.clone()),
            None => {
                // Try loading from default locations
                let default_paths = [PathBuf::from("handle.toml"), PathBuf::from("config.toml")];
                default_paths.into_iter().find(|p| p.exists())
            }
        };

        let config_file = match &source {
            Some(path) => read_config_file(path)?,
            None => ConfigFile::default(),
        };

        let mut config = Config::merge(cli_args, config_file)?;
        config.source = source;
        Ok(config)
    }

    /// Merge CLI arguments over a parsed config file
    pub fn merge(cli_args: CliArgs, config_file: ConfigFile) -> AppResult<Self> {
        let bind_address = cli_args.bind.unwrap_or(config_file.server.bind_address);
        let server_name = cli_args.server_name.unwrap_or(config_file.server.server_name);

        let log_level = parse_log_level(
            cli_args
                .log_level
                .as_deref()
                .unwrap_or(&config_file.logging.level),
        )?;

        let fallback = cli_args.fallback.unwrap_or(config_file.detection.fallback);

        let prefix_table = match config_file.detection.buckets {
            Some(buckets) => {
                validate_buckets(&buckets)?;
                PrefixTable::new(buckets)
            }
            None => PrefixTable::default(),
        };

        Ok(Config {
            port: cli_args.port,
            bind_address,
            log_level,
            server_name,
            fallback,
            fallback_countries: config_file.detection.fallback_countries,
            prefix_table,
            source: None,
        })
    }
}

fn read_config_file(path: &Path) -> AppResult<ConfigFile> {
    let config_content = std::fs::read_to_string(path)?;
    Ok(toml::from_str::<ConfigFile>(&config_content)?)
}

fn validate_buckets(buckets: &[PrefixBucket]) -> AppResult<()> {
    if buckets.is_empty() {
        return Err(AppError::Config("prefix table has no buckets".to_string()));
    }
    for bucket in buckets {
        if bucket.country.trim().is_empty() {
            return Err(AppError::Config("bucket with empty country code".to_string()));
        }
        if bucket.prefixes.iter().any(|p| p.is_empty()) {
            return Err(AppError::Config(format!(
                "bucket {} contains an empty prefix",
                bucket.country
            )));
        }
    }
    Ok(())
}

fn parse_log_level(level_str: &str) -> AppResult<Level> {
    match level_str.to_lowercase().as_str() {
        "error" => Ok(Level::ERROR),
        "warn" => Ok(Level::WARN),
        "info" => Ok(Level::INFO),
        "debug" => Ok(Level::DEBUG),
        "trace" => Ok(Level::TRACE),
        _ => Err(AppError::Config(format!("Invalid log level: {}", level_str))),
    }
}
