//! Server configuration.
//!
//! Values come from command-line arguments, an optional TOML file, and
//! built-in defaults, in that order of precedence. The result is resolved
//! once at startup and never changes afterwards.

use std::path::PathBuf;

use clap::Parser;
use serde::Deserialize;
use thiserror::Error;

use crate::resource::Resource;

/// Command-line arguments for the greet server
#[derive(Parser, Debug, Default)]
#[command(name = "greet-server")]
#[command(version)]
#[command(about = "Serves a single greet resource over hand-framed HTTP/1.1", long_about = None)]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to bind to (e.g., 0.0.0.0:6223)
    #[arg(short = 'l', long)]
    pub listen: Option<String>,

    /// Name of the advertised resource
    #[arg(short, long)]
    pub name: Option<String>,

    /// Identifier matched against the second segment of /greet/{id}
    #[arg(short, long)]
    pub id: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

/// TOML configuration file structure
#[derive(Debug, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub resource: ResourceSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ResourceSection {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_id")]
    pub id: String,
}

impl Default for ResourceSection {
    fn default() -> Self {
        Self {
            name: default_name(),
            id: default_id(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0:6223".to_string()
}

fn default_name() -> String {
    "Ameera Khaira Tawfiqa".to_string()
}

fn default_id() -> String {
    "2306256223".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Final resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub listen: String,
    pub resource: Resource,
    pub log_level: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {source}", .path.display())]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file '{}': {source}", .path.display())]
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl Config {
    /// Load configuration from process arguments and the optional TOML file.
    pub fn load() -> Result<Self, ConfigError> {
        Self::resolve(CliArgs::parse())
    }

    pub fn resolve(cli: CliArgs) -> Result<Self, ConfigError> {
        let toml_config = match cli.config {
            Some(ref path) => {
                let contents = std::fs::read_to_string(path)
                    .map_err(|source| ConfigError::FileRead {
                        path: path.clone(),
                        source,
                    })?;
                toml::from_str(&contents).map_err(|source| ConfigError::TomlParse {
                    path: path.clone(),
                    source,
                })?
            }
            None => TomlConfig::default(),
        };

        Ok(Self::merge(cli, toml_config))
    }

    fn merge(cli: CliArgs, file: TomlConfig) -> Self {
        Self {
            listen: cli.listen.unwrap_or(file.server.listen),
            resource: Resource::new(
                cli.name.unwrap_or(file.resource.name),
                cli.id.unwrap_or(file.resource.id),
            ),
            log_level: cli.log_level.unwrap_or(file.logging.level),
        }
    }
}
