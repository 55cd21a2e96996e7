use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::cache::{UsageCache, default_vendor_usage_file};
use crate::cli::Cli;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub cli_binary: Option<String>,
    pub review_args: Option<Vec<String>>,
    pub review_timeout: Option<u64>,
    pub usage_timeout: Option<u64>,
    pub cache_dir: Option<PathBuf>,
    pub vendor_usage_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub cli_binary: String,
    pub review_args: Vec<String>,
    /// Seconds.
    pub review_timeout: u64,
    /// Seconds.
    pub usage_timeout: u64,
    pub cache_dir: PathBuf,
    pub vendor_usage_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cli_binary: "coderabbit".to_string(),
            review_args: vec!["--plain".to_string()],
            review_timeout: 60,
            usage_timeout: 60,
            cache_dir: UsageCache::default_dir(),
            vendor_usage_file: default_vendor_usage_file(),
        }
    }
}

impl Config {
    /// Default config location, `~/.vim4rabbit/config.toml`.
    pub fn default_path() -> PathBuf {
        UsageCache::default_dir().join("config.toml")
    }

    pub fn load(cli: &Cli) -> Result<Self> {
        let file_config = match cli.config {
            Some(ref path) => read_config(path)?,
            None => {
                let path = Self::default_path();
                if path.exists() {
                    read_config(&path)?
                } else {
                    ConfigFile::default()
                }
            }
        };

        let config = merge(file_config, cli);
        validate(&config)?;
        Ok(config)
    }
}

fn read_config(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Err(Error::ConfigNotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<ConfigFile> {
    let config: ConfigFile = toml::from_str(content)?;
    validate_file(&config)?;
    Ok(config)
}

fn validate_file(config: &ConfigFile) -> Result<()> {
    if let Some(ref binary) = config.cli_binary
        && binary.trim().is_empty()
    {
        return Err(Error::ConfigValidation(
            "cli_binary must not be empty".to_string(),
        ));
    }
    if let Some(ref args) = config.review_args
        && args.iter().any(|a| a.is_empty())
    {
        return Err(Error::ConfigValidation(
            "review_args entries must not be empty".to_string(),
        ));
    }
    if config.review_timeout == Some(0) {
        return Err(Error::ConfigValidation(
            "review_timeout must be > 0".to_string(),
        ));
    }
    if config.usage_timeout == Some(0) {
        return Err(Error::ConfigValidation(
            "usage_timeout must be > 0".to_string(),
        ));
    }
    Ok(())
}

/// Checks that also cover values given on the command line.
fn validate(config: &Config) -> Result<()> {
    if config.cli_binary.trim().is_empty() {
        return Err(Error::ConfigValidation(
            "cli_binary must not be empty".to_string(),
        ));
    }
    if config.review_timeout == 0 {
        return Err(Error::ConfigValidation(
            "review_timeout must be > 0".to_string(),
        ));
    }
    Ok(())
}

pub fn merge(file: ConfigFile, cli: &Cli) -> Config {
    let defaults = Config::default();
    Config {
        cli_binary: cli
            .cli_binary
            .clone()
            .or(file.cli_binary)
            .unwrap_or(defaults.cli_binary),
        review_args: file.review_args.unwrap_or(defaults.review_args),
        review_timeout: cli
            .timeout
            .or(file.review_timeout)
            .unwrap_or(defaults.review_timeout),
        usage_timeout: file.usage_timeout.unwrap_or(defaults.usage_timeout),
        cache_dir: cli
            .cache_dir
            .clone()
            .or(file.cache_dir)
            .unwrap_or(defaults.cache_dir),
        vendor_usage_file: file
            .vendor_usage_file
            .unwrap_or(defaults.vendor_usage_file),
    }
}
