// Configuration loader with environment variable substitution

use super::types::*;
use crate::formatter::FormatterFactory;
use anyhow::{bail, Context, Result};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file with environment variable substitution
    pub fn load<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
        let content = std::fs::read_to_string(path.as_ref())
            .context("Failed to read config file")?;

        Self::parse(&content)
    }

    /// Parse configuration from YAML text
    pub fn parse(content: &str) -> Result<AppConfig> {
        let content = Self::substitute_env_vars(content);

        let config: AppConfig = serde_yaml::from_str(&content)
            .context("Failed to parse YAML configuration")?;

        Self::validate(&config)?;

        Ok(config)
    }

    /// Substitute ${VAR} and ${VAR:-default} patterns with environment variables
    ///
    /// Examples:
    /// - ${NOWDAWN_API_KEY} -> the key from the environment
    /// - ${STATION:-0} -> 0 (if STATION not set)
    fn substitute_env_vars(content: &str) -> String {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        let re = PATTERN.get_or_init(|| {
            Regex::new(r"\$\{([^}:]+)(?::-([^}]+))?\}").expect("env var pattern is valid")
        });

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            let default_value = caps.get(2).map(|m| m.as_str());

            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => match default_value {
                    Some(default) => default.to_string(),
                    // Keep original if no default and var not found
                    None => format!("${{{}}}", var_name),
                },
            }
        })
        .to_string()
    }

    /// Validate configuration
    fn validate(config: &AppConfig) -> Result<()> {
        if config.uploaders.is_empty() {
            bail!("uploaders cannot be empty");
        }

        for (index, uploader) in config.uploaders.iter().enumerate() {
            if !uploader.enabled {
                continue;
            }

            FormatterFactory::create(&uploader.protocol)
                .with_context(|| format!("uploaders[{}]", index))?;

            // Unresolved ${VAR} left behind by substitution counts as missing
            if uploader.api_key.starts_with("${") {
                bail!(
                    "uploaders[{}]: api_key references unset variable {}",
                    index,
                    uploader.api_key
                );
            }

            uploader
                .validate()
                .with_context(|| format!("uploaders[{}]", index))?;
        }

        Self::validate_log_level(&config.logging.level)
    }

    /// Check a log level name, wherever it came from
    pub fn validate_log_level(level: &str) -> Result<()> {
        match level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            other => bail!("logging.level '{}' is not one of trace, debug, info, warn, error", other),
        }
    }
}
