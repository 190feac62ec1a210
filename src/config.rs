use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("failed to parse {name} as boolean: {value}")]
    ParseBool { name: String, value: String },
}

/// Settings for the command-line front end, loaded from environment
/// variables.
///
/// Network parameters of the resolution pipeline are fixed constants and are
/// deliberately absent here.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory downloaded media is written to.
    pub output_dir: PathBuf,
    /// Leading component of every output file name.
    pub file_prefix: String,
    /// Maximum simultaneous media downloads.
    pub download_concurrency: usize,
    /// Print resolved descriptors as JSON instead of downloading them.
    pub resolve_only: bool,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an unparseable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            output_dir: PathBuf::from(env_or_default("OUTPUT_DIR", "./downloads")),
            file_prefix: env_or_default("FILE_PREFIX", "xhs"),
            download_concurrency: parse_env_usize("DOWNLOAD_CONCURRENCY", 4)?,
            resolve_only: parse_env_bool("RESOLVE_ONLY", false)?,
        })
    }

    /// Defaults suitable for tests; does not read the environment.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            output_dir: PathBuf::from("./target/test-downloads"),
            file_prefix: "test".to_string(),
            download_concurrency: 1,
            resolve_only: false,
        }
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.download_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                name: "DOWNLOAD_CONCURRENCY".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.file_prefix.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "FILE_PREFIX".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        if self
            .file_prefix
            .chars()
            .any(|c| matches!(c, '/' | '\\') || c.is_control())
        {
            return Err(ConfigError::InvalidValue {
                name: "FILE_PREFIX".to_string(),
                message: format!("'{}' is not a valid file name prefix", self.file_prefix),
            });
        }
        Ok(())
    }
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_usize(name: &str, default: usize) -> Result<usize, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_bool(name: &str, default: bool) -> Result<bool, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => match val.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::ParseBool {
                name: name.to_string(),
                value: val,
            }),
        },
        _ => Ok(default),
    }
}
