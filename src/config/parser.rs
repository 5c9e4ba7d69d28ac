use crate::config::types::Config;
use crate::config::validation::{validate, validate_thread};
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so exports can be traced back to the settings that
/// produced them.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

/// Reads thread identifiers from a newline-delimited file
///
/// Lines are trimmed and blank lines are skipped. An unreadable file is a
/// configuration failure.
pub fn read_thread_file(path: &Path) -> Result<Vec<String>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ThreadFile {
        path: path.display().to_string(),
        source,
    })?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Merges threads given on the command line with those from an optional file
///
/// Command-line threads come first. Duplicates keep their first position.
/// Every identifier is validated; an empty result is not an error here, the
/// caller decides what an empty batch means.
pub fn collect_threads(cli: &[String], file: Option<&Path>) -> Result<Vec<String>, ConfigError> {
    let mut threads: Vec<String> = cli
        .iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    if let Some(path) = file {
        threads.extend(read_thread_file(path)?);
    }

    let mut seen = HashSet::new();
    threads.retain(|t| seen.insert(t.clone()));

    for thread in &threads {
        validate_thread(thread)?;
    }

    Ok(threads)
}
