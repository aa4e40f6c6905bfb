//! Configuration loader.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{Config, ConfigError, ConfigResult};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "relflow.toml";

/// A configuration together with the directory its relative paths resolve against.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// The parsed (or default) configuration.
    pub config: Config,

    /// Directory relative paths are resolved against.
    pub root: PathBuf,

    /// The file the configuration came from, `None` for defaults.
    pub source: Option<PathBuf>,
}

impl LoadedConfig {
    /// Resolves a configured path against the root directory.
    #[must_use]
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

/// Loads configuration from the given path.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed, or validated.
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<Config> {
    let path = path.as_ref();
    debug!(?path, "loading configuration");

    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;

    Ok(config)
}

/// Finds the nearest configuration file, walking up from `start_dir`.
pub fn find_config_from(start_dir: impl AsRef<Path>) -> Option<PathBuf> {
    start_dir
        .as_ref()
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|candidate| candidate.is_file())
}

/// Finds and loads configuration from the current directory or parents.
///
/// # Errors
///
/// Returns an error if a configuration file exists but cannot be parsed.
pub fn find_and_load_config() -> ConfigResult<LoadedConfig> {
    let current_dir = std::env::current_dir()?;
    find_and_load_config_from(&current_dir)
}

/// Finds and loads configuration starting from the given directory.
///
/// Falls back to the defaults, rooted at `start_dir`, when no file is found.
///
/// # Errors
///
/// Returns an error if a configuration file exists but cannot be parsed.
pub fn find_and_load_config_from(start_dir: impl AsRef<Path>) -> ConfigResult<LoadedConfig> {
    let start_dir = start_dir.as_ref();

    let Some(path) = find_config_from(start_dir) else {
        debug!(?start_dir, "no configuration file found, using defaults");
        return Ok(LoadedConfig {
            config: Config::default(),
            root: start_dir.to_path_buf(),
            source: None,
        });
    };

    let config = load_config(&path)?;
    let root = path
        .parent()
        .map_or_else(|| start_dir.to_path_buf(), Path::to_path_buf);

    Ok(LoadedConfig {
        config,
        root,
        source: Some(path),
    })
}

/// Renders the default configuration as TOML.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn default_config_toml() -> ConfigResult<String> {
    let body = toml::to_string_pretty(&Config::default())?;
    Ok(format!(
        "# Relflow release pipeline configuration.\n\
         # Relative paths resolve against this file's directory.\n\n{body}"
    ))
}
