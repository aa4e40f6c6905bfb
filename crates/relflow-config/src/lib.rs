//! Configuration management for Relflow.
//!
//! This crate handles loading and validating the optional `relflow.toml`
//! configuration file. Every value has a default, so a missing file is not an
//! error.

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    CONFIG_FILE_NAME, LoadedConfig, default_config_toml, find_and_load_config,
    find_and_load_config_from, find_config_from, load_config,
};
pub use schema::{
    BumpConfig, ChangelogConfig, Config, ManifestConfig, PublishConfig, TargetConfig,
};
