//! Configuration schema.

use serde::{Deserialize, Serialize};

use crate::{ConfigError, ConfigResult};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Manifest holding the version.
    #[serde(default)]
    pub manifest: ManifestConfig,

    /// Deployment config file to patch.
    #[serde(default)]
    pub target: TargetConfig,

    /// Version bump step.
    #[serde(default)]
    pub bump: BumpConfig,

    /// Changelog step.
    #[serde(default)]
    pub changelog: ChangelogConfig,

    /// Publish step.
    #[serde(default)]
    pub publish: PublishConfig,
}

impl Config {
    /// Checks values serde cannot reject on its own.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for empty paths or keys.
    pub fn validate(&self) -> ConfigResult<()> {
        let required = [
            ("manifest.path", &self.manifest.path),
            ("target.path", &self.target.path),
            ("target.section", &self.target.section),
            ("target.key", &self.target.key),
            ("bump.level", &self.bump.level),
            ("changelog.output", &self.changelog.output),
        ];

        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{field} must not be empty")));
            }
        }

        Ok(())
    }
}

/// Manifest configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestConfig {
    /// Path to the manifest.
    #[serde(default = "default_manifest_path")]
    pub path: String,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            path: default_manifest_path(),
        }
    }
}

fn default_manifest_path() -> String {
    "Cargo.toml".to_string()
}

/// Target configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Path to the YAML file.
    #[serde(default = "default_target_path")]
    pub path: String,

    /// Top-level mapping holding the version.
    #[serde(default = "default_section")]
    pub section: String,

    /// Key set to the version inside the section.
    #[serde(default = "default_key")]
    pub key: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            path: default_target_path(),
            section: default_section(),
            key: default_key(),
        }
    }
}

fn default_target_path() -> String {
    "example/.confkit/spaces/confkit/engine.yml".to_string()
}

fn default_section() -> String {
    "environment".to_string()
}

fn default_key() -> String {
    "VERSION".to_string()
}

/// Bump step configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BumpConfig {
    /// Run `cargo release` before reading the version.
    #[serde(default)]
    pub enabled: bool,

    /// Bump level (major, minor, patch, release, rc, beta, alpha).
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for BumpConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "patch".to_string()
}

/// Changelog step configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangelogConfig {
    /// Run `git cliff`.
    #[serde(default)]
    pub enabled: bool,

    /// Output file path.
    #[serde(default = "default_changelog_output")]
    pub output: String,

    /// Tag prefix for the release section; empty disables `--tag`.
    #[serde(default)]
    pub tag_prefix: String,
}

impl Default for ChangelogConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            output: default_changelog_output(),
            tag_prefix: String::new(),
        }
    }
}

fn default_changelog_output() -> String {
    "CHANGELOG.md".to_string()
}

/// Publish step configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Run `cargo publish`.
    #[serde(default)]
    pub enabled: bool,

    /// Registry to publish to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry: Option<String>,

    /// Pass `--allow-dirty`.
    #[serde(default)]
    pub allow_dirty: bool,
}
