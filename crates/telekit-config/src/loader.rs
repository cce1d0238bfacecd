//! Config file discovery and layered loading.
//!
//! `Config::load()` runs these steps:
//! 1. Merge the user config (`{config_dir}/telekit/config.toml`)
//! 2. Merge the explicitly requested file, if any
//! 3. Fill fields neither file set from `TELEKIT_*` variables
//! 4. Merge the result over the embedded `defaults.toml`
//! 5. Deserialize and validate

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::env::{apply_env_fallbacks, collect_env_vars};
use crate::error::{ConfigError, ConfigResult};
use crate::merge::deep_merge;
use crate::types::Config;
use crate::validate;

/// Embedded default configuration.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Maximum allowed config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1_048_576;

/// A loaded configuration together with the files that contributed to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedConfig {
    /// The merged, validated configuration.
    pub config: Config,
    /// Files merged into the defaults, lowest precedence first.
    pub loaded_files: Vec<PathBuf>,
}

/// Load the configuration with layered file precedence.
///
/// # Errors
///
/// Returns a [`ConfigError`] if any config file is malformed, if
/// `explicit` does not exist, or if the merged configuration fails
/// validation.
pub fn load(explicit: Option<&Path>) -> ConfigResult<LoadedConfig> {
    load_with(
        user_config_path().as_deref(),
        explicit,
        &collect_env_vars(),
    )
}

/// [`load`] with every input supplied by the caller.
///
/// # Errors
///
/// Same as [`load`].
pub fn load_with(
    user_config: Option<&Path>,
    explicit: Option<&Path>,
    env_vars: &HashMap<String, String>,
) -> ConfigResult<LoadedConfig> {
    let mut file_layers = toml::Value::Table(toml::map::Map::new());
    let mut loaded_files = Vec::new();

    if let Some(path) = user_config
        && let Some(overlay) = try_load_file(path)?
    {
        deep_merge(&mut file_layers, &overlay);
        loaded_files.push(path.to_path_buf());
        info!(path = %path.display(), "loaded user config");
    }

    if let Some(path) = explicit {
        let overlay = try_load_file(path)?.ok_or_else(|| ConfigError::Missing {
            path: path.to_path_buf(),
        })?;
        deep_merge(&mut file_layers, &overlay);
        loaded_files.push(path.to_path_buf());
        info!(path = %path.display(), "loaded config file");
    }

    let env_count = apply_env_fallbacks(&mut file_layers, env_vars);
    if env_count > 0 {
        debug!(count = env_count, "applied environment variable fallbacks");
    }

    let mut merged = embedded_defaults()?;
    deep_merge(&mut merged, &file_layers);

    let config: Config =
        merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::Malformed {
                origin: "<merged config>".to_owned(),
                source: e,
            })?;

    validate::validate(&config)?;

    Ok(LoadedConfig {
        config,
        loaded_files,
    })
}

/// Load a config from a specific file path (no layering).
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be read or parsed, or
/// fails validation.
pub fn load_file(path: &Path) -> ConfigResult<Config> {
    let value = try_load_file(path)?.ok_or_else(|| ConfigError::Missing {
        path: path.to_path_buf(),
    })?;
    let config: Config = value
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::Malformed {
            origin: path.display().to_string(),
            source: e,
        })?;
    validate::validate(&config)?;
    Ok(config)
}

/// Location of the per-user config file, if the platform has one.
#[must_use]
pub fn user_config_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("telekit").join("config.toml"))
}

/// Directory scanned for plugin units when the config names none.
#[must_use]
pub fn default_plugins_dir() -> PathBuf {
    directories::BaseDirs::new().map_or_else(
        || PathBuf::from("plugins"),
        |d| d.data_dir().join("telekit").join("plugins"),
    )
}

fn embedded_defaults() -> ConfigResult<toml::Value> {
    toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::Malformed {
        origin: "<embedded defaults>".to_owned(),
        source: e,
    })
}

/// Try to load a file, returning `None` if the file doesn't exist.
fn try_load_file(path: &Path) -> ConfigResult<Option<toml::Value>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "config file not found, skipping");
            return Ok(None);
        },
        Err(e) => {
            return Err(ConfigError::Unreadable {
                path: path.to_path_buf(),
                source: e,
            });
        },
    };

    let size = u64::try_from(content.len()).unwrap_or(u64::MAX);
    if size > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::TooLarge {
            path: path.to_path_buf(),
            size,
            limit: MAX_CONFIG_FILE_SIZE,
        });
    }

    let value: toml::Value = toml::from_str(&content).map_err(|e| ConfigError::Malformed {
        origin: path.display().to_string(),
        source: e,
    })?;

    Ok(Some(value))
}
