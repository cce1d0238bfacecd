//! Errors raised while loading or validating Telekit configuration.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Why a configuration could not be produced.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("config file {} does not exist", path.display())]
    Missing {
        /// The requested path.
        path: PathBuf,
    },

    /// A config file exists but could not be read.
    #[error("cannot read config file {}: {source}", path.display())]
    Unreadable {
        /// The file being read.
        path: PathBuf,
        /// The I/O failure.
        #[source]
        source: io::Error,
    },

    /// A config layer is not valid TOML or does not fit the schema.
    #[error("malformed config in {origin}: {source}")]
    Malformed {
        /// A file path, or a label such as `<embedded defaults>`.
        origin: String,
        /// The TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// A config file is over the size limit.
    #[error("config file {} is {size} bytes, over the {limit} byte limit", path.display())]
    TooLarge {
        /// The offending file.
        path: PathBuf,
        /// Its size in bytes.
        size: u64,
        /// The limit in bytes.
        limit: u64,
    },

    /// A setting has a value Telekit cannot use.
    #[error("invalid value for `{key}`: {reason}")]
    Invalid {
        /// Dotted key of the setting, e.g. `plugins.platform_version`.
        key: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
