//! Host error types.

use telekit_config::ConfigError;
use telekit_plugins::PluginError;
use thiserror::Error;

/// Errors raised while wiring or booting the host.
#[derive(Debug, Error)]
pub enum HostError {
    /// The configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The plugin runtime rejected an operation.
    #[error(transparent)]
    Plugin(#[from] PluginError),

    /// The configured or built-in platform version is not semver.
    #[error("invalid platform version '{version}': {source}")]
    InvalidPlatformVersion {
        /// Text that failed to parse.
        version: String,
        /// Underlying parse error.
        #[source]
        source: semver::Error,
    },
}

/// Result type for host operations.
pub type HostResult<T> = Result<T, HostError>;
