#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Layered configuration for the Telekit plugin runtime.
//!
//! # Usage
//!
//! ```rust,no_run
//! use telekit_config::Config;
//!
//! let loaded = Config::load(None).unwrap();
//! println!("plugins live in {}", loaded.config.plugins_dir().display());
//! ```
//!
//! # Configuration Precedence
//!
//! From highest to lowest priority:
//!
//! 1. **Explicit file** (`--config <path>`)
//! 2. **User** (`{config_dir}/telekit/config.toml`)
//! 3. **Environment variables** (`TELEKIT_*`), fallback only
//! 4. **Embedded defaults** (`defaults.toml` compiled into binary)
//!
//! This crate does not depend on the plugin runtime. The host converts
//! these types into runtime settings at startup.

/// Environment variable fallback resolution.
mod env;
/// Configuration error types.
pub mod error;
/// Configuration file discovery and loading.
pub mod loader;
/// Layered configuration merging.
mod merge;
/// Configuration struct definitions.
pub mod types;
/// Configuration validation rules.
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{LoadedConfig, default_plugins_dir, user_config_path};
pub use types::*;

impl Config {
    /// Load configuration with the full precedence chain.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a config file is malformed or the
    /// merged configuration is invalid.
    pub fn load(explicit: Option<&std::path::Path>) -> ConfigResult<LoadedConfig> {
        loader::load(explicit)
    }

    /// The plugin directory, falling back to [`default_plugins_dir`].
    #[must_use]
    pub fn plugins_dir(&self) -> std::path::PathBuf {
        self.plugins
            .directory
            .clone()
            .unwrap_or_else(default_plugins_dir)
    }
}
