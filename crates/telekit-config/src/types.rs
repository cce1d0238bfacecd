//! Configuration struct definitions.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the Telekit runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where plugins come from and which ones are switched off.
    pub plugins: PluginsSection,
    /// Logging level, format, and per-crate directives.
    pub logging: LoggingSection,
}

/// Plugin discovery settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginsSection {
    /// Directory scanned for plugin units. `None` uses
    /// [`default_plugins_dir`](crate::default_plugins_dir).
    pub directory: Option<PathBuf>,
    /// Ids of plugins that must not be started.
    pub disabled: Vec<String>,
    /// Override for the host platform version used in compatibility
    /// checks. `None` uses the running host's version.
    pub platform_version: Option<String>,
}

impl PluginsSection {
    /// Whether a plugin id is listed as disabled.
    #[must_use]
    pub fn is_disabled(&self, id: &str) -> bool {
        self.disabled.iter().any(|d| d == id)
    }
}

/// Logging and tracing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"` (human-friendly), `"compact"` (one-line),
    /// `"json"` (structured), or `"full"` (verbose).
    pub format: String,
    /// Per-crate tracing directives (e.g. `["telekit_plugins=debug"]`).
    pub directives: Vec<String>,
    /// Write daily-rotated log files to this directory instead of stderr.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
            directory: None,
        }
    }
}
