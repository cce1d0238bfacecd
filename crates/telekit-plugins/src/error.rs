//! Plugin error types.

use std::path::PathBuf;

use telekit_di::DiError;

use crate::PluginId;
use crate::state::PluginState;

/// Errors from plugin operations.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    /// A descriptor is missing required metadata or cannot be parsed.
    #[error("malformed plugin descriptor in {origin}: {message}")]
    Malformed {
        /// Where the descriptor came from (file path or caller label).
        origin: String,
        /// What is wrong with it.
        message: String,
    },

    /// The plugin's platform requirement does not match the host.
    #[error("plugin {plugin_id} requires platform {required}, host is {host}")]
    Incompatible {
        /// The rejected plugin.
        plugin_id: PluginId,
        /// The plugin's version requirement.
        required: String,
        /// The running host version.
        host: String,
    },

    /// Entry point construction or module/extension registration failed.
    #[error("plugin load failed: {plugin_id} - {message}")]
    LoadFailed {
        /// The plugin that failed to load.
        plugin_id: PluginId,
        /// Failure reason.
        message: String,
    },

    /// The plugin's start hook failed.
    #[error("plugin start failed: {plugin_id} - {message}")]
    StartFailed {
        /// The plugin that failed to start.
        plugin_id: PluginId,
        /// Failure reason.
        message: String,
    },

    /// The plugin's stop hook failed. The plugin is stopped regardless.
    #[error("plugin stop hook failed: {plugin_id} - {message}")]
    StopFailed {
        /// The plugin whose stop hook failed.
        plugin_id: PluginId,
        /// Failure reason.
        message: String,
    },

    /// A contribution names an extension point the host never declared.
    #[error("plugin {plugin_id} contributes to unknown extension point `{extension_point}`")]
    UnknownExtensionPoint {
        /// The contributing plugin.
        plugin_id: PluginId,
        /// Type name of the undeclared extension point.
        extension_point: &'static str,
    },

    /// The plugin ID is invalid.
    #[error("invalid plugin id: {0}")]
    InvalidId(String),

    /// The requested plugin is not known to the manager.
    #[error("plugin not found: {0}")]
    NotFound(PluginId),

    /// A plugin with this ID is already known to the manager.
    #[error("plugin already registered: {0}")]
    AlreadyRegistered(PluginId),

    /// The operation is not allowed from the plugin's current state.
    #[error("cannot {operation} plugin {plugin_id} in state {state}")]
    InvalidTransition {
        /// The plugin.
        plugin_id: PluginId,
        /// Its current state.
        state: PluginState,
        /// The rejected operation.
        operation: &'static str,
    },

    /// Reading a descriptor or scanning a directory failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The path being accessed.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The dependency container rejected an operation.
    #[error(transparent)]
    Di(#[from] DiError),
}

impl PluginError {
    /// Convenience constructor for [`PluginError::Malformed`].
    pub fn malformed(origin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Malformed {
            origin: origin.into(),
            message: message.into(),
        }
    }
}

/// Result type for plugin operations.
pub type PluginResult<T> = Result<T, PluginError>;
