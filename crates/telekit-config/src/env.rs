//! Environment variable fallbacks.
//!
//! Environment variables are **fallback**, not override: they only fill
//! fields that no config file set.

use std::collections::HashMap;

use tracing::debug;

use crate::merge::{has_path, set_path};

/// Mapping from environment variable name to config field path.
struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
}

const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "TELEKIT_PLUGINS_DIR",
        field_path: "plugins.directory",
    },
    EnvMapping {
        var_name: "TELEKIT_PLATFORM_VERSION",
        field_path: "plugins.platform_version",
    },
    EnvMapping {
        var_name: "TELEKIT_LOG_LEVEL",
        field_path: "logging.level",
    },
    EnvMapping {
        var_name: "TELEKIT_LOG_FORMAT",
        field_path: "logging.format",
    },
];

/// Collect the `TELEKIT_*` variables of the current process.
pub(crate) fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars()
        .filter(|(name, _)| name.starts_with("TELEKIT_"))
        .collect()
}

/// Fill unset fields of the file layers from the environment.
///
/// Returns the number of fields set.
pub(crate) fn apply_env_fallbacks(
    file_layers: &mut toml::Value,
    env_vars: &HashMap<String, String>,
) -> usize {
    let mut applied: usize = 0;
    for mapping in ENV_MAPPINGS {
        let Some(value) = env_vars.get(mapping.var_name) else {
            continue;
        };
        if value.trim().is_empty() || has_path(file_layers, mapping.field_path) {
            continue;
        }
        debug!(
            var = mapping.var_name,
            field = mapping.field_path,
            "applying environment fallback"
        );
        set_path(
            file_layers,
            mapping.field_path,
            toml::Value::String(value.clone()),
        );
        applied = applied.saturating_add(1);
    }
    applied
}
