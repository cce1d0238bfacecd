//! Post-merge configuration validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Validate a fully-merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_plugins(config)?;
    validate_logging(config)?;
    Ok(())
}

/// Same rule the plugin runtime applies to plugin ids.
fn is_valid_plugin_id(id: &str) -> bool {
    let is_separator = |c: char| c == '-' || c == '.';
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || is_separator(c))
        && !id.starts_with(is_separator)
        && !id.ends_with(is_separator)
}

fn validate_plugins(config: &Config) -> ConfigResult<()> {
    let p = &config.plugins;

    if let Some(bad) = p.disabled.iter().find(|id| !is_valid_plugin_id(id)) {
        return Err(ConfigError::invalid(
            "plugins.disabled",
            format!("'{bad}' is not a valid plugin id"),
        ));
    }

    if let Some(version) = &p.platform_version
        && let Err(e) = semver::Version::parse(version.trim())
    {
        return Err(ConfigError::invalid(
            "plugins.platform_version",
            format!("'{version}' is not a semantic version: {e}"),
        ));
    }

    if p.directory.as_ref().is_some_and(|d| d.as_os_str().is_empty()) {
        return Err(ConfigError::invalid(
            "plugins.directory",
            "directory must not be empty",
        ));
    }

    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let l = &config.logging;

    if !matches!(
        l.level.to_ascii_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    ) {
        return Err(ConfigError::invalid(
            "logging.level",
            format!(
                "unsupported level '{}'; expected one of: trace, debug, info, warn, error",
                l.level
            ),
        ));
    }

    if !matches!(
        l.format.to_ascii_lowercase().as_str(),
        "pretty" | "compact" | "json" | "full"
    ) {
        return Err(ConfigError::invalid(
            "logging.format",
            format!(
                "unsupported format '{}'; expected one of: pretty, compact, json, full",
                l.format
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(result: ConfigResult<()>) -> String {
        match result {
            Err(ConfigError::Invalid { key, .. }) => key.to_owned(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn defaults_are_valid() {
        validate(&Config::default()).unwrap();
    }

    #[test]
    fn rejects_malformed_disabled_ids() {
        let mut config = Config::default();
        config.plugins.disabled = vec!["base64".into(), "Bad Id".into()];
        assert_eq!(field_of(validate(&config)), "plugins.disabled");
    }

    #[test]
    fn rejects_unparsable_platform_version() {
        let mut config = Config::default();
        config.plugins.platform_version = Some("two".into());
        assert_eq!(field_of(validate(&config)), "plugins.platform_version");

        config.plugins.platform_version = Some("2.1.0".into());
        validate(&config).unwrap();
    }

    #[test]
    fn rejects_unknown_log_format_and_level() {
        let mut config = Config::default();
        config.logging.format = "xml".into();
        assert_eq!(field_of(validate(&config)), "logging.format");

        let mut config = Config::default();
        config.logging.level = "verbose".into();
        assert_eq!(field_of(validate(&config)), "logging.level");
    }
}
