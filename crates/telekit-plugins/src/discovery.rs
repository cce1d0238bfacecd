//! Descriptor discovery from the plugins directory.
//!
//! Every sub-directory of the plugins directory that contains a
//! `plugin.toml` is a plugin unit.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::descriptor::{DESCRIPTOR_FILE_NAME, PluginDescriptor, parse_descriptor};
use crate::error::{PluginError, PluginResult};

/// Load a single descriptor from a TOML file.
///
/// # Errors
///
/// Returns [`PluginError::Io`] if the file cannot be read and
/// [`PluginError::Malformed`] if it is not a valid descriptor.
pub fn load_descriptor(path: &Path) -> PluginResult<PluginDescriptor> {
    let content = std::fs::read_to_string(path).map_err(|source| PluginError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_descriptor(&content, &path.display().to_string())
}

/// Load every descriptor found under `dir`.
///
/// Returns `(descriptor, unit_dir)` pairs sorted by unit directory.
/// Malformed descriptors are logged and skipped so that one broken unit
/// does not hide the others.
///
/// # Errors
///
/// Returns [`PluginError::Io`] if `dir` itself cannot be read.
pub fn discover_descriptors(dir: &Path) -> PluginResult<Vec<(PluginDescriptor, PathBuf)>> {
    let io_error = |source: std::io::Error| PluginError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut units: Vec<PathBuf> = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        if path.is_dir() && path.join(DESCRIPTOR_FILE_NAME).is_file() {
            units.push(path);
        }
    }
    units.sort();

    let mut descriptors = Vec::with_capacity(units.len());
    for unit in units {
        let descriptor_path = unit.join(DESCRIPTOR_FILE_NAME);
        match load_descriptor(&descriptor_path) {
            Ok(descriptor) => {
                debug!(
                    path = %descriptor_path.display(),
                    plugin_id = %descriptor.id(),
                    "Loaded plugin descriptor"
                );
                descriptors.push((descriptor, unit));
            },
            Err(e) => {
                warn!(
                    path = %descriptor_path.display(),
                    error = %e,
                    "Skipping plugin with invalid descriptor"
                );
            },
        }
    }

    info!(path = %dir.display(), count = descriptors.len(), "Discovered plugin descriptors");
    Ok(descriptors)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn write_unit(root: &Path, dir: &str, content: &str) {
        let unit = root.join(dir);
        fs::create_dir_all(&unit).unwrap();
        fs::write(unit.join(DESCRIPTOR_FILE_NAME), content).unwrap();
    }

    #[test]
    fn discovers_valid_units_and_skips_broken_ones() {
        let tmp = tempfile::tempdir().unwrap();
        write_unit(
            tmp.path(),
            "b-jwt",
            "[plugin]\nid = \"jwt\"\nname = \"JWT\"\nversion = \"0.2.0\"",
        );
        write_unit(
            tmp.path(),
            "a-base64",
            "[plugin]\nid = \"base64\"\nname = \"Base64\"\nversion = \"1.0.0\"",
        );
        write_unit(tmp.path(), "c-broken", "[plugin]\nname = \"No id\"");
        fs::create_dir_all(tmp.path().join("empty")).unwrap();
        fs::write(tmp.path().join("stray.txt"), "ignored").unwrap();

        let found = discover_descriptors(tmp.path()).unwrap();
        let ids: Vec<&str> = found.iter().map(|(d, _)| d.id().as_str()).collect();
        assert_eq!(ids, ["base64", "jwt"]);
        assert_eq!(found[0].1, tmp.path().join("a-base64"));
    }

    #[test]
    fn missing_directory_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = discover_descriptors(&tmp.path().join("absent")).unwrap_err();
        assert!(matches!(err, PluginError::Io { .. }));
    }

    #[test]
    fn load_descriptor_reports_path_as_origin() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(DESCRIPTOR_FILE_NAME);
        fs::write(&path, "[plugin]\nid = \"x\"").unwrap();
        let err = load_descriptor(&path).unwrap_err();
        let PluginError::Malformed { origin, .. } = err else {
            panic!("expected Malformed");
        };
        assert_eq!(origin, path.display().to_string());
    }
}
