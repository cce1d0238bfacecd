//! Test fixtures for descriptors, plugin directories and tracing.

use std::path::{Path, PathBuf};

use semver::{Version, VersionReq};
use telekit_plugins::{DESCRIPTOR_FILE_NAME, PluginDescriptor, PluginId};

/// Host version used by fixtures: `1.0.0`.
#[must_use]
pub fn test_host_version() -> Version {
    Version::new(1, 0, 0)
}

/// A descriptor for `id`, version `1.0.0`, named after its id.
///
/// # Panics
///
/// Panics if `id` is not a valid plugin id.
#[must_use]
pub fn test_descriptor(id: &str) -> PluginDescriptor {
    let plugin_id = PluginId::new(id).unwrap_or_else(|e| panic!("{e}"));
    PluginDescriptor::new(plugin_id, id, Version::new(1, 0, 0))
}

/// A descriptor for `id` that requires the given platform range.
///
/// # Panics
///
/// Panics if `id` is not a valid plugin id or `requirement` does not
/// parse.
#[must_use]
pub fn test_descriptor_requiring(id: &str, requirement: &str) -> PluginDescriptor {
    let requirement = VersionReq::parse(requirement)
        .unwrap_or_else(|e| panic!("invalid requirement '{requirement}': {e}"));
    test_descriptor(id).with_platform_version(requirement)
}

/// Write `content` as the descriptor of a unit directory under `root`.
///
/// Returns the unit directory.
///
/// # Panics
///
/// Panics if the directory or file cannot be written.
pub fn write_descriptor(root: &Path, unit: &str, content: &str) -> PathBuf {
    let dir = root.join(unit);
    std::fs::create_dir_all(&dir)
        .unwrap_or_else(|e| panic!("cannot create {}: {e}", dir.display()));
    let file = dir.join(DESCRIPTOR_FILE_NAME);
    std::fs::write(&file, content)
        .unwrap_or_else(|e| panic!("cannot write {}: {e}", file.display()));
    dir
}

/// Install a test-friendly tracing subscriber once per process.
///
/// Honors `RUST_LOG`; output is captured by the test harness.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
