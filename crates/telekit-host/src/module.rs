//! Services the host binds for every plugin.

use std::path::PathBuf;
use std::sync::Arc;

use semver::Version;
use telekit_di::{Binder, DiResult, Module};
use telekit_plugins::ExtensionRegistry;

/// Facts about the running host, resolvable from the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    /// Platform version plugins are checked against.
    pub version: Version,
    /// Directory scanned for plugin descriptors.
    pub plugins_dir: PathBuf,
}

/// Binds [`HostInfo`] and the [`ExtensionRegistry`].
///
/// The registry binding lets extensions look up sibling extensions.
#[derive(Debug, Clone)]
pub struct HostModule {
    info: Arc<HostInfo>,
    registry: Arc<ExtensionRegistry>,
}

impl HostModule {
    /// Create the module.
    #[must_use]
    pub fn new(info: HostInfo, registry: ExtensionRegistry) -> Self {
        Self {
            info: Arc::new(info),
            registry: Arc::new(registry),
        }
    }
}

impl Module for HostModule {
    fn name(&self) -> &str {
        "telekit-host"
    }

    fn configure(&self, binder: &mut Binder) -> DiResult<()> {
        binder.instance(Arc::clone(&self.info));
        binder.instance(Arc::clone(&self.registry));
        Ok(())
    }
}
