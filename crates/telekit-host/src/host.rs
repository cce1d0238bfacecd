//! Host boot sequence.
//!
//! [`Host`] turns a [`Config`] into a running plugin system:
//! 1. Declare the host's extension points on a fresh registry
//! 2. Build the [`PluginManager`] with the [`HostModule`] and the disabled list
//! 3. Discover built-in plugins, then descriptors from the plugins directory
//! 4. Boot everything and collect a [`LoadReport`]

use std::path::PathBuf;

use semver::Version;
use telekit_config::Config;
use telekit_plugins::{
    ExtensionRegistry, LoadReport, PluginDescriptor, PluginError, PluginId, PluginManager,
    discover_descriptors,
};
use tracing::{info, warn};

use crate::entry::EntryPoints;
use crate::error::{HostError, HostResult};
use crate::module::{HostInfo, HostModule};
use crate::tool::{Tool, ToolCatalog};
use crate::{HOST_VERSION, builtin};

/// Runtime settings derived from the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostSettings {
    /// Platform version plugins are checked against.
    pub host_version: Version,
    /// Directory scanned for plugin descriptors.
    pub plugins_dir: PathBuf,
    /// Plugins that must not start.
    pub disabled: Vec<PluginId>,
}

impl HostSettings {
    /// Derive settings from a loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::InvalidPlatformVersion`] if the configured
    /// override is not semver, or [`HostError::Plugin`] for a malformed
    /// disabled id.
    pub fn from_config(config: &Config) -> HostResult<Self> {
        let version_text = config
            .plugins
            .platform_version
            .as_deref()
            .unwrap_or(HOST_VERSION)
            .trim();
        let host_version =
            Version::parse(version_text).map_err(|source| HostError::InvalidPlatformVersion {
                version: version_text.to_owned(),
                source,
            })?;
        let disabled = config
            .plugins
            .disabled
            .iter()
            .map(PluginId::new)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            host_version,
            plugins_dir: config.plugins_dir(),
            disabled,
        })
    }
}

/// What [`Host::discover_directory`] found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoverySummary {
    /// Plugins registered with the manager.
    pub discovered: Vec<PluginId>,
    /// Descriptors with no entry point in this host.
    pub unlinked: Vec<PluginId>,
    /// Descriptors whose id was already registered.
    pub duplicates: Vec<PluginId>,
}

/// A configured host: plugin manager plus the entry points it can link.
#[derive(Debug)]
pub struct Host {
    settings: HostSettings,
    manager: PluginManager,
    entry_points: EntryPoints,
}

impl Host {
    /// Wire a host with the built-in entry points.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Plugin`] if the host module cannot be
    /// configured.
    pub fn new(settings: HostSettings) -> HostResult<Self> {
        Self::with_entry_points(settings, builtin::entry_points())
    }

    /// Wire a host with an explicit entry point table.
    ///
    /// # Errors
    ///
    /// Same as [`Host::new`].
    pub fn with_entry_points(settings: HostSettings, entry_points: EntryPoints) -> HostResult<Self> {
        let registry = ExtensionRegistry::new();
        registry.register_extension_point::<dyn Tool>();

        let info = HostInfo {
            version: settings.host_version.clone(),
            plugins_dir: settings.plugins_dir.clone(),
        };
        let manager = PluginManager::builder(settings.host_version.clone())
            .registry(registry.clone())
            .host_module(std::sync::Arc::new(HostModule::new(info, registry)))
            .disabled(settings.disabled.iter().cloned())
            .build()?;

        Ok(Self {
            settings,
            manager,
            entry_points,
        })
    }

    /// The settings the host was built from.
    #[must_use]
    pub fn settings(&self) -> &HostSettings {
        &self.settings
    }

    /// The plugin manager.
    #[must_use]
    pub fn manager(&self) -> &PluginManager {
        &self.manager
    }

    /// The plugin manager, mutably.
    pub fn manager_mut(&mut self) -> &mut PluginManager {
        &mut self.manager
    }

    /// Register the built-in plugins.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::AlreadyRegistered`] if called twice.
    pub fn discover_builtins(&mut self) -> HostResult<Vec<PluginId>> {
        let mut ids = Vec::new();
        for descriptor in builtin::descriptors(&self.settings.host_version) {
            let id = descriptor.id().clone();
            if let Some(unit) = self.entry_points.link(descriptor) {
                self.manager.discover(unit)?;
                ids.push(id);
            }
        }
        Ok(ids)
    }

    /// Register every linkable descriptor from the plugins directory.
    ///
    /// A missing directory is not an error; it simply contributes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Plugin`] if the directory exists but cannot be
    /// read.
    pub fn discover_directory(&mut self) -> HostResult<DiscoverySummary> {
        let dir = &self.settings.plugins_dir;
        if !dir.is_dir() {
            info!(path = %dir.display(), "Plugins directory not found, skipping");
            return Ok(DiscoverySummary::default());
        }

        let mut summary = DiscoverySummary::default();
        for (descriptor, unit_dir) in discover_descriptors(dir)? {
            self.discover_descriptor(descriptor, &unit_dir, &mut summary)?;
        }
        Ok(summary)
    }

    fn discover_descriptor(
        &mut self,
        descriptor: PluginDescriptor,
        unit_dir: &std::path::Path,
        summary: &mut DiscoverySummary,
    ) -> HostResult<()> {
        let id = descriptor.id().clone();
        let Some(unit) = self.entry_points.link(descriptor) else {
            warn!(
                plugin_id = %id,
                path = %unit_dir.display(),
                "No entry point for plugin, skipping"
            );
            summary.unlinked.push(id);
            return Ok(());
        };
        match self.manager.discover(unit) {
            Ok(()) => summary.discovered.push(id),
            Err(PluginError::AlreadyRegistered(_)) => {
                warn!(plugin_id = %id, "Plugin already registered, skipping duplicate");
                summary.duplicates.push(id);
            },
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    /// Bring up every discovered plugin.
    pub async fn boot(&mut self) -> LoadReport {
        let report = self.manager.boot_all().await;
        info!(
            started = report.started.len(),
            disabled = report.disabled.len(),
            failed = report.failed.len(),
            "Host booted"
        );
        report
    }

    /// Stop every running plugin.
    pub async fn shutdown(&mut self) -> Vec<PluginError> {
        let errors = self.manager.stop_all().await;
        info!(errors = errors.len(), "Host shut down");
        errors
    }

    /// Tools of the currently loaded plugins.
    #[must_use]
    pub fn tools(&self) -> ToolCatalog {
        ToolCatalog::collect(self.manager.registry(), self.manager.container())
    }
}
