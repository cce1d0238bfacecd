//! Entry points known to the host binary.
//!
//! Descriptors found on disk only say *what* a plugin is. The code that
//! builds it must already be linked into the host; this table pairs the
//! two by plugin id.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use telekit_plugins::{Plugin, PluginDescriptor, PluginId, PluginUnit};

type Factory = Arc<dyn Fn() -> anyhow::Result<Box<dyn Plugin>> + Send + Sync>;

/// Plugin id to entry point table.
#[derive(Clone, Default)]
pub struct EntryPoints {
    factories: HashMap<PluginId, Factory>,
}

impl EntryPoints {
    /// An empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entry point, replacing any previous one for `id`.
    pub fn register<F>(&mut self, id: PluginId, factory: F) -> &mut Self
    where
        F: Fn() -> anyhow::Result<Box<dyn Plugin>> + Send + Sync + 'static,
    {
        self.factories.insert(id, Arc::new(factory));
        self
    }

    /// Register `P::default()` as the entry point for `id`.
    pub fn register_default<P>(&mut self, id: PluginId) -> &mut Self
    where
        P: Plugin + Default + 'static,
    {
        self.register(id, || Ok(Box::new(P::default()) as Box<dyn Plugin>))
    }

    /// Whether an entry point exists for `id`.
    #[must_use]
    pub fn contains(&self, id: &PluginId) -> bool {
        self.factories.contains_key(id)
    }

    /// Pair a descriptor with its entry point.
    #[must_use]
    pub fn link(&self, descriptor: PluginDescriptor) -> Option<PluginUnit> {
        let factory = Arc::clone(self.factories.get(descriptor.id())?);
        Some(PluginUnit::new(descriptor, move || factory()))
    }
}

impl fmt::Debug for EntryPoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&PluginId> = self.factories.keys().collect();
        ids.sort();
        f.debug_struct("EntryPoints").field("ids", &ids).finish()
    }
}

#[cfg(test)]
mod tests {
    use semver::Version;

    use super::*;

    #[derive(Default)]
    struct Quiet;
    impl Plugin for Quiet {}

    #[test]
    fn links_only_known_ids() {
        let mut entry_points = EntryPoints::new();
        entry_points.register_default::<Quiet>(PluginId::from_static("quiet"));

        let known = PluginDescriptor::new(PluginId::from_static("quiet"), "Quiet", Version::new(1, 0, 0));
        let unknown = PluginDescriptor::new(PluginId::from_static("loud"), "Loud", Version::new(1, 0, 0));

        let unit = entry_points.link(known).unwrap();
        assert_eq!(unit.descriptor().name(), "Quiet");
        assert!(entry_points.link(unknown).is_none());
    }
}
