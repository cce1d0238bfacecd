//! The plugin authoring contract.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use telekit_di::Module;

use crate::descriptor::PluginDescriptor;
use crate::extension::ExtensionContribution;

/// A plugin's root object, constructed by its entry point during `load`.
///
/// Everything has a default so a plugin only implements what it uses.
///
/// ```
/// use std::sync::Arc;
/// use telekit_plugins::{ExtensionContribution, Plugin};
///
/// trait Tool: Send + Sync {}
/// struct Base64Tool;
/// impl Tool for Base64Tool {}
///
/// struct Base64Plugin;
///
/// impl Plugin for Base64Plugin {
///     fn extensions(&self) -> Vec<ExtensionContribution> {
///         vec![ExtensionContribution::new::<dyn Tool, Base64Tool, _>(|_| {
///             Ok(Arc::new(Base64Tool) as Arc<dyn Tool>)
///         })]
///     }
/// }
/// ```
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Modules merged into the shared container while the plugin is loaded.
    fn modules(&self) -> Vec<Arc<dyn Module>> {
        Vec::new()
    }

    /// Extension contributions registered while the plugin is loaded.
    fn extensions(&self) -> Vec<ExtensionContribution> {
        Vec::new()
    }

    /// Called once the plugin is wired, for side effects such as opening
    /// connections.
    ///
    /// # Errors
    ///
    /// A failure moves the plugin to `FAILED` and unwires it.
    async fn start(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called when the plugin is stopped. Should be idempotent.
    ///
    /// # Errors
    ///
    /// A failure is recorded, but the plugin is stopped regardless.
    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

type EntryPoint = Arc<dyn Fn() -> anyhow::Result<Box<dyn Plugin>> + Send + Sync>;

/// A discovered plugin: its descriptor plus the entry point that builds it.
///
/// Packaging and dynamic loading happen outside the runtime; whoever
/// produces a `PluginUnit` hands over an already-resolved entry point.
#[derive(Clone)]
pub struct PluginUnit {
    descriptor: PluginDescriptor,
    entry_point: EntryPoint,
}

impl PluginUnit {
    /// Pair a descriptor with an entry point.
    pub fn new<F>(descriptor: PluginDescriptor, entry_point: F) -> Self
    where
        F: Fn() -> anyhow::Result<Box<dyn Plugin>> + Send + Sync + 'static,
    {
        Self {
            descriptor,
            entry_point: Arc::new(entry_point),
        }
    }

    /// A unit whose entry point is `P::default()`.
    #[must_use]
    pub fn from_default<P>(descriptor: PluginDescriptor) -> Self
    where
        P: Plugin + Default + 'static,
    {
        Self::new(descriptor, || Ok(Box::new(P::default()) as Box<dyn Plugin>))
    }

    /// The unit's descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    pub(crate) fn instantiate(&self) -> anyhow::Result<Box<dyn Plugin>> {
        (self.entry_point)()
    }
}

impl fmt::Debug for PluginUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginUnit")
            .field("id", self.descriptor.id())
            .field("version", self.descriptor.version())
            .finish_non_exhaustive()
    }
}
