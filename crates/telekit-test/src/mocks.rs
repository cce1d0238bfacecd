//! Mock plugins for testing the lifecycle manager.

use std::any::type_name;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use telekit_di::{FnModule, Module};
use telekit_plugins::{ExtensionContribution, Plugin, PluginDescriptor, PluginUnit};

/// How a mocked hook behaves when called.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HookBehavior {
    /// Return `Ok(())`.
    #[default]
    Succeed,
    /// Return an error.
    Fail,
    /// Panic.
    Panic,
}

impl HookBehavior {
    fn run(self, hook: &str) -> anyhow::Result<()> {
        match self {
            Self::Succeed => Ok(()),
            Self::Fail => Err(anyhow::anyhow!("{hook} failed on purpose")),
            Self::Panic => panic!("{hook} panicked on purpose"),
        }
    }
}

/// Call counters shared by every instance built from one [`MockPlugin`].
#[derive(Debug, Default)]
pub struct HookCounts {
    constructions: AtomicUsize,
    starts: AtomicUsize,
    stops: AtomicUsize,
}

impl HookCounts {
    /// Times the entry point built an instance.
    #[must_use]
    pub fn constructions(&self) -> usize {
        self.constructions.load(Ordering::SeqCst)
    }

    /// Times `start` was called.
    #[must_use]
    pub fn start_calls(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    /// Times `stop` was called.
    #[must_use]
    pub fn stop_calls(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

/// A plugin assembled from parts, for lifecycle tests.
///
/// ```rust,ignore
/// let mock = MockPlugin::new()
///     .with_binding(Arc::new(String::from("from plugin")))
///     .panicking_stop();
/// let unit = mock.into_unit(test_descriptor("sample"));
/// ```
#[derive(Clone, Default)]
pub struct MockPlugin {
    modules: Vec<Arc<dyn Module>>,
    extensions: Vec<ExtensionContribution>,
    construction: HookBehavior,
    start: HookBehavior,
    stop: HookBehavior,
    counts: Arc<HookCounts>,
}

impl MockPlugin {
    /// A plugin with no modules, no extensions and hooks that succeed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module.
    #[must_use]
    pub fn with_module(mut self, module: Arc<dyn Module>) -> Self {
        self.modules.push(module);
        self
    }

    /// Add a module that binds `value` as a singleton instance.
    #[must_use]
    pub fn with_binding<T>(self, value: Arc<T>) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let name = format!("mock-binding<{}>", type_name::<T>());
        self.with_module(Arc::new(FnModule::new(name, move |binder| {
            binder.instance(Arc::clone(&value));
            Ok(())
        })))
    }

    /// Add an extension contribution.
    #[must_use]
    pub fn with_extension(mut self, contribution: ExtensionContribution) -> Self {
        self.extensions.push(contribution);
        self
    }

    /// Make the entry point fail.
    #[must_use]
    pub fn failing_entry_point(mut self) -> Self {
        self.construction = HookBehavior::Fail;
        self
    }

    /// Make the entry point panic.
    #[must_use]
    pub fn panicking_entry_point(mut self) -> Self {
        self.construction = HookBehavior::Panic;
        self
    }

    /// Make `start` return an error.
    #[must_use]
    pub fn failing_start(mut self) -> Self {
        self.start = HookBehavior::Fail;
        self
    }

    /// Make `start` panic.
    #[must_use]
    pub fn panicking_start(mut self) -> Self {
        self.start = HookBehavior::Panic;
        self
    }

    /// Make `stop` return an error.
    #[must_use]
    pub fn failing_stop(mut self) -> Self {
        self.stop = HookBehavior::Fail;
        self
    }

    /// Make `stop` panic.
    #[must_use]
    pub fn panicking_stop(mut self) -> Self {
        self.stop = HookBehavior::Panic;
        self
    }

    /// The shared call counters.
    #[must_use]
    pub fn counts(&self) -> Arc<HookCounts> {
        Arc::clone(&self.counts)
    }

    /// A unit whose entry point builds a copy of this mock.
    #[must_use]
    pub fn into_unit(self, descriptor: PluginDescriptor) -> PluginUnit {
        PluginUnit::new(descriptor, move || {
            self.counts.constructions.fetch_add(1, Ordering::SeqCst);
            self.construction.run("entry point")?;
            Ok(Box::new(self.clone()) as Box<dyn Plugin>)
        })
    }
}

impl fmt::Debug for MockPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockPlugin")
            .field("modules", &self.modules.len())
            .field("extensions", &self.extensions)
            .field("construction", &self.construction)
            .field("start", &self.start)
            .field("stop", &self.stop)
            .field("counts", &self.counts)
            .finish()
    }
}

#[async_trait]
impl Plugin for MockPlugin {
    fn modules(&self) -> Vec<Arc<dyn Module>> {
        self.modules.clone()
    }

    fn extensions(&self) -> Vec<ExtensionContribution> {
        self.extensions.clone()
    }

    async fn start(&self) -> anyhow::Result<()> {
        self.counts.starts.fetch_add(1, Ordering::SeqCst);
        self.start.run("start")
    }

    async fn stop(&self) -> anyhow::Result<()> {
        self.counts.stops.fetch_add(1, Ordering::SeqCst);
        self.stop.run("stop")
    }
}

#[cfg(test)]
mod tests {
    use telekit_plugins::{PluginManager, PluginState};

    use super::*;
    use crate::fixtures::{test_descriptor, test_host_version};

    #[tokio::test]
    async fn counts_hooks_across_lifecycle() {
        let mock = MockPlugin::new().with_binding(Arc::new(7_u32));
        let counts = mock.counts();
        let descriptor = test_descriptor("counted");
        let id = descriptor.id().clone();

        let mut manager = PluginManager::builder(test_host_version()).build().unwrap();
        manager.discover(mock.into_unit(descriptor)).unwrap();
        let report = manager.boot_all().await;
        assert_eq!(report.started, vec![id.clone()]);
        assert_eq!(*manager.container().resolve::<u32>().unwrap(), 7);

        manager.stop(&id).await.unwrap();
        assert_eq!(manager.state(&id), Some(PluginState::Stopped));
        assert_eq!(counts.constructions(), 1);
        assert_eq!(counts.start_calls(), 1);
        assert_eq!(counts.stop_calls(), 1);
    }

    #[test]
    fn failing_entry_point_reports_error() {
        let unit = MockPlugin::new()
            .failing_entry_point()
            .into_unit(test_descriptor("broken"));
        let mut manager = PluginManager::builder(test_host_version()).build().unwrap();
        let id = unit.descriptor().id().clone();
        manager.discover(unit).unwrap();
        manager.install(&id).unwrap();
        let err = manager.load(&id).unwrap_err();
        assert!(err.to_string().contains("entry point failed on purpose"));
        assert_eq!(manager.state(&id), Some(PluginState::Failed));
    }
}
