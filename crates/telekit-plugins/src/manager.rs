//! Plugin lifecycle manager.
//!
//! Drives every discovered plugin through
//! `DISCOVERED -> INSTALLED -> LOADED -> STARTED -> STOPPED`, with `FAILED`
//! reachable from each step. Failures are contained: a plugin that fails
//! is recorded with its cause and unwired, and never prevents the host or
//! other plugins from reaching `STARTED`.
//!
//! All plugins share one [`Container`]. Loading a plugin rebuilds the
//! container from the host modules plus the modules of every wired plugin;
//! stopping or failing a plugin rebuilds it without that plugin's modules.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::SystemTime;

use semver::Version;
use serde::Serialize;
use telekit_di::{Container, Module};
use tokio::sync::broadcast;
use tracing::{debug, error, info, trace, warn};

use crate::PluginId;
use crate::descriptor::check_compatible;
use crate::error::{PluginError, PluginResult};
use crate::event::{DEFAULT_EVENT_CAPACITY, PluginEvent};
use crate::extension::ExtensionRegistry;
use crate::guard::{guard_call, guard_hook};
use crate::plugin::{Plugin, PluginUnit};
use crate::state::{
    ContributedExtension, FailureReport, FailureStage, PluginFailure, PluginRecord, PluginState,
};

struct PluginEntry {
    unit: PluginUnit,
    state: PluginState,
    failure: Option<PluginFailure>,
    changed_at: SystemTime,
    instance: Option<Arc<dyn Plugin>>,
    modules: Vec<Arc<dyn Module>>,
    extensions: Vec<ContributedExtension>,
}

impl PluginEntry {
    fn record(&self) -> PluginRecord {
        PluginRecord {
            descriptor: self.unit.descriptor().clone(),
            state: self.state,
            failure: self.failure.clone(),
            changed_at: self.changed_at,
            modules: self.modules.iter().map(|m| m.name().to_string()).collect(),
            extensions: self.extensions.clone(),
        }
    }
}

/// Outcome of [`PluginManager::boot_all`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    /// Plugins that reached `STARTED`, in start order.
    pub started: Vec<PluginId>,
    /// Plugins skipped because the user disabled them.
    pub disabled: Vec<PluginId>,
    /// Plugins that failed, with their causes.
    pub failed: Vec<FailureReport>,
}

impl LoadReport {
    /// Whether every plugin that was attempted started.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Builder for [`PluginManager`].
pub struct PluginManagerBuilder {
    host_version: Version,
    container: Option<Container>,
    registry: Option<ExtensionRegistry>,
    host_modules: Vec<Arc<dyn Module>>,
    disabled: HashSet<PluginId>,
    event_capacity: usize,
}

impl PluginManagerBuilder {
    /// Use an existing container instead of a fresh one.
    #[must_use]
    pub fn container(mut self, container: Container) -> Self {
        self.container = Some(container);
        self
    }

    /// Use an existing registry, typically one the host has already
    /// declared its extension points on.
    #[must_use]
    pub fn registry(mut self, registry: ExtensionRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Add a host module. Host modules are part of every configuration.
    #[must_use]
    pub fn host_module(mut self, module: Arc<dyn Module>) -> Self {
        self.host_modules.push(module);
        self
    }

    /// Mark plugins as disabled; `boot_all` will not start them.
    #[must_use]
    pub fn disabled(mut self, ids: impl IntoIterator<Item = PluginId>) -> Self {
        self.disabled.extend(ids);
        self
    }

    /// Capacity of the lifecycle event channel.
    #[must_use]
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    /// Build the manager and configure the container with the host
    /// modules.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Di`] if the host modules cannot be
    /// configured.
    pub fn build(self) -> PluginResult<PluginManager> {
        let container = self.container.unwrap_or_default();
        container.configure(&self.host_modules)?;
        let (events, _) = broadcast::channel(self.event_capacity);

        info!(
            host_version = %self.host_version,
            host_modules = self.host_modules.len(),
            disabled = self.disabled.len(),
            "Plugin manager ready"
        );

        Ok(PluginManager {
            host_version: self.host_version,
            container,
            registry: self.registry.unwrap_or_default(),
            host_modules: self.host_modules,
            entries: HashMap::new(),
            order: Vec::new(),
            started_order: Vec::new(),
            disabled: self.disabled,
            events,
        })
    }
}

/// Owns plugin records and drives their lifecycle.
///
/// Lifecycle operations take `&mut self`, so initiation is sequential;
/// the shared [`Container`] and [`ExtensionRegistry`] can be cloned out
/// and read concurrently from other threads meanwhile.
pub struct PluginManager {
    host_version: Version,
    container: Container,
    registry: ExtensionRegistry,
    host_modules: Vec<Arc<dyn Module>>,
    entries: HashMap<PluginId, PluginEntry>,
    order: Vec<PluginId>,
    started_order: Vec<PluginId>,
    disabled: HashSet<PluginId>,
    events: broadcast::Sender<PluginEvent>,
}

impl PluginManager {
    /// Start building a manager for a host running platform `host_version`.
    #[must_use]
    pub fn builder(host_version: Version) -> PluginManagerBuilder {
        PluginManagerBuilder {
            host_version,
            container: None,
            registry: None,
            host_modules: Vec::new(),
            disabled: HashSet::new(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }

    /// The host platform version used for compatibility checks.
    #[must_use]
    pub fn host_version(&self) -> &Version {
        &self.host_version
    }

    /// The shared dependency container.
    #[must_use]
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// The shared extension registry.
    #[must_use]
    pub fn registry(&self) -> &ExtensionRegistry {
        &self.registry
    }

    /// Subscribe to lifecycle events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PluginEvent> {
        self.events.subscribe()
    }

    /// Register a plugin unit in `DISCOVERED` state.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::AlreadyRegistered`] if a plugin with the same
    /// id is already known.
    pub fn discover(&mut self, unit: PluginUnit) -> PluginResult<()> {
        let id = unit.descriptor().id().clone();
        if self.entries.contains_key(&id) {
            return Err(PluginError::AlreadyRegistered(id));
        }

        info!(
            plugin_id = %id,
            name = unit.descriptor().name(),
            version = %unit.descriptor().version(),
            "Plugin discovered"
        );
        self.entries.insert(id.clone(), PluginEntry {
            unit,
            state: PluginState::Discovered,
            failure: None,
            changed_at: SystemTime::now(),
            instance: None,
            modules: Vec::new(),
            extensions: Vec::new(),
        });
        self.order.push(id.clone());
        self.emit(PluginEvent::StateChanged {
            plugin_id: id,
            from: None,
            to: PluginState::Discovered,
        });
        Ok(())
    }

    /// Validate compatibility with the host.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Incompatible`] (the plugin is now `FAILED`)
    /// if the plugin's platform requirement excludes the host version, or
    /// [`PluginError::InvalidTransition`] unless the plugin is `DISCOVERED`.
    pub fn install(&mut self, id: &PluginId) -> PluginResult<()> {
        self.expect_state(id, &[PluginState::Discovered], "install")?;
        let descriptor = self.entry(id)?.unit.descriptor();

        if !check_compatible(descriptor, &self.host_version) {
            let required = descriptor
                .platform_version()
                .map_or_else(String::new, ToString::to_string);
            let err = PluginError::Incompatible {
                plugin_id: id.clone(),
                required,
                host: self.host_version.to_string(),
            };
            self.fail(id, FailureStage::Install, err.to_string());
            return Err(err);
        }

        self.transition(id, PluginState::Installed, None);
        Ok(())
    }

    /// Construct the plugin and wire its modules and extensions.
    ///
    /// On failure nothing contributed by the plugin remains registered.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::LoadFailed`] (the plugin is now `FAILED`) if
    /// the entry point fails or panics, a contribution targets an unknown
    /// extension point, or the container rejects the plugin's modules.
    /// Returns [`PluginError::InvalidTransition`] unless the plugin is
    /// `INSTALLED`.
    pub fn load(&mut self, id: &PluginId) -> PluginResult<()> {
        self.expect_state(id, &[PluginState::Installed], "load")?;

        let unit = self.entry(id)?.unit.clone();
        let wiring = guard_call(|| {
            let plugin: Arc<dyn Plugin> = Arc::from(unit.instantiate()?);
            let modules = plugin.modules();
            let extensions = plugin.extensions();
            Ok((plugin, modules, extensions))
        });
        let (plugin, modules, extensions) = match wiring {
            Ok(wiring) => wiring,
            Err(e) => return Err(self.load_failed(id, format!("entry point failed: {e:#}"))),
        };

        let contributed: Vec<ContributedExtension> = extensions
            .iter()
            .map(|c| ContributedExtension {
                point: c.point_name(),
                implementation: c.implementation_name(),
            })
            .collect();
        if let Err(e) = self.registry.contribute_all(id, extensions) {
            return Err(self.load_failed(id, e.to_string()));
        }

        let mut configuration = self.active_modules();
        configuration.extend(modules.iter().cloned());
        if let Err(e) = self.configure(&configuration) {
            self.registry.unregister_all(id);
            return Err(self.load_failed(id, format!("container configuration failed: {e:#}")));
        }

        let entry = self.entry_mut(id)?;
        entry.instance = Some(plugin);
        entry.modules = modules;
        entry.extensions = contributed;
        self.transition(id, PluginState::Loaded, None);
        Ok(())
    }

    /// Run the plugin's start hook.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::StartFailed`] (the plugin is now `FAILED` and
    /// fully unwired) if the hook fails or panics, or
    /// [`PluginError::InvalidTransition`] unless the plugin is `LOADED`.
    pub async fn start(&mut self, id: &PluginId) -> PluginResult<()> {
        self.expect_state(id, &[PluginState::Loaded], "start")?;
        let plugin = self.instance(id)?;

        debug!(plugin_id = %id, "Starting plugin");
        if let Err(e) = guard_hook(plugin.start()).await {
            let message = format!("{e:#}");
            self.unwire(id);
            self.fail(id, FailureStage::Start, message.clone());
            self.rewire();
            return Err(PluginError::StartFailed {
                plugin_id: id.clone(),
                message,
            });
        }

        self.started_order.push(id.clone());
        self.transition(id, PluginState::Started, None);
        Ok(())
    }

    /// Stop the plugin and unwire it.
    ///
    /// The plugin always ends `STOPPED`. From `LOADED` the stop hook is not
    /// called, since `start` never ran.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::StopFailed`] if the stop hook fails or
    /// panics; the failure is also kept on the plugin's record. Returns
    /// [`PluginError::InvalidTransition`] unless the plugin is `STARTED` or
    /// `LOADED`.
    pub async fn stop(&mut self, id: &PluginId) -> PluginResult<()> {
        let state = self.expect_state(id, &[PluginState::Started, PluginState::Loaded], "stop")?;
        let plugin = self.instance(id)?;

        let hook = if state == PluginState::Started {
            debug!(plugin_id = %id, "Stopping plugin");
            guard_hook(plugin.stop()).await
        } else {
            Ok(())
        };

        self.unwire(id);
        self.started_order.retain(|started| started != id);

        match hook {
            Ok(()) => {
                self.transition(id, PluginState::Stopped, None);
                self.rewire();
                Ok(())
            },
            Err(e) => {
                let message = format!("{e:#}");
                warn!(plugin_id = %id, error = %message, "Plugin stop hook failed");
                let failure = PluginFailure {
                    stage: FailureStage::Stop,
                    message: message.clone(),
                };
                self.transition(id, PluginState::Stopped, Some(failure));
                self.rewire();
                Err(PluginError::StopFailed {
                    plugin_id: id.clone(),
                    message,
                })
            },
        }
    }

    /// Install, load and start every `DISCOVERED` plugin in discovery
    /// order. Disabled plugins are moved to `DISABLED` instead.
    ///
    /// One plugin's failure never prevents the others from starting.
    pub async fn boot_all(&mut self) -> LoadReport {
        let mut report = LoadReport::default();
        let pending: Vec<PluginId> = self
            .order
            .iter()
            .filter(|id| self.state(id) == Some(PluginState::Discovered))
            .cloned()
            .collect();

        info!(count = pending.len(), "Booting plugins");
        for id in pending {
            if self.disabled.contains(&id) {
                self.transition(&id, PluginState::Disabled, None);
                report.disabled.push(id);
                continue;
            }
            match self.bring_up(&id).await {
                Ok(()) => report.started.push(id),
                Err(e) => {
                    debug!(plugin_id = %id, error = %e, "Plugin did not start");
                    if let Some(failure) = self.failure_report(&id) {
                        report.failed.push(failure);
                    }
                },
            }
        }

        if report.is_clean() {
            info!(started = report.started.len(), disabled = report.disabled.len(), "Plugins booted");
        } else {
            warn!(
                started = report.started.len(),
                disabled = report.disabled.len(),
                failed = report.failed.len(),
                "Some plugins were not started"
            );
        }
        report
    }

    /// Stop every wired plugin, most recently started first.
    ///
    /// Returns the stop-hook failures; every plugin is stopped regardless.
    pub async fn stop_all(&mut self) -> Vec<PluginError> {
        let mut targets: Vec<PluginId> = self.started_order.iter().rev().cloned().collect();
        targets.extend(
            self.order
                .iter()
                .filter(|id| self.state(id) == Some(PluginState::Loaded))
                .cloned(),
        );

        info!(count = targets.len(), "Stopping plugins");
        let mut errors = Vec::new();
        for id in targets {
            if let Err(e) = self.stop(&id).await {
                errors.push(e);
            }
        }
        errors
    }

    /// Re-enable a plugin and drive it back to `STARTED`.
    ///
    /// A `DISABLED` or `STOPPED` plugin is reset to `DISCOVERED` first. A
    /// plugin that is still `DISCOVERED` is only removed from the disabled
    /// set.
    ///
    /// # Errors
    ///
    /// Returns any install/load/start error, or
    /// [`PluginError::InvalidTransition`] from other states.
    pub async fn enable(&mut self, id: &PluginId) -> PluginResult<PluginState> {
        let state = self.expect_state(
            id,
            &[PluginState::Disabled, PluginState::Stopped, PluginState::Discovered],
            "enable",
        )?;
        self.disabled.remove(id);
        if state == PluginState::Discovered {
            return Ok(state);
        }

        self.transition(id, PluginState::Discovered, None);
        self.bring_up(id).await?;
        Ok(PluginState::Started)
    }

    /// Disable a plugin, stopping it first if it is wired.
    ///
    /// A `FAILED` plugin stays `FAILED`; it has to be discarded and
    /// rediscovered before it can run again.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::NotFound`] for unknown plugins and
    /// [`PluginError::InvalidTransition`] for `FAILED` ones. A failing stop
    /// hook is recorded but does not prevent disabling.
    pub async fn disable(&mut self, id: &PluginId) -> PluginResult<()> {
        let state = self.entry(id)?.state;
        if state == PluginState::Failed {
            return Err(PluginError::InvalidTransition {
                plugin_id: id.clone(),
                state,
                operation: "disable",
            });
        }
        self.disabled.insert(id.clone());
        if state == PluginState::Disabled {
            return Ok(());
        }
        if state.is_active()
            && let Err(e) = self.stop(id).await
        {
            debug!(plugin_id = %id, error = %e, "Stop hook failed while disabling");
        }
        self.transition(id, PluginState::Disabled, None);
        Ok(())
    }

    /// Remove a plugin's record so it can be discovered again.
    ///
    /// Returns the unit, ready to be passed to [`discover`](Self::discover).
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::InvalidTransition`] while the plugin is
    /// `LOADED` or `STARTED`.
    pub fn discard(&mut self, id: &PluginId) -> PluginResult<PluginUnit> {
        let state = self.entry(id)?.state;
        if state.is_active() {
            return Err(PluginError::InvalidTransition {
                plugin_id: id.clone(),
                state,
                operation: "discard",
            });
        }

        let entry = self
            .entries
            .remove(id)
            .ok_or_else(|| PluginError::NotFound(id.clone()))?;
        self.order.retain(|known| known != id);
        info!(plugin_id = %id, state = %state, "Plugin record discarded");
        self.emit(PluginEvent::Discarded {
            plugin_id: id.clone(),
        });
        Ok(entry.unit)
    }

    /// Current state of a plugin.
    #[must_use]
    pub fn state(&self, id: &PluginId) -> Option<PluginState> {
        self.entries.get(id).map(|e| e.state)
    }

    /// Snapshot of one plugin's record.
    #[must_use]
    pub fn record(&self, id: &PluginId) -> Option<PluginRecord> {
        self.entries.get(id).map(PluginEntry::record)
    }

    /// Records of all known plugins, sorted by name, then id.
    #[must_use]
    pub fn records(&self) -> Vec<PluginRecord> {
        let mut records: Vec<PluginRecord> = self.entries.values().map(PluginEntry::record).collect();
        records.sort_by(|a, b| {
            a.descriptor
                .name()
                .cmp(b.descriptor.name())
                .then_with(|| a.id().cmp(b.id()))
        });
        records
    }

    /// Ids of all known plugins in discovery order.
    #[must_use]
    pub fn plugin_ids(&self) -> &[PluginId] {
        &self.order
    }

    /// Every `FAILED` plugin with its cause, sorted by name.
    #[must_use]
    pub fn failures(&self) -> Vec<FailureReport> {
        self.records()
            .into_iter()
            .filter(|r| r.state == PluginState::Failed)
            .filter_map(|r| {
                r.failure.map(|failure| FailureReport {
                    plugin_id: r.descriptor.id().clone(),
                    name: r.descriptor.name().to_string(),
                    failure,
                })
            })
            .collect()
    }

    /// Whether a plugin is in the disabled set.
    #[must_use]
    pub fn is_disabled(&self, id: &PluginId) -> bool {
        self.disabled.contains(id)
    }

    async fn bring_up(&mut self, id: &PluginId) -> PluginResult<()> {
        self.install(id)?;
        self.load(id)?;
        self.start(id).await
    }

    fn entry(&self, id: &PluginId) -> PluginResult<&PluginEntry> {
        self.entries
            .get(id)
            .ok_or_else(|| PluginError::NotFound(id.clone()))
    }

    fn entry_mut(&mut self, id: &PluginId) -> PluginResult<&mut PluginEntry> {
        self.entries
            .get_mut(id)
            .ok_or_else(|| PluginError::NotFound(id.clone()))
    }

    fn instance(&self, id: &PluginId) -> PluginResult<Arc<dyn Plugin>> {
        self.entry(id)?
            .instance
            .clone()
            .ok_or_else(|| PluginError::LoadFailed {
                plugin_id: id.clone(),
                message: "plugin has no instance".into(),
            })
    }

    fn expect_state(
        &self,
        id: &PluginId,
        allowed: &[PluginState],
        operation: &'static str,
    ) -> PluginResult<PluginState> {
        let state = self.entry(id)?.state;
        if allowed.contains(&state) {
            Ok(state)
        } else {
            Err(PluginError::InvalidTransition {
                plugin_id: id.clone(),
                state,
                operation,
            })
        }
    }

    fn failure_report(&self, id: &PluginId) -> Option<FailureReport> {
        let entry = self.entries.get(id)?;
        Some(FailureReport {
            plugin_id: id.clone(),
            name: entry.unit.descriptor().name().to_string(),
            failure: entry.failure.clone()?,
        })
    }

    fn transition(&mut self, id: &PluginId, to: PluginState, failure: Option<PluginFailure>) {
        let Some(entry) = self.entries.get_mut(id) else {
            return;
        };
        let from = entry.state;
        entry.state = to;
        entry.changed_at = SystemTime::now();
        if failure.is_some() || to == PluginState::Discovered {
            entry.failure = failure;
        }

        match (&entry.failure, to) {
            (Some(failure), PluginState::Failed) => warn!(
                plugin_id = %id,
                from = %from,
                stage = %failure.stage,
                reason = %failure.message,
                "Plugin failed"
            ),
            _ => info!(plugin_id = %id, from = %from, to = %to, "Plugin state changed"),
        }

        self.emit(PluginEvent::StateChanged {
            plugin_id: id.clone(),
            from: Some(from),
            to,
        });
    }

    fn fail(&mut self, id: &PluginId, stage: FailureStage, message: String) {
        self.transition(id, PluginState::Failed, Some(PluginFailure { stage, message }));
    }

    fn load_failed(&mut self, id: &PluginId, message: String) -> PluginError {
        self.fail(id, FailureStage::Load, message.clone());
        PluginError::LoadFailed {
            plugin_id: id.clone(),
            message,
        }
    }

    fn emit(&self, event: PluginEvent) {
        if self.events.send(event).is_err() {
            trace!("No receivers for plugin event");
        }
    }

    /// Host modules followed by the modules of every wired plugin, in
    /// discovery order.
    fn active_modules(&self) -> Vec<Arc<dyn Module>> {
        let mut modules = self.host_modules.clone();
        for id in &self.order {
            if let Some(entry) = self.entries.get(id)
                && entry.state.is_active()
            {
                modules.extend(entry.modules.iter().cloned());
            }
        }
        modules
    }

    /// Configure the container, treating a panicking module as an error.
    fn configure(&self, modules: &[Arc<dyn Module>]) -> anyhow::Result<()> {
        guard_call(|| Ok(self.container.configure(modules)?))
    }

    /// Drop a plugin's extensions, instance and modules.
    fn unwire(&mut self, id: &PluginId) {
        self.registry.unregister_all(id);
        if let Some(entry) = self.entries.get_mut(id) {
            entry.instance = None;
            entry.modules.clear();
            entry.extensions.clear();
        }
    }

    /// Rebuild the container from the currently wired plugins.
    fn rewire(&self) {
        if let Err(e) = self.configure(&self.active_modules()) {
            error!(error = %format!("{e:#}"), "Failed to rebuild container after unwiring plugin");
        }
    }
}

impl std::fmt::Debug for PluginManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginManager")
            .field("host_version", &self.host_version.to_string())
            .field("plugins", &self.order)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use semver::VersionReq;
    use telekit_di::FnModule;

    use super::*;
    use crate::descriptor::PluginDescriptor;
    use crate::extension::ExtensionContribution;

    trait Tool: Send + Sync {
        fn title(&self) -> &'static str;
    }

    struct FooTool;
    struct BarTool;

    impl Tool for FooTool {
        fn title(&self) -> &'static str {
            "foo"
        }
    }

    impl Tool for BarTool {
        fn title(&self) -> &'static str {
            "bar"
        }
    }

    trait Unknown: Send + Sync {}

    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Behavior {
        Fine,
        FailStart,
        FailStop,
        UnknownPoint,
        ClaimsService,
    }

    struct TestPlugin {
        name: &'static str,
        behavior: Behavior,
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Plugin for TestPlugin {
        fn modules(&self) -> Vec<Arc<dyn Module>> {
            if self.name != "foo" && self.behavior != Behavior::ClaimsService {
                return Vec::new();
            }
            let name = self.name;
            vec![Arc::new(FnModule::new(self.name, move |b| {
                b.instance(Arc::new(format!("service of {name}")));
                Ok(())
            }))]
        }

        fn extensions(&self) -> Vec<ExtensionContribution> {
            let tool = if self.name == "bar" {
                ExtensionContribution::new::<dyn Tool, BarTool, _>(|_| {
                    Ok(Arc::new(BarTool) as Arc<dyn Tool>)
                })
            } else {
                ExtensionContribution::new::<dyn Tool, FooTool, _>(|_| {
                    Ok(Arc::new(FooTool) as Arc<dyn Tool>)
                })
            };
            if self.behavior == Behavior::UnknownPoint {
                let unknown = ExtensionContribution::new::<dyn Unknown, FooTool, _>(|_| {
                    Err(telekit_di::DiError::factory("unknown", "never built"))
                });
                return vec![tool, unknown];
            }
            vec![tool]
        }

        async fn start(&self) -> anyhow::Result<()> {
            self.log.lock().unwrap().push(format!("start {}", self.name));
            if self.behavior == Behavior::FailStart {
                anyhow::bail!("cannot open port");
            }
            Ok(())
        }

        async fn stop(&self) -> anyhow::Result<()> {
            self.log.lock().unwrap().push(format!("stop {}", self.name));
            if self.behavior == Behavior::FailStop {
                anyhow::bail!("socket already closed");
            }
            Ok(())
        }
    }

    fn version(v: &str) -> Version {
        Version::parse(v).unwrap()
    }

    fn unit(name: &'static str, behavior: Behavior, log: &Arc<Mutex<Vec<String>>>) -> PluginUnit {
        let descriptor = PluginDescriptor::new(PluginId::from_static(name), name, version("1.0.0"));
        let log = Arc::clone(log);
        PluginUnit::new(descriptor, move || {
            Ok(Box::new(TestPlugin {
                name,
                behavior,
                log: Arc::clone(&log),
            }) as Box<dyn Plugin>)
        })
    }

    fn manager() -> PluginManager {
        let registry = ExtensionRegistry::new();
        registry.register_extension_point::<dyn Tool>();
        PluginManager::builder(version("1.5.0"))
            .registry(registry)
            .build()
            .unwrap()
    }

    fn id(name: &str) -> PluginId {
        PluginId::from_static(name)
    }

    #[tokio::test]
    async fn full_lifecycle_wires_and_unwires() {
        let log = Arc::default();
        let mut manager = manager();
        manager.discover(unit("foo", Behavior::Fine, &log)).unwrap();
        assert_eq!(manager.state(&id("foo")), Some(PluginState::Discovered));

        manager.install(&id("foo")).unwrap();
        manager.load(&id("foo")).unwrap();
        assert_eq!(manager.state(&id("foo")), Some(PluginState::Loaded));
        assert!(manager.registry().provides_extension_impl::<FooTool>());
        assert!(!manager.registry().provides_extension_impl::<BarTool>());
        assert_eq!(*manager.container().resolve::<String>().unwrap(), "service of foo");
        let record = manager.record(&id("foo")).unwrap();
        assert_eq!(record.modules, ["foo"]);
        assert_eq!(record.extensions, [ContributedExtension {
            point: std::any::type_name::<dyn Tool>(),
            implementation: std::any::type_name::<FooTool>(),
        }]);

        manager.start(&id("foo")).await.unwrap();
        assert_eq!(manager.state(&id("foo")), Some(PluginState::Started));
        assert_eq!(manager.record(&id("foo")).unwrap().extensions.len(), 1);

        manager.stop(&id("foo")).await.unwrap();
        assert_eq!(manager.state(&id("foo")), Some(PluginState::Stopped));
        let record = manager.record(&id("foo")).unwrap();
        assert!(record.modules.is_empty());
        assert!(record.extensions.is_empty());
        assert!(!manager.registry().provides_extensions_of_type::<dyn Tool>());
        assert!(!manager.container().has_binding::<String>());
        assert_eq!(*log.lock().unwrap(), ["start foo", "stop foo"]);
    }

    #[tokio::test]
    async fn incompatible_plugin_fails_at_install() {
        let log = Arc::default();
        let mut manager = manager();
        let descriptor = PluginDescriptor::new(id("future"), "Future", version("1.0.0"))
            .with_platform_version(VersionReq::parse(">=2.0").unwrap());
        let inner = unit("future", Behavior::Fine, &log);
        manager
            .discover(PluginUnit::new(descriptor, move || inner.instantiate()))
            .unwrap();

        let err = manager.install(&id("future")).unwrap_err();
        assert!(matches!(err, PluginError::Incompatible { .. }));
        assert_eq!(manager.state(&id("future")), Some(PluginState::Failed));
        assert!(matches!(
            manager.load(&id("future")),
            Err(PluginError::InvalidTransition { operation: "load", .. })
        ));

        let failures = manager.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].failure.stage, FailureStage::Install);
    }

    #[tokio::test]
    async fn unknown_extension_point_fails_load_without_residue() {
        let log = Arc::default();
        let mut manager = manager();
        manager.discover(unit("foo", Behavior::UnknownPoint, &log)).unwrap();
        manager.install(&id("foo")).unwrap();

        let err = manager.load(&id("foo")).unwrap_err();
        assert!(matches!(err, PluginError::LoadFailed { ref message, .. } if message.contains("Unknown")));
        assert_eq!(manager.state(&id("foo")), Some(PluginState::Failed));
        assert!(!manager.registry().provides_extensions_of_type::<dyn Tool>());
        assert!(!manager.container().has_binding::<String>());
    }

    #[tokio::test]
    async fn duplicate_bindings_across_plugins_fail_second_load() {
        let log = Arc::default();
        let mut manager = manager();
        manager.discover(unit("foo", Behavior::Fine, &log)).unwrap();
        manager.discover(unit("bar", Behavior::ClaimsService, &log)).unwrap();
        for name in ["foo", "bar"] {
            manager.install(&id(name)).unwrap();
        }
        manager.load(&id("foo")).unwrap();

        let err = manager.load(&id("bar")).unwrap_err();
        assert!(matches!(err, PluginError::LoadFailed { .. }));
        assert_eq!(manager.state(&id("bar")), Some(PluginState::Failed));
        assert!(!manager.registry().provides_extension_impl::<BarTool>());
        assert_eq!(*manager.container().resolve::<String>().unwrap(), "service of foo");
    }

    #[tokio::test]
    async fn entry_point_panic_is_contained() {
        let mut manager = manager();
        let descriptor = PluginDescriptor::new(id("boom"), "Boom", version("1.0.0"));
        manager
            .discover(PluginUnit::new(descriptor, || panic!("constructor exploded")))
            .unwrap();
        manager.install(&id("boom")).unwrap();

        let err = manager.load(&id("boom")).unwrap_err();
        assert!(err.to_string().contains("constructor exploded"));
        assert_eq!(manager.state(&id("boom")), Some(PluginState::Failed));
    }

    #[tokio::test]
    async fn start_failure_rolls_back_contributions() {
        let log = Arc::default();
        let mut manager = manager();
        manager.discover(unit("foo", Behavior::FailStart, &log)).unwrap();
        manager.install(&id("foo")).unwrap();
        manager.load(&id("foo")).unwrap();

        let err = manager.start(&id("foo")).await.unwrap_err();
        assert!(matches!(err, PluginError::StartFailed { ref message, .. } if message == "cannot open port"));
        assert_eq!(manager.state(&id("foo")), Some(PluginState::Failed));
        assert!(!manager.registry().provides_extensions_of_type::<dyn Tool>());
        assert!(!manager.container().has_binding::<String>());
    }

    #[tokio::test]
    async fn failed_stop_hook_still_stops() {
        let log = Arc::default();
        let mut manager = manager();
        manager.discover(unit("foo", Behavior::FailStop, &log)).unwrap();
        manager.boot_all().await;

        let err = manager.stop(&id("foo")).await.unwrap_err();
        assert!(matches!(err, PluginError::StopFailed { .. }));
        let record = manager.record(&id("foo")).unwrap();
        assert_eq!(record.state, PluginState::Stopped);
        assert_eq!(record.failure.map(|f| f.stage), Some(FailureStage::Stop));
        assert!(!manager.registry().provides_extensions_of_type::<dyn Tool>());
    }

    #[tokio::test]
    async fn stop_from_loaded_skips_hook() {
        let log: Arc<Mutex<Vec<String>>> = Arc::default();
        let mut manager = manager();
        manager.discover(unit("foo", Behavior::Fine, &log)).unwrap();
        manager.install(&id("foo")).unwrap();
        manager.load(&id("foo")).unwrap();

        manager.stop(&id("foo")).await.unwrap();
        assert_eq!(manager.state(&id("foo")), Some(PluginState::Stopped));
        assert!(log.lock().unwrap().is_empty());

        assert!(matches!(
            manager.stop(&id("foo")).await,
            Err(PluginError::InvalidTransition { operation: "stop", .. })
        ));
    }

    #[tokio::test]
    async fn boot_all_isolates_failures_and_keeps_order() {
        let log = Arc::default();
        let mut manager = PluginManager::builder(version("1.5.0"))
            .registry({
                let registry = ExtensionRegistry::new();
                registry.register_extension_point::<dyn Tool>();
                registry
            })
            .disabled([id("off")])
            .build()
            .unwrap();

        manager.discover(unit("foo", Behavior::Fine, &log)).unwrap();
        manager.discover(unit("broken", Behavior::FailStart, &log)).unwrap();
        manager.discover(unit("off", Behavior::Fine, &log)).unwrap();
        manager.discover(unit("bar", Behavior::Fine, &log)).unwrap();

        let report = manager.boot_all().await;
        assert_eq!(report.started, [id("foo"), id("bar")]);
        assert_eq!(report.disabled, [id("off")]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].plugin_id, id("broken"));
        assert_eq!(manager.state(&id("off")), Some(PluginState::Disabled));

        let titles: Vec<&str> = manager
            .registry()
            .extensions_of_type::<dyn Tool>()
            .iter()
            .map(|e| e.create(manager.container()).unwrap().title())
            .collect();
        assert_eq!(titles, ["foo", "bar"]);
    }

    #[tokio::test]
    async fn stop_all_runs_in_reverse_start_order() {
        let log: Arc<Mutex<Vec<String>>> = Arc::default();
        let mut manager = manager();
        manager.discover(unit("foo", Behavior::Fine, &log)).unwrap();
        manager.discover(unit("bar", Behavior::FailStop, &log)).unwrap();
        manager.boot_all().await;
        log.lock().unwrap().clear();

        let errors = manager.stop_all().await;
        assert_eq!(errors.len(), 1);
        assert_eq!(*log.lock().unwrap(), ["stop bar", "stop foo"]);
        assert_eq!(manager.state(&id("foo")), Some(PluginState::Stopped));
        assert_eq!(manager.state(&id("bar")), Some(PluginState::Stopped));
    }

    #[tokio::test]
    async fn disable_and_enable_cycle() {
        let log = Arc::default();
        let mut manager = manager();
        manager.discover(unit("foo", Behavior::Fine, &log)).unwrap();
        manager.boot_all().await;

        manager.disable(&id("foo")).await.unwrap();
        assert_eq!(manager.state(&id("foo")), Some(PluginState::Disabled));
        assert!(manager.is_disabled(&id("foo")));
        assert!(!manager.registry().provides_extensions_of_type::<dyn Tool>());

        assert_eq!(manager.enable(&id("foo")).await.unwrap(), PluginState::Started);
        assert!(!manager.is_disabled(&id("foo")));
        assert!(manager.registry().provides_extensions_of_type::<dyn Tool>());
    }

    #[tokio::test]
    async fn failed_plugin_cannot_be_reenabled_without_discard() {
        let log: Arc<Mutex<Vec<String>>> = Arc::default();
        let mut manager = manager();
        manager.discover(unit("foo", Behavior::FailStart, &log)).unwrap();
        manager.boot_all().await;
        assert_eq!(manager.state(&id("foo")), Some(PluginState::Failed));

        assert!(matches!(
            manager.disable(&id("foo")).await,
            Err(PluginError::InvalidTransition { operation: "disable", .. })
        ));
        assert!(matches!(
            manager.enable(&id("foo")).await,
            Err(PluginError::InvalidTransition { operation: "enable", .. })
        ));
        assert_eq!(manager.state(&id("foo")), Some(PluginState::Failed));
        assert!(!manager.is_disabled(&id("foo")));
        assert_eq!(*log.lock().unwrap(), ["start foo"]);

        let unit = manager.discard(&id("foo")).unwrap();
        manager.discover(unit).unwrap();
        assert_eq!(manager.state(&id("foo")), Some(PluginState::Discovered));
        assert!(manager.record(&id("foo")).unwrap().failure.is_none());
    }

    #[tokio::test]
    async fn discard_allows_rediscovery() {
        let log = Arc::default();
        let mut manager = manager();
        manager.discover(unit("foo", Behavior::Fine, &log)).unwrap();
        assert!(matches!(
            manager.discover(unit("foo", Behavior::Fine, &log)),
            Err(PluginError::AlreadyRegistered(_))
        ));
        manager.boot_all().await;

        assert!(matches!(
            manager.discard(&id("foo")),
            Err(PluginError::InvalidTransition { operation: "discard", .. })
        ));
        manager.stop(&id("foo")).await.unwrap();
        let unit = manager.discard(&id("foo")).unwrap();
        assert!(manager.state(&id("foo")).is_none());

        manager.discover(unit).unwrap();
        assert_eq!(manager.state(&id("foo")), Some(PluginState::Discovered));
    }

    #[tokio::test]
    async fn state_changes_are_broadcast() {
        let log = Arc::default();
        let mut manager = manager();
        let mut events = manager.subscribe();
        manager.discover(unit("foo", Behavior::Fine, &log)).unwrap();
        manager.boot_all().await;

        let mut seen = Vec::new();
        while let Ok(event) = events.try_recv() {
            if let PluginEvent::StateChanged { to, .. } = event {
                seen.push(to);
            }
        }
        assert_eq!(seen, [
            PluginState::Discovered,
            PluginState::Installed,
            PluginState::Loaded,
            PluginState::Started
        ]);
    }

    #[tokio::test]
    async fn records_are_sorted_by_name() {
        let log = Arc::default();
        let mut manager = manager();
        manager.discover(unit("foo", Behavior::Fine, &log)).unwrap();
        manager.discover(unit("bar", Behavior::Fine, &log)).unwrap();
        let names: Vec<String> = manager
            .records()
            .iter()
            .map(|r| r.descriptor.name().to_string())
            .collect();
        assert_eq!(names, ["bar", "foo"]);
        assert_eq!(manager.plugin_ids(), [id("foo"), id("bar")]);
    }
}
