//! Extension points and the extension registry.
//!
//! The host declares capability types (usually `dyn Trait`) as extension
//! points. Plugins contribute implementations of those points when they
//! are loaded, and the host asks the registry which implementations exist
//! without knowing which plugin supplied them.
//!
//! The registry is copy-on-write: every mutation builds a new immutable
//! snapshot and swaps it in atomically, so readers never block and never
//! observe a half-applied change.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;
use telekit_di::{Container, DiError, DiResult};
use tracing::{debug, info, warn};

use crate::PluginId;
use crate::error::{PluginError, PluginResult};

/// Display group a tool extension belongs to, such as "Encoding" or
/// "Network".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ToolGroup {
    /// Group label.
    pub name: String,
    /// Sort key; lower comes first.
    pub order: i32,
}

impl ToolGroup {
    /// Create a group.
    pub fn new(name: impl Into<String>, order: i32) -> Self {
        Self {
            name: name.into(),
            order,
        }
    }
}

type ErasedExtension = Box<dyn Any + Send + Sync>;
type ExtensionFactory = Arc<dyn Fn(&Container) -> DiResult<ErasedExtension> + Send + Sync>;

/// One implementation of an extension point, as declared by a plugin.
///
/// The factory receives the container so that extensions can depend on
/// services bound by the host or by any loaded plugin.
#[derive(Clone)]
pub struct ExtensionContribution {
    point: TypeId,
    point_name: &'static str,
    implementation: TypeId,
    implementation_name: &'static str,
    group: Option<ToolGroup>,
    factory: ExtensionFactory,
}

impl ExtensionContribution {
    /// Contribute implementation `I` of extension point `P`.
    ///
    /// ```
    /// use std::sync::Arc;
    /// use telekit_plugins::ExtensionContribution;
    ///
    /// trait Tool: Send + Sync {}
    /// struct Base64Tool;
    /// impl Tool for Base64Tool {}
    ///
    /// let contribution = ExtensionContribution::new::<dyn Tool, Base64Tool, _>(|_| {
    ///     Ok(Arc::new(Base64Tool) as Arc<dyn Tool>)
    /// });
    /// assert!(contribution.implementation_name().ends_with("Base64Tool"));
    /// ```
    pub fn new<P, I, F>(factory: F) -> Self
    where
        P: ?Sized + Send + Sync + 'static,
        I: ?Sized + 'static,
        F: Fn(&Container) -> DiResult<Arc<P>> + Send + Sync + 'static,
    {
        Self {
            point: TypeId::of::<P>(),
            point_name: type_name::<P>(),
            implementation: TypeId::of::<I>(),
            implementation_name: type_name::<I>(),
            group: None,
            factory: Arc::new(move |container| {
                factory(container).map(|ext| Box::new(ext) as ErasedExtension)
            }),
        }
    }

    /// Place the extension in a display group.
    #[must_use]
    pub fn with_group(mut self, group: ToolGroup) -> Self {
        self.group = Some(group);
        self
    }

    /// Type name of the extension point.
    #[must_use]
    pub fn point_name(&self) -> &'static str {
        self.point_name
    }

    /// Type name of the implementation.
    #[must_use]
    pub fn implementation_name(&self) -> &'static str {
        self.implementation_name
    }

    /// The display group, if any.
    #[must_use]
    pub fn group(&self) -> Option<&ToolGroup> {
        self.group.as_ref()
    }
}

impl fmt::Debug for ExtensionContribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionContribution")
            .field("point", &self.point_name)
            .field("implementation", &self.implementation_name)
            .field("group", &self.group)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
struct RegisteredExtension {
    plugin_id: PluginId,
    contribution: ExtensionContribution,
}

/// Typed handle to a registered implementation of extension point `P`.
pub struct Extension<P: ?Sized> {
    entry: Arc<RegisteredExtension>,
    _marker: PhantomData<fn() -> Arc<P>>,
}

impl<P> Extension<P>
where
    P: ?Sized + Send + Sync + 'static,
{
    /// The plugin that contributed this extension.
    #[must_use]
    pub fn plugin_id(&self) -> &PluginId {
        &self.entry.plugin_id
    }

    /// Type name of the implementation.
    #[must_use]
    pub fn implementation_name(&self) -> &'static str {
        self.entry.contribution.implementation_name
    }

    /// Whether this extension is implemented by `I`.
    #[must_use]
    pub fn is<I: ?Sized + 'static>(&self) -> bool {
        self.entry.contribution.implementation == TypeId::of::<I>()
    }

    /// The display group, if any.
    #[must_use]
    pub fn group(&self) -> Option<&ToolGroup> {
        self.entry.contribution.group.as_ref()
    }

    /// Create a new instance of the extension.
    ///
    /// # Errors
    ///
    /// Returns the factory's error, typically an unresolved dependency.
    pub fn create(&self, container: &Container) -> DiResult<Arc<P>> {
        let erased = (self.entry.contribution.factory)(container)?;
        erased.downcast::<Arc<P>>().map(|ext| *ext).map_err(|_| {
            DiError::factory(
                self.entry.contribution.implementation_name,
                "extension has an unexpected type",
            )
        })
    }
}

impl<P: ?Sized> Clone for Extension<P> {
    fn clone(&self) -> Self {
        Self {
            entry: Arc::clone(&self.entry),
            _marker: PhantomData,
        }
    }
}

impl<P: ?Sized> fmt::Debug for Extension<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extension")
            .field("plugin_id", &self.entry.plugin_id)
            .field("implementation", &self.entry.contribution.implementation_name)
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
struct RegistrySnapshot {
    points: HashMap<TypeId, &'static str>,
    extensions: Vec<Arc<RegisteredExtension>>,
}

impl RegistrySnapshot {
    fn of_point(&self, point: TypeId) -> impl Iterator<Item = &Arc<RegisteredExtension>> {
        self.extensions
            .iter()
            .filter(move |e| e.contribution.point == point)
    }
}

struct RegistryInner {
    snapshot: ArcSwap<RegistrySnapshot>,
    writer: Mutex<()>,
}

impl Default for RegistryInner {
    fn default() -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(RegistrySnapshot::default()),
            writer: Mutex::new(()),
        }
    }
}

/// Registry of extension points and their contributed implementations.
///
/// Cloning is cheap; clones share the same registry.
#[derive(Clone, Default)]
pub struct ExtensionRegistry {
    inner: Arc<RegistryInner>,
}

impl ExtensionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `mutate` to a copy of the current snapshot and publish it.
    ///
    /// Writers are serialized. Nothing is published if `mutate` fails.
    fn update<T>(
        &self,
        mutate: impl FnOnce(&mut RegistrySnapshot) -> PluginResult<T>,
    ) -> PluginResult<T> {
        let _writer = self
            .inner
            .writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut next = RegistrySnapshot::clone(&self.inner.snapshot.load());
        let result = mutate(&mut next)?;
        self.inner.snapshot.store(Arc::new(next));
        Ok(result)
    }

    /// Declare `P` as an extension point. Idempotent.
    ///
    /// Returns `true` if the point was not declared before.
    pub fn register_extension_point<P>(&self) -> bool
    where
        P: ?Sized + 'static,
    {
        let point = TypeId::of::<P>();
        if self.inner.snapshot.load().points.contains_key(&point) {
            return false;
        }
        let added = self
            .update(|snapshot| Ok(snapshot.points.insert(point, type_name::<P>()).is_none()))
            .unwrap_or(false);
        if added {
            debug!(extension_point = type_name::<P>(), "Extension point registered");
        }
        added
    }

    /// Whether `P` has been declared as an extension point.
    #[must_use]
    pub fn is_extension_point<P>(&self) -> bool
    where
        P: ?Sized + 'static,
    {
        self.inner
            .snapshot
            .load()
            .points
            .contains_key(&TypeId::of::<P>())
    }

    /// Type names of all declared extension points, sorted.
    #[must_use]
    pub fn extension_points(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.inner.snapshot.load().points.values().copied().collect();
        names.sort_unstable();
        names
    }

    /// Whether any loaded plugin contributes an implementation of `P`.
    #[must_use]
    pub fn provides_extensions_of_type<P>(&self) -> bool
    where
        P: ?Sized + 'static,
    {
        self.inner
            .snapshot
            .load()
            .of_point(TypeId::of::<P>())
            .next()
            .is_some()
    }

    /// All implementations of `P`, in registration order.
    #[must_use]
    pub fn extensions_of_type<P>(&self) -> Vec<Extension<P>>
    where
        P: ?Sized + Send + Sync + 'static,
    {
        self.inner
            .snapshot
            .load()
            .of_point(TypeId::of::<P>())
            .map(|entry| Extension {
                entry: Arc::clone(entry),
                _marker: PhantomData,
            })
            .collect()
    }

    /// Whether implementation type `I` is contributed for any extension
    /// point.
    #[must_use]
    pub fn provides_extension_impl<I>(&self) -> bool
    where
        I: ?Sized + 'static,
    {
        let implementation = TypeId::of::<I>();
        self.inner
            .snapshot
            .load()
            .extensions
            .iter()
            .any(|e| e.contribution.implementation == implementation)
    }

    /// Display groups used by implementations of `P`, ordered by
    /// [`ToolGroup::order`] then name.
    #[must_use]
    pub fn tool_groups<P>(&self) -> Vec<ToolGroup>
    where
        P: ?Sized + 'static,
    {
        let mut groups: Vec<ToolGroup> = Vec::new();
        for entry in self.inner.snapshot.load().of_point(TypeId::of::<P>()) {
            if let Some(group) = &entry.contribution.group
                && !groups.contains(group)
            {
                groups.push(group.clone());
            }
        }
        groups.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.name.cmp(&b.name)));
        groups
    }

    /// Implementations of `P` in the group named `group`, in registration
    /// order.
    #[must_use]
    pub fn extensions_in_group<P>(&self, group: &str) -> Vec<Extension<P>>
    where
        P: ?Sized + Send + Sync + 'static,
    {
        self.extensions_of_type::<P>()
            .into_iter()
            .filter(|e| e.group().is_some_and(|g| g.name == group))
            .collect()
    }

    /// Plugins that currently have at least one contribution.
    #[must_use]
    pub fn contributors(&self) -> Vec<PluginId> {
        let mut ids: Vec<PluginId> = Vec::new();
        for entry in &self.inner.snapshot.load().extensions {
            if !ids.contains(&entry.plugin_id) {
                ids.push(entry.plugin_id.clone());
            }
        }
        ids
    }

    /// Add all of a plugin's contributions at once.
    ///
    /// Either every contribution is added or, if one names an undeclared
    /// extension point, none is.
    pub(crate) fn contribute_all(
        &self,
        plugin_id: &PluginId,
        contributions: Vec<ExtensionContribution>,
    ) -> PluginResult<usize> {
        let count = contributions.len();
        self.update(|snapshot| {
            if let Some(unknown) = contributions
                .iter()
                .find(|c| !snapshot.points.contains_key(&c.point))
            {
                return Err(PluginError::UnknownExtensionPoint {
                    plugin_id: plugin_id.clone(),
                    extension_point: unknown.point_name,
                });
            }
            for contribution in contributions {
                if let Some(other) = snapshot
                    .extensions
                    .iter()
                    .find(|e| e.contribution.implementation == contribution.implementation)
                {
                    warn!(
                        plugin_id = %plugin_id,
                        other_plugin_id = %other.plugin_id,
                        implementation = contribution.implementation_name,
                        "Implementation contributed more than once"
                    );
                }
                snapshot.extensions.push(Arc::new(RegisteredExtension {
                    plugin_id: plugin_id.clone(),
                    contribution,
                }));
            }
            Ok(())
        })?;
        if count > 0 {
            info!(plugin_id = %plugin_id, count, "Extensions registered");
        }
        Ok(count)
    }

    /// Remove every contribution made by `plugin_id`.
    ///
    /// Returns the number of contributions removed.
    pub(crate) fn unregister_all(&self, plugin_id: &PluginId) -> usize {
        let removed = self
            .update(|snapshot| {
                let before = snapshot.extensions.len();
                snapshot.extensions.retain(|e| &e.plugin_id != plugin_id);
                Ok(before.saturating_sub(snapshot.extensions.len()))
            })
            .unwrap_or(0);
        if removed > 0 {
            info!(plugin_id = %plugin_id, removed, "Extensions unregistered");
        }
        removed
    }
}

impl fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.inner.snapshot.load();
        f.debug_struct("ExtensionRegistry")
            .field("points", &snapshot.points.len())
            .field("extensions", &snapshot.extensions.len())
            .finish()
    }
}
