//! The dependency container.
//!
//! A [`Container`] owns exactly one [`BindingTable`] at a time. `configure`
//! builds a replacement table from a list of modules and swaps it in
//! atomically; `resolve` always works against the table that was current
//! when the call started, including every nested resolve made by factories.

use std::any::{TypeId, type_name};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tracing::{debug, info, trace};

use crate::binding::{Binder, BindingInfo, BindingTable};
use crate::error::{DiError, DiResult};
use crate::inject::{Injectable, Injector};
use crate::module::Module;
use crate::provider::Provider;

/// Shared state behind every clone of a [`Container`].
#[derive(Debug, Default)]
pub(crate) struct ContainerInner {
    table: RwLock<Arc<BindingTable>>,
    configure_lock: Mutex<()>,
    generation: AtomicU64,
}

impl ContainerInner {
    fn snapshot(&self) -> Arc<BindingTable> {
        Arc::clone(&self.table.read().unwrap_or_else(PoisonError::into_inner))
    }
}

/// Thread-safe dependency container.
///
/// Cloning is cheap and every clone shares the same configuration.
#[derive(Debug, Clone, Default)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

impl Container {
    /// Create a container with an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_inner(inner: Arc<ContainerInner>) -> Self {
        Self { inner }
    }

    /// Replace the whole configuration with the bindings of `modules`.
    ///
    /// Modules run in order against a fresh table. The new table is only
    /// installed if every module succeeds and no type is bound twice;
    /// otherwise the previous configuration stays in effect untouched.
    /// Singletons cached by the previous configuration are discarded.
    ///
    /// Concurrent calls are serialized.
    ///
    /// # Errors
    ///
    /// Returns [`DiError::DuplicateBinding`] if two modules bind the same
    /// type, or [`DiError::Module`] if a module fails.
    pub fn configure(&self, modules: &[Arc<dyn Module>]) -> DiResult<()> {
        let _serial = self
            .inner
            .configure_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut binder = Binder::new();
        for module in modules {
            let name = module.name().to_owned();
            binder.set_module(&name);
            if let Err(error) = module.configure(&mut binder) {
                binder.record_error(match error {
                    error @ DiError::Module { .. } => error,
                    other => DiError::module(name, other),
                });
            }
        }

        let generation = self
            .inner
            .generation
            .load(Ordering::Acquire)
            .saturating_add(1);
        let table = binder.finish()?.with_generation(generation);
        let bindings = table.len();

        *self
            .inner
            .table
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::new(table);
        self.inner.generation.store(generation, Ordering::Release);

        info!(
            generation,
            modules = modules.len(),
            bindings,
            "Container configured"
        );
        Ok(())
    }

    /// Resolve an instance of `T`.
    ///
    /// # Errors
    ///
    /// Returns [`DiError::UnresolvedDependency`] if no binding exists for
    /// `T` (or for anything its factory needs), [`DiError::CircularDependency`]
    /// on a construction cycle, or the factory's own error.
    pub fn resolve<T>(&self) -> DiResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let table = self.inner.snapshot();
        Resolver::new(&self.inner, &table).resolve::<T>()
    }

    /// Resolve `T` if it is bound, `None` if it is not.
    ///
    /// # Errors
    ///
    /// Failures other than a missing binding for `T` itself are returned.
    pub fn try_resolve<T>(&self) -> DiResult<Option<Arc<T>>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let table = self.inner.snapshot();
        Resolver::new(&self.inner, &table).try_resolve::<T>()
    }

    /// A lazy handle that resolves `T` each time it is invoked.
    ///
    /// Creating a provider never fails, even if `T` is not bound yet.
    #[must_use]
    pub fn resolve_provider<T>(&self) -> Provider<T>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        Provider::new(Arc::downgrade(&self.inner))
    }

    /// Populate the injectable fields of an object the container did not
    /// construct.
    ///
    /// # Errors
    ///
    /// Returns [`DiError::UnresolvedDependency`] naming the target type and
    /// field for the first required field without a binding.
    pub fn inject_fields<T>(&self, target: &mut T) -> DiResult<()>
    where
        T: Injectable,
    {
        let table = self.inner.snapshot();
        let resolver = Resolver::new(&self.inner, &table);
        let mut injector = Injector::new(resolver, type_name::<T>());
        target.inject(&mut injector)?;
        trace!(target = type_name::<T>(), "Fields injected");
        Ok(())
    }

    /// Whether the current configuration binds `T`.
    #[must_use]
    pub fn has_binding<T>(&self) -> bool
    where
        T: ?Sized + 'static,
    {
        self.inner.snapshot().get(&TypeId::of::<T>()).is_some()
    }

    /// Number of successful `configure` calls so far.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.inner.snapshot().generation()
    }

    /// Diagnostic listing of the current bindings, sorted by type name.
    #[must_use]
    pub fn bindings(&self) -> Vec<BindingInfo> {
        self.inner.snapshot().describe()
    }
}

/// Resolution context handed to factories.
///
/// Every resolve made through a `Resolver` uses the same configuration
/// snapshot as the resolve that invoked the factory.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    inner: &'a Arc<ContainerInner>,
    table: &'a BindingTable,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(inner: &'a Arc<ContainerInner>, table: &'a BindingTable) -> Self {
        Self { inner, table }
    }

    /// Resolve `T` from the same configuration snapshot.
    ///
    /// # Errors
    ///
    /// Same as [`Container::resolve`].
    pub fn resolve<T>(&self) -> DiResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let type_id = TypeId::of::<T>();
        let binding = self
            .table
            .get(&type_id)
            .ok_or_else(|| DiError::unresolved(type_name::<T>()))?;

        trace!(type_name = binding.type_name(), scope = %binding.scope(), "Resolving");
        let erased = binding.get(type_id, self)?;
        erased
            .downcast_ref::<Arc<T>>()
            .cloned()
            .ok_or_else(|| DiError::factory(type_name::<T>(), "instance has an unexpected type"))
    }

    /// Resolve `T` if it is bound.
    ///
    /// # Errors
    ///
    /// Same as [`Container::try_resolve`].
    pub fn try_resolve<T>(&self) -> DiResult<Option<Arc<T>>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        if self.table.get(&TypeId::of::<T>()).is_none() {
            debug!(type_name = type_name::<T>(), "Optional dependency not bound");
            return Ok(None);
        }
        self.resolve::<T>().map(Some)
    }

    /// A lazy handle for `T`, for dependencies that must not be resolved
    /// while the current object is still being built.
    #[must_use]
    pub fn provider<T>(&self) -> Provider<T>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        Provider::new(Arc::downgrade(self.inner))
    }

    /// The container this resolver belongs to.
    #[must_use]
    pub fn container(&self) -> Container {
        Container::from_inner(Arc::clone(self.inner))
    }
}
