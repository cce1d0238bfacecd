//! Binding table: capability type to factory and scope.
//!
//! A [`BindingTable`] is built once per `configure` call by running every
//! module against a [`Binder`]. It is immutable afterwards except for the
//! per-binding singleton cache.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use tracing::trace;

use crate::container::Resolver;
use crate::error::{DiError, DiResult};
use crate::guard::ResolutionGuard;

/// Instance lifetime of a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// One instance per configuration, created on first resolve.
    Singleton,
    /// A fresh instance on every resolve.
    Transient,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Singleton => f.write_str("singleton"),
            Self::Transient => f.write_str("transient"),
        }
    }
}

/// A resolved instance with its concrete `Arc<T>` erased.
///
/// The payload is always an `Arc<T>` for the binding's `T`, which lets
/// unsized capability types (`dyn Trait`) travel through `Any`.
pub(crate) type ErasedInstance = Arc<dyn Any + Send + Sync>;

type ErasedFactory = Arc<dyn Fn(&Resolver<'_>) -> DiResult<ErasedInstance> + Send + Sync>;

/// One entry of the binding table.
pub(crate) struct Binding {
    type_name: &'static str,
    scope: Scope,
    module: String,
    factory: ErasedFactory,
    instance: OnceLock<ErasedInstance>,
    construction: Mutex<()>,
}

impl Binding {
    pub(crate) fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub(crate) fn scope(&self) -> Scope {
        self.scope
    }

    /// Produce an instance according to the binding's scope.
    ///
    /// Singletons use double-checked locking: the cache is read without
    /// locking, and only callers that miss it contend on the construction
    /// lock. The factory therefore runs at most once per table.
    pub(crate) fn get(&self, type_id: TypeId, resolver: &Resolver<'_>) -> DiResult<ErasedInstance> {
        match self.scope {
            Scope::Transient => {
                let _guard = ResolutionGuard::enter(type_id, self.type_name)?;
                (self.factory)(resolver)
            },
            Scope::Singleton => {
                if let Some(instance) = self.instance.get() {
                    return Ok(Arc::clone(instance));
                }
                let _guard = ResolutionGuard::enter(type_id, self.type_name)?;
                let _lock = self
                    .construction
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                if let Some(instance) = self.instance.get() {
                    return Ok(Arc::clone(instance));
                }
                trace!(type_name = self.type_name, module = %self.module, "Constructing singleton");
                let instance = (self.factory)(resolver)?;
                Ok(Arc::clone(self.instance.get_or_init(|| instance)))
            },
        }
    }

    fn is_constructed(&self) -> bool {
        self.instance.get().is_some()
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("type_name", &self.type_name)
            .field("scope", &self.scope)
            .field("module", &self.module)
            .field("constructed", &self.is_constructed())
            .finish_non_exhaustive()
    }
}

/// Immutable set of bindings for one container configuration.
#[derive(Debug, Default)]
pub(crate) struct BindingTable {
    bindings: HashMap<TypeId, Binding>,
    generation: u64,
}

impl BindingTable {
    pub(crate) fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn get(&self, type_id: &TypeId) -> Option<&Binding> {
        self.bindings.get(type_id)
    }

    pub(crate) fn len(&self) -> usize {
        self.bindings.len()
    }

    pub(crate) fn describe(&self) -> Vec<BindingInfo> {
        let mut infos: Vec<BindingInfo> = self
            .bindings
            .values()
            .map(|b| BindingInfo {
                type_name: b.type_name,
                scope: b.scope,
                module: b.module.clone(),
                constructed: b.is_constructed(),
            })
            .collect();
        infos.sort_by(|a, b| a.type_name.cmp(b.type_name));
        infos
    }
}

/// Diagnostic view of a single binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingInfo {
    /// The bound capability type.
    pub type_name: &'static str,
    /// Its scope.
    pub scope: Scope,
    /// The module that provided it.
    pub module: String,
    /// Whether a singleton instance has been cached.
    pub constructed: bool,
}

/// Collects bindings from modules during `configure`.
///
/// Binding methods never fail on the spot; conflicts are recorded and
/// reported when the container finishes the configuration, so a single
/// bad module aborts the whole configuration.
pub struct Binder {
    module: String,
    table: BindingTable,
    errors: Vec<DiError>,
}

impl Binder {
    pub(crate) fn new() -> Self {
        Self {
            module: String::new(),
            table: BindingTable::default(),
            errors: Vec::new(),
        }
    }

    pub(crate) fn set_module(&mut self, module: &str) {
        module.clone_into(&mut self.module);
    }

    pub(crate) fn record_error(&mut self, error: DiError) {
        self.errors.push(error);
    }

    pub(crate) fn finish(self) -> DiResult<BindingTable> {
        match self.errors.into_iter().next() {
            Some(error) => Err(error),
            None => Ok(self.table),
        }
    }

    /// Name of the module currently being configured.
    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Bind `T` to a factory with an explicit scope.
    pub fn bind<T, F>(&mut self, scope: Scope, factory: F) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Resolver<'_>) -> DiResult<Arc<T>> + Send + Sync + 'static,
    {
        let type_id = TypeId::of::<T>();
        let type_name = type_name::<T>();

        if let Some(existing) = self.table.bindings.get(&type_id) {
            self.errors.push(DiError::DuplicateBinding {
                type_name,
                first_module: existing.module.clone(),
                second_module: self.module.clone(),
            });
            return self;
        }

        let factory: ErasedFactory =
            Arc::new(move |resolver| factory(resolver).map(|v| Arc::new(v) as ErasedInstance));
        self.table.bindings.insert(type_id, Binding {
            type_name,
            scope,
            module: self.module.clone(),
            factory,
            instance: OnceLock::new(),
            construction: Mutex::new(()),
        });
        self
    }

    /// Bind `T` as a singleton: the factory runs once per configuration.
    pub fn singleton<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Resolver<'_>) -> DiResult<Arc<T>> + Send + Sync + 'static,
    {
        self.bind(Scope::Singleton, factory)
    }

    /// Bind `T` as transient: the factory runs on every resolve.
    pub fn transient<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Resolver<'_>) -> DiResult<Arc<T>> + Send + Sync + 'static,
    {
        self.bind(Scope::Transient, factory)
    }

    /// Bind `T` to an already constructed instance.
    pub fn instance<T>(&mut self, value: Arc<T>) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.bind(Scope::Singleton, move |_| Ok(Arc::clone(&value)))
    }
}

impl fmt::Debug for Binder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binder")
            .field("module", &self.module)
            .field("bindings", &self.table.len())
            .field("errors", &self.errors)
            .finish()
    }
}
