//! Field injection for objects built outside the container.
//!
//! Objects such as view controllers are created by some other factory and
//! handed to [`Container::inject_fields`](crate::Container::inject_fields)
//! afterwards. They opt in by implementing [`Injectable`] and requesting
//! each dependency by field name:
//!
//! ```
//! use std::sync::Arc;
//! use telekit_di::{Container, DiResult, Injectable, Injector};
//!
//! #[derive(Default)]
//! struct Controller {
//!     greeting: Option<Arc<String>>,
//!     retries: Option<Arc<u32>>,
//! }
//!
//! impl Injectable for Controller {
//!     fn inject(&mut self, injector: &mut Injector<'_>) -> DiResult<()> {
//!         self.greeting = Some(injector.required::<String>("greeting")?);
//!         self.retries = injector.optional::<u32>("retries")?;
//!         Ok(())
//!     }
//! }
//!
//! let container = Container::new();
//! let mut controller = Controller::default();
//! let err = container.inject_fields(&mut controller).unwrap_err();
//! assert!(err.to_string().contains("field `greeting`"));
//! ```

use std::sync::Arc;

use crate::container::Resolver;
use crate::error::{DiError, DiResult};
use crate::provider::Provider;

/// An object whose dependencies are set after construction.
pub trait Injectable {
    /// Request every dependency from `injector` and store it.
    ///
    /// # Errors
    ///
    /// Implementations should propagate the injector's errors unchanged.
    fn inject(&mut self, injector: &mut Injector<'_>) -> DiResult<()>;
}

/// Per-target injection context.
#[derive(Debug)]
pub struct Injector<'a> {
    resolver: Resolver<'a>,
    target: &'static str,
    injected: usize,
}

impl<'a> Injector<'a> {
    pub(crate) fn new(resolver: Resolver<'a>, target: &'static str) -> Self {
        Self {
            resolver,
            target,
            injected: 0,
        }
    }

    /// Resolve a dependency that must be bound.
    ///
    /// # Errors
    ///
    /// Returns [`DiError::UnresolvedDependency`] carrying the target type
    /// and `field` when `T` has no binding.
    pub fn required<T>(&mut self, field: &'static str) -> DiResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let value = self.resolver.resolve::<T>().map_err(|e| self.locate(e, field))?;
        self.injected = self.injected.saturating_add(1);
        Ok(value)
    }

    /// Resolve a dependency that may be absent.
    ///
    /// # Errors
    ///
    /// A bound `T` whose construction fails still produces an error.
    pub fn optional<T>(&mut self, field: &'static str) -> DiResult<Option<Arc<T>>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let value = self
            .resolver
            .try_resolve::<T>()
            .map_err(|e| self.locate(e, field))?;
        if value.is_some() {
            self.injected = self.injected.saturating_add(1);
        }
        Ok(value)
    }

    /// A lazy handle for `T`.
    #[must_use]
    pub fn provider<T>(&self) -> Provider<T>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.resolver.provider::<T>()
    }

    /// Type name of the object being injected.
    #[must_use]
    pub fn target(&self) -> &'static str {
        self.target
    }

    /// Number of fields populated so far.
    #[must_use]
    pub fn injected(&self) -> usize {
        self.injected
    }

    fn locate(&self, error: DiError, field: &'static str) -> DiError {
        match error {
            DiError::UnresolvedDependency {
                type_name,
                target: None,
                ..
            } => DiError::UnresolvedDependency {
                type_name,
                target: Some(self.target),
                field: Some(field),
            },
            other => other,
        }
    }
}
