//! Lazy dependency handles.

use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Weak};

use crate::container::{Container, ContainerInner};
use crate::error::{DiError, DiResult};

/// Deferred resolution of `T`.
///
/// A provider holds a weak reference to its container, so storing one in
/// a singleton does not keep the container alive. Each [`Provider::get`]
/// resolves against the configuration in effect at that moment.
pub struct Provider<T: ?Sized> {
    container: Weak<ContainerInner>,
    _marker: PhantomData<fn() -> Arc<T>>,
}

impl<T> Provider<T>
where
    T: ?Sized + Send + Sync + 'static,
{
    pub(crate) fn new(container: Weak<ContainerInner>) -> Self {
        Self {
            container,
            _marker: PhantomData,
        }
    }

    /// Resolve `T` now.
    ///
    /// # Errors
    ///
    /// Returns [`DiError::ContainerDropped`] if the container no longer
    /// exists, otherwise whatever [`Container::resolve`] returns.
    pub fn get(&self) -> DiResult<Arc<T>> {
        let inner = self.container.upgrade().ok_or(DiError::ContainerDropped {
            type_name: type_name::<T>(),
        })?;
        Container::from_inner(inner).resolve::<T>()
    }
}

impl<T: ?Sized> Clone for Provider<T> {
    fn clone(&self) -> Self {
        Self {
            container: Weak::clone(&self.container),
            _marker: PhantomData,
        }
    }
}

impl<T: ?Sized> fmt::Debug for Provider<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("type_name", &type_name::<T>())
            .field("alive", &(self.container.strong_count() > 0))
            .finish()
    }
}
