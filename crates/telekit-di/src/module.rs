//! Binding modules.

use std::any::type_name;
use std::fmt;

use crate::binding::Binder;
use crate::error::DiResult;

/// A named set of bindings contributed by the host or by a plugin.
///
/// Modules are run in order on every `configure`, so `configure` must be
/// repeatable and side-effect free apart from the binder calls.
pub trait Module: Send + Sync {
    /// Name used in diagnostics, defaults to the implementing type.
    fn name(&self) -> &str {
        type_name::<Self>()
    }

    /// Register this module's bindings.
    ///
    /// # Errors
    ///
    /// Returns an error when the module cannot describe its bindings, for
    /// example when some precondition of the host is not met.
    fn configure(&self, binder: &mut Binder) -> DiResult<()>;
}

/// A [`Module`] built from a closure.
///
/// ```
/// use std::sync::Arc;
/// use telekit_di::{Container, FnModule, Module};
///
/// let module: Arc<dyn Module> = Arc::new(FnModule::new("greeting", |binder| {
///     binder.instance(Arc::new(String::from("hello")));
///     Ok(())
/// }));
/// let container = Container::new();
/// container.configure(&[module]).unwrap();
/// assert_eq!(*container.resolve::<String>().unwrap(), "hello");
/// ```
pub struct FnModule<F> {
    name: String,
    configure: F,
}

impl<F> FnModule<F>
where
    F: Fn(&mut Binder) -> DiResult<()> + Send + Sync,
{
    /// Wrap a closure as a named module.
    pub fn new(name: impl Into<String>, configure: F) -> Self {
        Self {
            name: name.into(),
            configure,
        }
    }
}

impl<F> Module for FnModule<F>
where
    F: Fn(&mut Binder) -> DiResult<()> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn configure(&self, binder: &mut Binder) -> DiResult<()> {
        (self.configure)(binder)
    }
}

impl<F> fmt::Debug for FnModule<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnModule")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
