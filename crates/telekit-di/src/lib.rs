//! Dependency container for the Telekit plugin runtime.
//!
//! The host and every loaded plugin contribute [`Module`]s. A [`Container`]
//! turns the current list of modules into a single binding table mapping a
//! capability type (often a `dyn Trait`) to a factory and a [`Scope`]:
//!
//! - [`Scope::Singleton`]: constructed once per configuration, then shared
//! - [`Scope::Transient`]: constructed on every resolve
//!
//! Reconfiguring replaces the whole table; bindings are never merged across
//! configurations. Lazy [`Provider`]s tolerate wiring order between modules,
//! and [`Injectable`] objects built outside the container receive their
//! dependencies through [`Container::inject_fields`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use telekit_di::prelude::*;
//!
//! trait Clock: Send + Sync {
//!     fn now(&self) -> u64;
//! }
//!
//! struct Frozen;
//! impl Clock for Frozen {
//!     fn now(&self) -> u64 {
//!         0
//!     }
//! }
//!
//! let host: Arc<dyn Module> = Arc::new(FnModule::new("host", |binder| {
//!     binder.singleton::<dyn Clock, _>(|_| Ok(Arc::new(Frozen) as Arc<dyn Clock>));
//!     Ok(())
//! }));
//!
//! let container = Container::new();
//! container.configure(&[host]).unwrap();
//! assert_eq!(container.resolve::<dyn Clock>().unwrap().now(), 0);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

mod binding;
mod container;
mod error;
mod guard;
mod inject;
mod module;
mod provider;

pub use binding::{Binder, BindingInfo, Scope};
pub use container::{Container, Resolver};
pub use error::{DiError, DiResult};
pub use inject::{Injectable, Injector};
pub use module::{FnModule, Module};
pub use provider::Provider;
