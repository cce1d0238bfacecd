//! Container error types.

use thiserror::Error;

/// Errors raised while configuring the container or resolving from it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiError {
    /// No binding exists for the requested type.
    ///
    /// `target` and `field` are set when the lookup happened while
    /// injecting into an object the container did not construct.
    #[error("unresolved dependency: no binding for `{type_name}`{}", injection_site(.target, .field))]
    UnresolvedDependency {
        /// The requested capability type.
        type_name: &'static str,
        /// Type of the object being injected into, if any.
        target: Option<&'static str>,
        /// Name of the field being injected, if any.
        field: Option<&'static str>,
    },

    /// Two modules of the same configuration bind the same type.
    #[error("duplicate binding for `{type_name}`: provided by both {first_module} and {second_module}")]
    DuplicateBinding {
        /// The capability type bound twice.
        type_name: &'static str,
        /// Module that registered the first binding.
        first_module: String,
        /// Module that attempted the second binding.
        second_module: String,
    },

    /// A type was requested again while it was still being constructed.
    #[error("circular dependency: {chain}")]
    CircularDependency {
        /// The resolution chain, e.g. `A -> B -> A`.
        chain: String,
    },

    /// A module failed while registering its bindings.
    #[error("module {module} failed to configure: {message}")]
    Module {
        /// The failing module.
        module: String,
        /// Failure reason.
        message: String,
    },

    /// A factory failed to produce an instance.
    #[error("factory for `{type_name}` failed: {message}")]
    Factory {
        /// The type the factory produces.
        type_name: &'static str,
        /// Failure reason.
        message: String,
    },

    /// A provider was invoked after its container was dropped.
    #[error("container dropped before provider for `{type_name}` was invoked")]
    ContainerDropped {
        /// The type the provider was created for.
        type_name: &'static str,
    },
}

impl DiError {
    /// Build an [`DiError::UnresolvedDependency`] for a plain `resolve` call.
    #[must_use]
    pub fn unresolved(type_name: &'static str) -> Self {
        Self::UnresolvedDependency {
            type_name,
            target: None,
            field: None,
        }
    }

    /// Build a [`DiError::Factory`] from any displayable error.
    pub fn factory(type_name: &'static str, error: impl std::fmt::Display) -> Self {
        Self::Factory {
            type_name,
            message: error.to_string(),
        }
    }

    /// Build a [`DiError::Module`] from any displayable error.
    pub fn module(module: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self::Module {
            module: module.into(),
            message: error.to_string(),
        }
    }

    /// Whether this error means a binding was missing.
    #[must_use]
    pub fn is_unresolved(&self) -> bool {
        matches!(self, Self::UnresolvedDependency { .. })
    }
}

fn injection_site(target: &Option<&'static str>, field: &Option<&'static str>) -> String {
    match (target, field) {
        (Some(target), Some(field)) => format!(" (required by field `{field}` of `{target}`)"),
        (Some(target), None) => format!(" (required by `{target}`)"),
        _ => String::new(),
    }
}

/// Result type for container operations.
pub type DiResult<T> = Result<T, DiError>;
