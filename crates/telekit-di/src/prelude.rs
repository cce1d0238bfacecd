//! Prelude module - commonly used types for convenient import.
//!
//! Use `use telekit_di::prelude::*;` to import all essential types.

pub use crate::{
    Binder, Container, DiError, DiResult, FnModule, Injectable, Injector, Module, Provider,
    Resolver, Scope,
};
