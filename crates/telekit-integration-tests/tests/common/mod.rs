//! Shared extension point and implementations for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use telekit_di::Container;
use telekit_plugins::{ExtensionContribution, ExtensionRegistry, PluginManager};
use telekit_test::test_host_version;

/// Extension point used by the property tests.
pub trait Tool: Send + Sync {
    fn label(&self) -> &'static str;
}

pub struct FooExtension;

impl Tool for FooExtension {
    fn label(&self) -> &'static str {
        "foo"
    }
}

pub struct BarExtension;

impl Tool for BarExtension {
    fn label(&self) -> &'static str {
        "bar"
    }
}

pub fn foo_contribution() -> ExtensionContribution {
    ExtensionContribution::new::<dyn Tool, FooExtension, _>(|_: &Container| {
        Ok(Arc::new(FooExtension) as Arc<dyn Tool>)
    })
}

pub fn bar_contribution() -> ExtensionContribution {
    ExtensionContribution::new::<dyn Tool, BarExtension, _>(|_: &Container| {
        Ok(Arc::new(BarExtension) as Arc<dyn Tool>)
    })
}

/// A manager whose registry declares `dyn Tool`.
pub fn manager_with_tool_point() -> PluginManager {
    let registry = ExtensionRegistry::new();
    registry.register_extension_point::<dyn Tool>();
    PluginManager::builder(test_host_version())
        .registry(registry)
        .build()
        .unwrap()
}

/// Labels of the `dyn Tool` extensions, in registry order.
pub fn tool_labels(manager: &PluginManager) -> Vec<&'static str> {
    manager
        .registry()
        .extensions_of_type::<dyn Tool>()
        .iter()
        .map(|ext| ext.create(manager.container()).unwrap().label())
        .collect()
}
