//! Prelude module - commonly used types for convenient import.
//!
//! Use `use telekit_plugins::prelude::*;` to import all essential types.

pub use crate::{
    Extension, ExtensionContribution, ExtensionRegistry, LoadReport, Plugin, PluginDescriptor,
    PluginError, PluginEvent, PluginId, PluginManager, PluginResult, PluginState, PluginUnit,
    ToolGroup,
};
