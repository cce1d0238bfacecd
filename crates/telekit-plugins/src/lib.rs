//! Plugin runtime for the Telekit toolbox.
//!
//! Provides the pieces the host uses to run dynamically supplied plugins:
//!
//! - [`PluginId`]: stable, human-readable plugin identifier
//! - [`PluginDescriptor`]: static metadata read from `plugin.toml` before any plugin code runs,
//!   with [`check_compatible`] for platform version ranges
//! - [`Plugin`] / [`PluginUnit`]: the plugin authoring contract and its entry point
//! - [`ExtensionRegistry`]: copy-on-write registry of extension points and contributions
//! - [`PluginManager`]: lifecycle state machine with failure isolation
//!
//! # Lifecycle
//!
//! ```text
//! DISCOVERED --install--> INSTALLED --load--> LOADED --start--> STARTED --stop--> STOPPED
//!      |                      |                  |                   |
//!      +---(incompatible)-----+----(load error)--+----(start error)--+--> FAILED
//! ```
//!
//! A plugin that fails at any step is recorded with its cause and unwired.
//! Other plugins and the host keep running.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod descriptor;
pub mod discovery;
pub mod error;
pub mod event;
pub mod extension;
pub mod id;
pub mod manager;
pub mod plugin;
pub mod state;

mod guard;

pub use descriptor::{
    DESCRIPTOR_FILE_NAME, PluginDescriptor, check_compatible, parse_descriptor,
    parse_platform_requirement,
};
pub use discovery::{discover_descriptors, load_descriptor};
pub use error::{PluginError, PluginResult};
pub use event::PluginEvent;
pub use extension::{Extension, ExtensionContribution, ExtensionRegistry, ToolGroup};
pub use id::PluginId;
pub use manager::{LoadReport, PluginManager, PluginManagerBuilder};
pub use plugin::{Plugin, PluginUnit};
pub use state::{ContributedExtension, FailureReport, FailureStage, PluginFailure, PluginRecord, PluginState};
