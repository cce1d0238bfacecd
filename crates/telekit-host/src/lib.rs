//! Telekit Host - wiring between configuration, plugins and tools.
//!
//! The host owns the one extension point every Telekit build has,
//! [`Tool`], and knows how to turn a [`telekit_config::Config`] into a
//! booted [`telekit_plugins::PluginManager`].
//!
//! # Example
//!
//! ```rust,no_run
//! use telekit_config::Config;
//! use telekit_host::{Host, HostSettings};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let loaded = Config::load(None)?;
//! let mut host = Host::new(HostSettings::from_config(&loaded.config)?)?;
//! host.discover_builtins()?;
//! host.discover_directory()?;
//! let report = host.boot().await;
//! for entry in host.tools().entries() {
//!     println!("{}", entry.name());
//! }
//! # let _ = report;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod builtin;
mod entry;
mod error;
mod host;
mod module;
mod tool;

pub use entry::EntryPoints;
pub use error::{HostError, HostResult};
pub use host::{DiscoverySummary, Host, HostSettings};
pub use module::{HostInfo, HostModule};
pub use tool::{Tool, ToolCatalog, ToolEntry};

/// Platform version of this host build.
pub const HOST_VERSION: &str = env!("CARGO_PKG_VERSION");
