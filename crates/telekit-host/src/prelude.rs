//! Prelude module - commonly used types for convenient import.
//!
//! ```rust,no_run
//! use telekit_host::prelude::*;
//! ```

pub use crate::{
    EntryPoints, Host, HostError, HostInfo, HostResult, HostSettings, Tool, ToolCatalog,
    ToolEntry,
};
