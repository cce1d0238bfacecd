//! Prelude module - commonly used types for convenient import.
//!
//! ```rust,ignore
//! use telekit_test::prelude::*;
//! ```

pub use crate::{
    HookBehavior, HookCounts, MockPlugin, init_test_tracing, test_descriptor,
    test_descriptor_requiring, test_host_version, write_descriptor,
};
