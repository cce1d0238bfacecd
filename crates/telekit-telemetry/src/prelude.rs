//! Prelude module - commonly used types for convenient import.
//!
//! ```rust,no_run
//! use telekit_telemetry::prelude::*;
//! ```

pub use crate::{
    FileRotation, LogConfig, LogFormat, LogTarget, TelemetryError, TelemetryResult,
    setup_logging,
};
