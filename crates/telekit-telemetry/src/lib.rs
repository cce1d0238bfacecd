//! Telekit Telemetry - logging setup for the Telekit plugin runtime.
//!
//! Every Telekit crate logs through `tracing`. This crate installs the
//! global subscriber: level and per-target directives, one of four output
//! formats, and stdout, stderr or rolling-file output.
//!
//! # Example
//!
//! ```rust,no_run
//! use telekit_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), telekit_telemetry::TelemetryError> {
//! let config = LogConfig::new("info")
//!     .with_format(LogFormat::Compact)
//!     .with_directive("telekit_plugins=debug");
//! setup_logging(&config)?;
//! tracing::info!("host starting");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{FileRotation, LogConfig, LogFormat, LogTarget, setup_logging};
