//! Telekit Test - Shared test utilities for the Telekit runtime.
//!
//! This crate provides a configurable [`MockPlugin`] and fixtures for
//! descriptors and plugin units, used across the Telekit crates as a
//! dev-dependency.
//!
//! # Usage
//!
//! ```rust,ignore
//! use telekit_plugins::{PluginManager, PluginState};
//! use telekit_test::{MockPlugin, test_descriptor};
//!
//! #[tokio::test]
//! async fn start_failure_is_contained() {
//!     let mock = MockPlugin::new().failing_start();
//!     let counts = mock.counts();
//!     let mut manager = PluginManager::builder(semver::Version::new(1, 0, 0))
//!         .build()
//!         .unwrap();
//!     manager.discover(mock.into_unit(test_descriptor("flaky"))).unwrap();
//!
//!     let report = manager.boot_all().await;
//!     assert_eq!(report.failed.len(), 1);
//!     assert_eq!(counts.start_calls(), 1);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
