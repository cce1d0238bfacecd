//! CLI command implementations.

pub(crate) mod plugins;
pub(crate) mod status;
pub(crate) mod tools;

use telekit_config::Config;
use telekit_host::{Host, HostSettings};
use telekit_plugins::LoadReport;

/// Build a host, register every linkable plugin and boot it.
pub(crate) async fn booted_host(config: &Config) -> anyhow::Result<(Host, LoadReport)> {
    let mut host = Host::new(HostSettings::from_config(config)?)?;
    host.discover_builtins()?;
    host.discover_directory()?;
    let report = host.boot().await;
    Ok((host, report))
}
