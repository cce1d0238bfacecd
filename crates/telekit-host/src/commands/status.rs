//! Status and configuration commands.

use telekit_config::{Config, LoadedConfig, user_config_path};

use super::booted_host;
use crate::theme::Theme;

pub(crate) async fn show(config: &Config, json: bool) -> anyhow::Result<()> {
    let (mut host, report) = booted_host(config).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "{}",
            Theme::header(&format!(
                "Telekit {} (platform {})",
                telekit_host::HOST_VERSION,
                host.settings().host_version
            ))
        );
        println!("  {:<24} {:<10} {:<10} NAME", "ID", "VERSION", "STATE");
        println!("{}", Theme::separator());
        for record in host.manager().records() {
            println!(
                "  {:<24} {:<10} {} {}",
                record.id(),
                record.descriptor.version(),
                Theme::state(record.state),
                record.descriptor.name()
            );
        }

        if report.failed.is_empty() {
            println!("\n{}", Theme::success("All enabled plugins started"));
        } else {
            println!();
            for failure in &report.failed {
                println!(
                    "{}",
                    Theme::error(&format!(
                        "{} ({}): {}",
                        failure.name, failure.plugin_id, failure.failure
                    ))
                );
            }
        }
    }

    for error in host.shutdown().await {
        eprintln!("{}", Theme::warning(&error.to_string()));
    }
    Ok(())
}

pub(crate) fn config_paths(loaded: &LoadedConfig) {
    println!("{}", Theme::header("Configuration"));
    match user_config_path() {
        Some(path) => println!("  user file:    {}", path.display()),
        None => println!("  user file:    {}", Theme::dimmed("(no config directory)")),
    }
    if loaded.loaded_files.is_empty() {
        println!("  loaded:       {}", Theme::dimmed("defaults only"));
    }
    for path in &loaded.loaded_files {
        println!("  loaded:       {}", path.display());
    }
    println!("  plugins dir:  {}", loaded.config.plugins_dir().display());
    println!("  log level:    {}", loaded.config.logging.level);
}
