//! Plugin descriptor commands - list and check.

use std::path::{Path, PathBuf};

use serde::Serialize;
use telekit_config::Config;
use telekit_host::HostSettings;
use telekit_plugins::{PluginDescriptor, check_compatible, discover_descriptors, load_descriptor};

use crate::theme::Theme;

#[derive(Serialize)]
struct DescriptorRow<'a> {
    id: &'a str,
    name: &'a str,
    version: String,
    platform_version: Option<String>,
    compatible: bool,
    disabled: bool,
    path: String,
}

pub(crate) fn list(config: &Config, dir: Option<PathBuf>, json: bool) -> anyhow::Result<()> {
    let settings = HostSettings::from_config(config)?;
    let dir = dir.unwrap_or_else(|| settings.plugins_dir.clone());

    if !dir.is_dir() {
        println!(
            "{}",
            Theme::info(&format!("No plugins directory at {}", dir.display()))
        );
        return Ok(());
    }

    let descriptors = discover_descriptors(&dir)?;
    let rows: Vec<DescriptorRow<'_>> = descriptors
        .iter()
        .map(|(descriptor, path)| DescriptorRow {
            id: descriptor.id().as_str(),
            name: descriptor.name(),
            version: descriptor.version().to_string(),
            platform_version: descriptor.platform_version().map(ToString::to_string),
            compatible: check_compatible(descriptor, &settings.host_version),
            disabled: settings.disabled.contains(descriptor.id()),
            path: path.display().to_string(),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("{}", Theme::info("No plugins found"));
        return Ok(());
    }

    println!("{}", Theme::header(&format!("Plugins in {}", dir.display())));
    println!(
        "  {:<24} {:<10} {:<12} {:<8} NAME",
        "ID", "VERSION", "COMPATIBLE", "ENABLED"
    );
    println!("{}", Theme::separator());
    for row in &rows {
        let compatible = if row.compatible { "yes" } else { "no" };
        let enabled = if row.disabled { "no" } else { "yes" };
        println!(
            "  {:<24} {:<10} {:<12} {:<8} {}",
            row.id, row.version, compatible, enabled, row.name
        );
    }
    println!(
        "\n{}",
        Theme::dimmed(&format!(
            "{} plugin(s), host platform {}",
            rows.len(),
            settings.host_version
        ))
    );
    Ok(())
}

pub(crate) fn check(config: &Config, file: &Path) -> anyhow::Result<()> {
    let settings = HostSettings::from_config(config)?;
    let descriptor = match load_descriptor(file) {
        Ok(descriptor) => descriptor,
        Err(e) => {
            println!("{}", Theme::error(&e.to_string()));
            return Err(e.into());
        },
    };

    print_descriptor(&descriptor);
    if check_compatible(&descriptor, &settings.host_version) {
        println!(
            "{}",
            Theme::success(&format!("Compatible with platform {}", settings.host_version))
        );
    } else {
        println!(
            "{}",
            Theme::warning(&format!(
                "Requires platform {}, host is {}",
                descriptor
                    .platform_version()
                    .map_or_else(String::new, ToString::to_string),
                settings.host_version
            ))
        );
    }
    Ok(())
}

fn print_descriptor(descriptor: &PluginDescriptor) {
    println!("{}", Theme::header(descriptor.name()));
    println!("  id:        {}", descriptor.id());
    println!("  version:   {}", descriptor.version());
    if let Some(author) = descriptor.author() {
        println!("  author:    {author}");
    }
    if let Some(req) = descriptor.platform_version() {
        println!("  platform:  {req}");
    }
    if let Some(description) = descriptor.description() {
        println!("  about:     {description}");
    }
    if let Some(homepage) = descriptor.homepage() {
        println!("  homepage:  {homepage}");
    }
}
