//! Tool commands - list and run.

use telekit_config::Config;

use super::booted_host;
use crate::theme::Theme;

pub(crate) async fn list(config: &Config, filter: Option<&str>) -> anyhow::Result<()> {
    let (mut host, _) = booted_host(config).await?;
    let catalog = host.tools();
    let entries = catalog.filter(filter.unwrap_or_default());

    if entries.is_empty() {
        println!("{}", Theme::info("No tools available"));
    } else {
        println!("{}", Theme::header("Tools"));
        println!("  {:<24} {:<12} {:<20} DESCRIPTION", "NAME", "GROUP", "PLUGIN");
        println!("{}", Theme::separator());
        for entry in &entries {
            println!(
                "  {:<24} {:<12} {:<20} {}",
                entry.name(),
                entry.group().map_or("-", |g| g.name.as_str()),
                entry.plugin_id(),
                entry.tool().description()
            );
        }
    }

    host.shutdown().await;
    Ok(())
}

pub(crate) async fn run(config: &Config, name: &str, input: &str) -> anyhow::Result<()> {
    let (mut host, _) = booted_host(config).await?;
    let catalog = host.tools();
    let result = match catalog.find(name) {
        Some(entry) => entry.tool().run(input),
        None => Err(anyhow::anyhow!("no tool named '{name}'")),
    };
    host.shutdown().await;

    let output = result?;
    println!("{output}");
    Ok(())
}
