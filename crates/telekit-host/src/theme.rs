//! CLI theme and styling.

use colored::Colorize;
use telekit_plugins::PluginState;

/// CLI theme configuration.
pub(crate) struct Theme;

impl Theme {
    /// Format a header.
    pub(crate) fn header(text: &str) -> String {
        format!("{}", text.bold().cyan())
    }

    /// Format a success message.
    pub(crate) fn success(text: &str) -> String {
        format!("{} {}", "✓".green(), text)
    }

    /// Format an error message.
    pub(crate) fn error(text: &str) -> String {
        format!("{} {}", "✗".red(), text.red())
    }

    /// Format a warning message.
    pub(crate) fn warning(text: &str) -> String {
        format!("{} {}", "!".yellow(), text.yellow())
    }

    /// Format an info message.
    pub(crate) fn info(text: &str) -> String {
        format!("{} {}", "i".blue(), text)
    }

    /// Format a dimmed message.
    pub(crate) fn dimmed(text: &str) -> String {
        format!("{}", text.dimmed())
    }

    /// Format a separator line.
    pub(crate) fn separator() -> String {
        "━".repeat(50).dimmed().to_string()
    }

    /// Color a plugin state for tables.
    pub(crate) fn state(state: PluginState) -> String {
        let text = format!("{:<10}", state.as_str());
        match state {
            PluginState::Started => text.green().to_string(),
            PluginState::Failed => text.red().to_string(),
            PluginState::Disabled | PluginState::Stopped => text.dimmed().to_string(),
            PluginState::Discovered | PluginState::Installed | PluginState::Loaded => {
                text.yellow().to_string()
            },
        }
    }
}
