//! The `Tool` extension point and the catalog built from it.

use std::sync::Arc;

use telekit_di::Container;
use telekit_plugins::{ExtensionRegistry, PluginId, ToolGroup};
use tracing::warn;

/// A user-facing tool contributed by a plugin.
///
/// The host declares `dyn Tool` as an extension point at startup; plugins
/// contribute implementations through
/// [`ExtensionContribution`](telekit_plugins::ExtensionContribution).
pub trait Tool: Send + Sync {
    /// Display name, unique within the catalog.
    fn name(&self) -> &str;

    /// One-line description.
    fn description(&self) -> &str {
        ""
    }

    /// Transform `input` into the tool's output.
    ///
    /// # Errors
    ///
    /// Returns an error when `input` is not acceptable to the tool.
    fn run(&self, input: &str) -> anyhow::Result<String>;
}

/// A tool instance together with where it came from.
#[derive(Clone)]
pub struct ToolEntry {
    plugin_id: PluginId,
    group: Option<ToolGroup>,
    tool: Arc<dyn Tool>,
}

impl ToolEntry {
    /// The contributing plugin.
    #[must_use]
    pub fn plugin_id(&self) -> &PluginId {
        &self.plugin_id
    }

    /// The display group, if the contribution named one.
    #[must_use]
    pub fn group(&self) -> Option<&ToolGroup> {
        self.group.as_ref()
    }

    /// The tool itself.
    #[must_use]
    pub fn tool(&self) -> &Arc<dyn Tool> {
        &self.tool
    }

    /// Shorthand for `self.tool().name()`.
    #[must_use]
    pub fn name(&self) -> &str {
        self.tool.name()
    }
}

impl std::fmt::Debug for ToolEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolEntry")
            .field("plugin_id", &self.plugin_id)
            .field("name", &self.tool.name())
            .field("group", &self.group)
            .finish()
    }
}

/// Tools of all loaded plugins, sorted by name.
///
/// The catalog is a point-in-time view. Rebuild it after plugins start or
/// stop.
#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
    entries: Vec<ToolEntry>,
}

impl ToolCatalog {
    /// Instantiate every `dyn Tool` extension in `registry`.
    ///
    /// Extensions whose factory fails are logged and left out.
    #[must_use]
    pub fn collect(registry: &ExtensionRegistry, container: &Container) -> Self {
        let mut entries: Vec<ToolEntry> = registry
            .extensions_of_type::<dyn Tool>()
            .into_iter()
            .filter_map(|extension| match extension.create(container) {
                Ok(tool) => Some(ToolEntry {
                    plugin_id: extension.plugin_id().clone(),
                    group: extension.group().cloned(),
                    tool,
                }),
                Err(e) => {
                    warn!(
                        plugin_id = %extension.plugin_id(),
                        implementation = extension.implementation_name(),
                        error = %e,
                        "Skipping tool that could not be created"
                    );
                    None
                },
            })
            .collect();
        entries.sort_by_cached_key(|e| e.name().to_lowercase());
        Self { entries }
    }

    /// All tools, sorted by name.
    #[must_use]
    pub fn entries(&self) -> &[ToolEntry] {
        &self.entries
    }

    /// Number of tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no plugin contributes a tool.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tools whose name contains `query`, ignoring case. A blank query
    /// matches everything.
    #[must_use]
    pub fn filter(&self, query: &str) -> Vec<&ToolEntry> {
        let query = query.trim().to_lowercase();
        self.entries
            .iter()
            .filter(|e| query.is_empty() || e.name().to_lowercase().contains(&query))
            .collect()
    }

    /// The tool with exactly this name, ignoring case.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&ToolEntry> {
        self.entries
            .iter()
            .find(|e| e.name().eq_ignore_ascii_case(name.trim()))
    }
}
