//! Lifecycle events broadcast by the plugin manager.

use serde::Serialize;

use crate::PluginId;
use crate::state::PluginState;

/// Default channel capacity for lifecycle events.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// A change in the set or state of managed plugins.
///
/// Receivers that fall behind by more than the channel capacity miss
/// events; [`PluginManager::records`](crate::PluginManager::records) always
/// has the current truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PluginEvent {
    /// A plugin entered a new state. `from` is `None` on discovery.
    StateChanged {
        /// The plugin.
        plugin_id: PluginId,
        /// Previous state.
        from: Option<PluginState>,
        /// New state.
        to: PluginState,
    },
    /// A plugin's record was removed.
    Discarded {
        /// The plugin.
        plugin_id: PluginId,
    },
}

impl PluginEvent {
    /// The plugin this event is about.
    #[must_use]
    pub fn plugin_id(&self) -> &PluginId {
        match self {
            Self::StateChanged { plugin_id, .. } | Self::Discarded { plugin_id } => plugin_id,
        }
    }
}
