//! Plugin lifecycle states and records.

use std::fmt;
use std::time::SystemTime;

use serde::Serialize;

use crate::PluginId;
use crate::descriptor::PluginDescriptor;

/// The lifecycle state of a plugin.
///
/// ```text
/// DISCOVERED -> INSTALLED -> LOADED -> STARTED -> STOPPED
///      |            |           |         |
///      +------------+-----------+---------+--> FAILED
/// ```
///
/// `DISABLED` is entered instead of `INSTALLED` for plugins the user has
/// switched off, and by [`disable`](crate::PluginManager::disable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PluginState {
    /// Descriptor parsed, nothing validated or executed yet.
    Discovered,
    /// Compatibility accepted.
    Installed,
    /// Entry point constructed; modules and extensions are wired.
    Loaded,
    /// Start hook completed.
    Started,
    /// Stopped and unwired.
    Stopped,
    /// A lifecycle step failed; see the record's failure.
    Failed,
    /// Switched off by the user.
    Disabled,
}

impl PluginState {
    /// Whether the plugin's modules and extensions are currently wired.
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Loaded | Self::Started)
    }

    /// Upper-case label, as shown to users.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Discovered => "DISCOVERED",
            Self::Installed => "INSTALLED",
            Self::Loaded => "LOADED",
            Self::Started => "STARTED",
            Self::Stopped => "STOPPED",
            Self::Failed => "FAILED",
            Self::Disabled => "DISABLED",
        }
    }
}

impl fmt::Display for PluginState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The lifecycle step at which a plugin failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureStage {
    /// Compatibility check.
    Install,
    /// Entry point construction or wiring.
    Load,
    /// Start hook.
    Start,
    /// Stop hook.
    Stop,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Install => "install",
            Self::Load => "load",
            Self::Start => "start",
            Self::Stop => "stop",
        })
    }
}

/// Recorded cause of a plugin failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginFailure {
    /// Where it failed.
    pub stage: FailureStage,
    /// Human-readable reason.
    pub message: String,
}

impl fmt::Display for PluginFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.stage, self.message)
    }
}

/// Snapshot of what the manager knows about one plugin.
#[derive(Debug, Clone, Serialize)]
pub struct PluginRecord {
    /// The plugin's descriptor.
    pub descriptor: PluginDescriptor,
    /// Current state.
    pub state: PluginState,
    /// Last recorded failure, if any.
    ///
    /// Kept after a failed stop hook even though the plugin ends `STOPPED`.
    pub failure: Option<PluginFailure>,
    /// When the state last changed.
    pub changed_at: SystemTime,
    /// Names of the modules the plugin contributes to the container.
    ///
    /// Empty unless the plugin is wired.
    pub modules: Vec<String>,
    /// Extensions the plugin contributes, in registration order.
    pub extensions: Vec<ContributedExtension>,
}

/// One extension contributed by a wired plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContributedExtension {
    /// Type name of the extension point.
    pub point: &'static str,
    /// Type name of the implementation.
    pub implementation: &'static str,
}

impl PluginRecord {
    /// The plugin's id.
    #[must_use]
    pub fn id(&self) -> &PluginId {
        self.descriptor.id()
    }
}

/// A failed plugin as reported to users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureReport {
    /// The plugin's id.
    pub plugin_id: PluginId,
    /// The plugin's display name.
    pub name: String,
    /// Why it failed.
    pub failure: PluginFailure,
}
