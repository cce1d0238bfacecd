//! Plugin descriptors and compatibility checks.
//!
//! A descriptor is the static metadata packaged with a plugin, read before
//! any plugin code runs. On disk it is a `plugin.toml` file:
//!
//! ```toml
//! [plugin]
//! id = "base64"
//! name = "Base64 Encoder"
//! version = "1.0.3"
//! author = "Telekit"
//! platform-version = ">=1.2, <2.0"
//! description = "Encode and decode Base64 text"
//! homepage = "https://example.org/base64"
//! ```
//!
//! `platform-version` accepts either a semver requirement or a bare version.
//! A bare version is a minimum: `"1.2.0"` means `">=1.2.0"`.

use semver::{Version, VersionReq};
use serde::{Deserialize, Serialize};

use crate::PluginId;
use crate::error::{PluginError, PluginResult};

/// Standard plugin descriptor file name.
pub const DESCRIPTOR_FILE_NAME: &str = "plugin.toml";

/// Static, pre-instantiation metadata about a plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginDescriptor {
    id: PluginId,
    name: String,
    version: Version,
    author: Option<String>,
    platform_version: Option<VersionReq>,
    description: Option<String>,
    homepage: Option<String>,
}

impl PluginDescriptor {
    /// Create a descriptor with the required fields and no requirement on
    /// the host platform.
    #[must_use]
    pub fn new(id: PluginId, name: impl Into<String>, version: Version) -> Self {
        Self {
            id,
            name: name.into(),
            version,
            author: None,
            platform_version: None,
            description: None,
            homepage: None,
        }
    }

    /// Set the author.
    #[must_use]
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Set the required host platform version range.
    #[must_use]
    pub fn with_platform_version(mut self, requirement: VersionReq) -> Self {
        self.platform_version = Some(requirement);
        self
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the homepage.
    #[must_use]
    pub fn with_homepage(mut self, homepage: impl Into<String>) -> Self {
        self.homepage = Some(homepage.into());
        self
    }

    /// The plugin's id.
    #[must_use]
    pub fn id(&self) -> &PluginId {
        &self.id
    }

    /// The plugin's display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The plugin's own version.
    #[must_use]
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// The plugin's author.
    #[must_use]
    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    /// The host platform versions this plugin supports, `None` if any.
    #[must_use]
    pub fn platform_version(&self) -> Option<&VersionReq> {
        self.platform_version.as_ref()
    }

    /// The plugin's description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The plugin's homepage.
    #[must_use]
    pub fn homepage(&self) -> Option<&str> {
        self.homepage.as_deref()
    }
}

#[derive(Debug, Deserialize)]
struct RawDescriptorFile {
    plugin: Option<RawDescriptor>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawDescriptor {
    id: Option<String>,
    name: Option<String>,
    version: Option<String>,
    author: Option<String>,
    platform_version: Option<String>,
    description: Option<String>,
    homepage: Option<String>,
}

/// Parse a descriptor from TOML text.
///
/// `origin` names the source in error messages (usually the file path).
///
/// # Errors
///
/// Returns [`PluginError::Malformed`] if the text is not valid TOML, the
/// `[plugin]` table or one of `id`, `name`, `version` is missing, or the
/// id, version or platform requirement cannot be parsed.
pub fn parse_descriptor(content: &str, origin: &str) -> PluginResult<PluginDescriptor> {
    let file: RawDescriptorFile =
        toml::from_str(content).map_err(|e| PluginError::malformed(origin, e.message()))?;
    let raw = file
        .plugin
        .ok_or_else(|| PluginError::malformed(origin, "missing [plugin] table"))?;

    let id = required(raw.id, "id", origin)?;
    let id = PluginId::new(id).map_err(|e| PluginError::malformed(origin, e.to_string()))?;
    let name = required(raw.name, "name", origin)?;
    let version = required(raw.version, "version", origin)?;
    let version = Version::parse(&version)
        .map_err(|e| PluginError::malformed(origin, format!("invalid version `{version}`: {e}")))?;

    let platform_version = match raw.platform_version.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(req) => Some(parse_platform_requirement(req).map_err(|e| {
            PluginError::malformed(origin, format!("invalid platform-version `{req}`: {e}"))
        })?),
    };

    Ok(PluginDescriptor {
        id,
        name,
        version,
        author: non_blank(raw.author),
        platform_version,
        description: non_blank(raw.description),
        homepage: non_blank(raw.homepage),
    })
}

/// Parse a platform requirement, treating a bare version as a minimum.
///
/// # Errors
///
/// Returns the semver error if `text` is neither a version nor a
/// requirement.
pub fn parse_platform_requirement(text: &str) -> Result<VersionReq, semver::Error> {
    let text = text.trim();
    match Version::parse(text) {
        Ok(minimum) => VersionReq::parse(&format!(">={minimum}")),
        Err(_) => VersionReq::parse(text),
    }
}

/// Whether a plugin may run on the given host platform version.
///
/// Plugins without a platform requirement are always compatible. A
/// pre-release or build-tagged host (`1.5.0-SNAPSHOT`, `2.0.0-rc.1`) is
/// checked as its release version, since semver requirements otherwise
/// never match pre-releases.
#[must_use]
pub fn check_compatible(descriptor: &PluginDescriptor, host_version: &Version) -> bool {
    descriptor.platform_version().is_none_or(|req| {
        if req.matches(host_version) {
            return true;
        }
        let release = Version::new(host_version.major, host_version.minor, host_version.patch);
        req.matches(&release)
    })
}

fn required(value: Option<String>, field: &str, origin: &str) -> PluginResult<String> {
    non_blank(value)
        .ok_or_else(|| PluginError::malformed(origin, format!("missing required field `{field}`")))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
