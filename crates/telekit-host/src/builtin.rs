//! Plugins compiled into the host.
//!
//! The encoding plugin ships with every host so that a fresh install has
//! working tools before any third-party plugin is added.

use std::sync::Arc;

use anyhow::Context;
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use semver::Version;
use telekit_di::{FnModule, Module};
use telekit_plugins::{ExtensionContribution, Plugin, PluginDescriptor, PluginId, ToolGroup};

use crate::entry::EntryPoints;
use crate::tool::Tool;

/// Id of the built-in encoding plugin.
pub const ENCODING_PLUGIN_ID: &str = "telekit.encoding";

/// Base64 alphabet used by the encoding tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Base64Alphabet {
    /// RFC 4648 standard alphabet.
    #[default]
    Standard,
    /// RFC 4648 URL-safe alphabet.
    UrlSafe,
}

impl Base64Alphabet {
    fn engine(self) -> &'static base64::engine::GeneralPurpose {
        match self {
            Self::Standard => &STANDARD,
            Self::UrlSafe => &URL_SAFE,
        }
    }
}

/// Encodes text as Base64.
#[derive(Debug)]
pub struct Base64Encoder {
    alphabet: Base64Alphabet,
}

impl Tool for Base64Encoder {
    fn name(&self) -> &str {
        "Base64 Encoder"
    }

    fn description(&self) -> &str {
        "Encode UTF-8 text as Base64"
    }

    fn run(&self, input: &str) -> anyhow::Result<String> {
        Ok(self.alphabet.engine().encode(input))
    }
}

/// Decodes Base64 into UTF-8 text.
#[derive(Debug)]
pub struct Base64Decoder {
    alphabet: Base64Alphabet,
}

impl Tool for Base64Decoder {
    fn name(&self) -> &str {
        "Base64 Decoder"
    }

    fn description(&self) -> &str {
        "Decode Base64 into UTF-8 text"
    }

    fn run(&self, input: &str) -> anyhow::Result<String> {
        let bytes = self
            .alphabet
            .engine()
            .decode(input.trim())
            .context("input is not valid Base64")?;
        String::from_utf8(bytes).context("decoded bytes are not UTF-8")
    }
}

/// Hex dump of UTF-8 text.
#[derive(Debug, Default)]
pub struct HexEncoder;

impl Tool for HexEncoder {
    fn name(&self) -> &str {
        "Hex Encoder"
    }

    fn description(&self) -> &str {
        "Encode UTF-8 text as lowercase hex"
    }

    fn run(&self, input: &str) -> anyhow::Result<String> {
        Ok(hex::encode(input))
    }
}

/// The built-in encoding plugin.
///
/// Its module binds the [`Base64Alphabet`]; the Base64 tools resolve it
/// from the container when they are created.
#[derive(Debug, Default)]
pub struct EncodingPlugin {
    alphabet: Base64Alphabet,
}

impl EncodingPlugin {
    /// Use a non-default alphabet.
    #[must_use]
    pub fn with_alphabet(alphabet: Base64Alphabet) -> Self {
        Self { alphabet }
    }

    /// The plugin's descriptor for a host of `host_version`.
    #[must_use]
    pub fn descriptor(host_version: &Version) -> PluginDescriptor {
        PluginDescriptor::new(
            PluginId::from_static(ENCODING_PLUGIN_ID),
            "Encoding Tools",
            host_version.clone(),
        )
        .with_author("Telekit")
        .with_description("Base64 and hex encoders")
    }
}

impl Plugin for EncodingPlugin {
    fn modules(&self) -> Vec<Arc<dyn Module>> {
        let alphabet = self.alphabet;
        vec![Arc::new(FnModule::new("telekit.encoding", move |binder| {
            binder.instance(Arc::new(alphabet));
            Ok(())
        }))]
    }

    fn extensions(&self) -> Vec<ExtensionContribution> {
        let group = ToolGroup::new("Encoding", 10);
        vec![
            ExtensionContribution::new::<dyn Tool, Base64Encoder, _>(|container| {
                let alphabet = container.resolve::<Base64Alphabet>()?;
                Ok(Arc::new(Base64Encoder { alphabet: *alphabet }) as Arc<dyn Tool>)
            })
            .with_group(group.clone()),
            ExtensionContribution::new::<dyn Tool, Base64Decoder, _>(|container| {
                let alphabet = container.resolve::<Base64Alphabet>()?;
                Ok(Arc::new(Base64Decoder { alphabet: *alphabet }) as Arc<dyn Tool>)
            })
            .with_group(group.clone()),
            ExtensionContribution::new::<dyn Tool, HexEncoder, _>(|_| {
                Ok(Arc::new(HexEncoder) as Arc<dyn Tool>)
            })
            .with_group(group),
        ]
    }
}

/// Entry points of every built-in plugin.
#[must_use]
pub fn entry_points() -> EntryPoints {
    let mut entry_points = EntryPoints::new();
    entry_points.register_default::<EncodingPlugin>(PluginId::from_static(ENCODING_PLUGIN_ID));
    entry_points
}

/// Descriptors of every built-in plugin.
#[must_use]
pub fn descriptors(host_version: &Version) -> Vec<PluginDescriptor> {
    vec![EncodingPlugin::descriptor(host_version)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_round_trips_through_both_tools() {
        let encoder = Base64Encoder {
            alphabet: Base64Alphabet::Standard,
        };
        let decoder = Base64Decoder {
            alphabet: Base64Alphabet::Standard,
        };
        let encoded = encoder.run("telekit").unwrap();
        assert_eq!(encoded, "dGVsZWtpdA==");
        assert_eq!(decoder.run(&encoded).unwrap(), "telekit");
    }

    #[test]
    fn url_safe_alphabet_avoids_plus_and_slash() {
        let encoder = Base64Encoder {
            alphabet: Base64Alphabet::UrlSafe,
        };
        assert_eq!(encoder.run("\u{fb}\u{ff}").unwrap(), "w7vDvw==");
        assert_eq!(
            Base64Encoder {
                alphabet: Base64Alphabet::Standard
            }
            .run("??>")
            .unwrap(),
            "Pz8+"
        );
        assert_eq!(encoder.run("??>").unwrap(), "Pz8-");
    }

    #[test]
    fn decoder_rejects_garbage() {
        let decoder = Base64Decoder {
            alphabet: Base64Alphabet::Standard,
        };
        let err = decoder.run("not base64!").unwrap_err();
        assert!(err.to_string().contains("not valid Base64"));
    }

    #[test]
    fn hex_encoder_is_lowercase() {
        assert_eq!(HexEncoder.run("Hi").unwrap(), "4869");
    }

    #[test]
    fn builtins_have_entry_points() {
        let version = Version::new(0, 1, 0);
        let entry_points = entry_points();
        for descriptor in descriptors(&version) {
            assert!(entry_points.contains(descriptor.id()));
        }
    }
}
