//! Descriptor files
//!
//! A descriptor file holds the capability tree of a board along with its device id, in TOML or
//! JSON form. Payloads are written as hex strings, whitespace is ignored.
//!
//! ```toml
//! device_id = "093d7f32-cdc6-4928-955d-513d17a85358"
//! format = "flags_payload"
//!
//! root = { and = [
//!   { or = [ { leaf = { id = "46dbc865-b4d0-466b-9b70-2f3f5b264e65", first_pipe = 1, pipe_count = 8 } } ] },
//!   { leaf = { id = "1d4738a0-fc34-4f71-aa73-57881b278cb1", first_pipe = 10, pipe_count = 1, payload = "01 01b40200" } },
//! ] }
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
};

use bytes::Bytes;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shupito_protocol::{descriptor::DEFAULT_VERSION, NodePath};
use thiserror::Error;
use uuid::Uuid;

use crate::{Descriptor, Leaf, LeafFormat, Node};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("couldn't read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid TOML descriptor file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid JSON descriptor file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{path}: invalid payload: {source}")]
    Payload {
        path: NodePath,
        source: hex::FromHexError,
    },
}

/// Main descriptor file
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DescriptorFile {
    /// Version byte written at the start of the descriptor
    #[serde(default = "default_version")]
    pub version: u8,

    /// Identifies the device model
    pub device_id: Uuid,

    /// Layout of every leaf in the tree
    #[serde(default)]
    pub format: LeafFormat,

    /// Root of the capability tree
    pub root: NodeConfig,
}

fn default_version() -> u8 {
    DEFAULT_VERSION
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum NodeConfig {
    /// All children are available at the same time
    And(Vec<NodeConfig>),
    /// One of the children is selected at runtime
    Or(Vec<NodeConfig>),
    Leaf(LeafConfig),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct LeafConfig {
    /// Capability identifier
    pub id: Uuid,
    pub first_pipe: u8,
    pub pipe_count: u8,
    #[serde(default)]
    pub flags: u8,
    /// Hex encoded capability configuration
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub payload: String,
}

impl DescriptorFile {
    /// Loads a descriptor file, `.json` files are parsed as JSON and everything else as TOML
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;

        let is_json = path
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("json"));
        let file = if is_json {
            Self::from_json(&text)?
        } else {
            Self::from_toml(&text)?
        };

        log::debug!("loaded descriptor file {}", path.display());
        Ok(file)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Builds the descriptor, decoding leaf payloads along the way
    pub fn to_descriptor(&self) -> Result<Descriptor, ConfigError> {
        let root = self.root.to_node(&mut NodePath::root())?;
        Ok(Descriptor::new(self.device_id, self.format, root).with_version(self.version))
    }
}

impl From<&Descriptor> for DescriptorFile {
    fn from(descriptor: &Descriptor) -> Self {
        Self {
            version: descriptor.version,
            device_id: descriptor.device_id,
            format: descriptor.format,
            root: NodeConfig::from(&descriptor.root),
        }
    }
}

impl NodeConfig {
    fn to_node(&self, path: &mut NodePath) -> Result<Node, ConfigError> {
        let children = |children: &[NodeConfig], path: &mut NodePath| {
            children
                .iter()
                .enumerate()
                .map(|(index, child)| {
                    path.0.push(index);
                    let node = child.to_node(path);
                    path.0.pop();
                    node
                })
                .collect::<Result<Vec<_>, _>>()
        };

        Ok(match self {
            NodeConfig::And(nodes) => Node::And(children(nodes, path)?),
            NodeConfig::Or(nodes) => Node::Or(children(nodes, path)?),
            NodeConfig::Leaf(leaf) => Node::Leaf(leaf.to_leaf(path)?),
        })
    }
}

impl From<&Node> for NodeConfig {
    fn from(node: &Node) -> Self {
        match node {
            Node::And(children) => NodeConfig::And(children.iter().map(Into::into).collect()),
            Node::Or(children) => NodeConfig::Or(children.iter().map(Into::into).collect()),
            Node::Leaf(leaf) => NodeConfig::Leaf(LeafConfig {
                id: leaf.capability_id,
                first_pipe: leaf.first_pipe,
                pipe_count: leaf.pipe_count,
                flags: leaf.flags,
                payload: hex::encode(&leaf.payload),
            }),
        }
    }
}

impl LeafConfig {
    fn to_leaf(&self, path: &NodePath) -> Result<Leaf, ConfigError> {
        let payload = parse_hex(&self.payload).map_err(|source| ConfigError::Payload {
            path: path.clone(),
            source,
        })?;

        Ok(Leaf::new(self.id, self.first_pipe, self.pipe_count)
            .with_flags(self.flags)
            .with_payload(payload))
    }
}

/// Decodes a hex string, ignoring any whitespace
pub fn parse_hex(s: &str) -> Result<Bytes, hex::FromHexError> {
    let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    Ok(hex::decode(compact)?.into())
}
