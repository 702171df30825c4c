//! Descriptor blob assembly
//!
//! A descriptor is a version byte, the device UUID and the encoded capability tree. The
//! framed form adds the two checksum bytes the firmware validates at boot.

use bytes::{BufMut, Bytes, BytesMut};
use uuid::Uuid;

use crate::{
    checksum,
    tree::{self, Field, LeafFormat, Node, NodePath},
    EncodeError,
};

/// Version byte written by every known firmware variant
pub const DEFAULT_VERSION: u8 = 1;

/// Descriptor type of the vendor specific functional descriptor carrying the blob inside a USB
/// configuration descriptor
pub const FUNCTIONAL_DESCRIPTOR_TYPE: u8 = 75;

/// Identifies a device and the capability tree it exposes
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Descriptor {
    pub version: u8,
    pub device_id: Uuid,
    /// Layout of the leaves, not recorded in the blob itself
    pub format: LeafFormat,
    pub root: Node,
}

impl Descriptor {
    pub fn new(device_id: Uuid, format: LeafFormat, root: impl Into<Node>) -> Self {
        Self {
            version: DEFAULT_VERSION,
            device_id,
            format,
            root: root.into(),
        }
    }

    pub fn with_version(mut self, version: u8) -> Self {
        self.version = version;
        self
    }

    /// Returns the unframed descriptor blob
    pub fn to_bytes(&self) -> Result<Bytes, EncodeError> {
        assemble(self.version, self.device_id, &self.root, self.format)
    }

    /// Returns the descriptor blob followed by its checksum
    pub fn to_framed_bytes(&self) -> Result<Bytes, EncodeError> {
        Ok(checksum::frame(self.to_bytes()?))
    }
}

/// Concatenates the version byte, the device UUID and the encoded tree
pub fn assemble(
    version: u8,
    device_id: Uuid,
    root: &Node,
    format: LeafFormat,
) -> Result<Bytes, EncodeError> {
    let tree = tree::encode(root, format)?;

    let mut buf = BytesMut::with_capacity(17 + tree.len());
    buf.put_u8(version);
    buf.extend_from_slice(device_id.as_bytes());
    buf.extend_from_slice(&tree);

    log::debug!(
        "assembled descriptor v{} for {}: {} bytes",
        version,
        device_id,
        buf.len()
    );
    Ok(buf.freeze())
}

/// Wraps a framed descriptor in a `{length, type}` functional descriptor header
pub fn functional_descriptor<T: AsRef<[u8]>>(framed: T) -> Result<Bytes, EncodeError> {
    let framed = framed.as_ref();
    let len = framed.len() + 2;
    if len > u8::MAX as usize {
        return Err(EncodeError::EncodingOverflow {
            path: NodePath::root(),
            field: Field::FunctionalDescriptorLength,
            value: len,
            max: u8::MAX as usize,
        });
    }

    let mut buf = BytesMut::with_capacity(len);
    buf.put_u8(len as u8);
    buf.put_u8(FUNCTIONAL_DESCRIPTOR_TYPE);
    buf.extend_from_slice(framed);
    Ok(buf.freeze())
}
