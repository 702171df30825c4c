//! Capability tree and its tagged pre-order encoding
//!
//! Every node starts with a tag byte. A leaf is tagged `0x00`, an AND group with its child
//! count, and an OR group with its child count with the high bit set. Children follow their
//! parent's tag in order.

use core::fmt;

use bytes::{BufMut, Bytes, BytesMut};
#[cfg(feature = "use_serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Tag byte introducing a leaf
pub const LEAF_TAG: u8 = 0x00;

/// Bit set in the tag byte of OR groups
pub const OR_MARKER: u8 = 0x80;

/// Largest child count a group tag can carry
pub const MAX_GROUP_CHILDREN: usize = 0x7f;

/// Largest payload a leaf can carry, its length is stored in a single byte
pub const MAX_PAYLOAD_LEN: usize = 0xff;

/// Selects which fields a leaf serializes.
///
/// This is a property of the descriptor format, not of the individual nodes: every leaf in a
/// tree is written with the same layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[derive(strum::EnumString, strum::Display, strum::EnumVariantNames)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(
    feature = "use_serde",
    derive(Serialize, Deserialize, schemars::JsonSchema)
)]
#[cfg_attr(feature = "use_serde", serde(rename_all = "snake_case"))]
pub enum LeafFormat {
    /// `tag, uuid, first_pipe, pipe_count`
    Plain,
    /// `tag, flags, uuid, first_pipe, pipe_count`
    Flags,
    /// `tag, flags, uuid, first_pipe, pipe_count, payload_len, payload`
    #[default]
    FlagsPayload,
}

impl LeafFormat {
    pub fn has_flags(self) -> bool {
        matches!(self, LeafFormat::Flags | LeafFormat::FlagsPayload)
    }

    pub fn has_payload(self) -> bool {
        matches!(self, LeafFormat::FlagsPayload)
    }
}

/// A node of the capability tree
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    /// All children are present at the same time
    And(Vec<Node>),
    /// Exactly one child is selected at runtime, by position
    Or(Vec<Node>),
    /// A single capability
    Leaf(Leaf),
}

/// Describes one addressable device capability and the pipes it occupies
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Leaf {
    pub capability_id: Uuid,
    pub first_pipe: u8,
    pub pipe_count: u8,
    pub flags: u8,
    /// Capability specific configuration blob, opaque to the encoder
    pub payload: Bytes,
}

impl Leaf {
    pub fn new(capability_id: Uuid, first_pipe: u8, pipe_count: u8) -> Self {
        Self {
            capability_id,
            first_pipe,
            pipe_count,
            flags: 0,
            payload: Bytes::new(),
        }
    }

    pub fn with_flags(mut self, flags: u8) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_payload(mut self, payload: impl Into<Bytes>) -> Self {
        self.payload = payload.into();
        self
    }

    fn write(
        &self,
        buf: &mut BytesMut,
        format: LeafFormat,
        path: &NodePath,
    ) -> Result<(), EncodeError> {
        let invalid = |reason| EncodeError::InvalidInput {
            path: path.clone(),
            reason,
        };

        if !format.has_flags() && self.flags != 0 {
            return Err(invalid(InputError::FlagsUnsupported {
                flags: self.flags,
                format,
            }));
        }
        if !format.has_payload() && !self.payload.is_empty() {
            return Err(invalid(InputError::PayloadUnsupported {
                len: self.payload.len(),
                format,
            }));
        }
        if self.payload.len() > MAX_PAYLOAD_LEN {
            return Err(invalid(InputError::PayloadTooLong {
                len: self.payload.len(),
            }));
        }

        buf.put_u8(LEAF_TAG);
        if format.has_flags() {
            buf.put_u8(self.flags);
        }
        buf.extend_from_slice(self.capability_id.as_bytes());
        buf.put_u8(self.first_pipe);
        buf.put_u8(self.pipe_count);
        if format.has_payload() {
            buf.put_u8(self.payload.len() as u8);
            buf.extend_from_slice(&self.payload);
        }

        Ok(())
    }
}

impl From<Leaf> for Node {
    fn from(leaf: Leaf) -> Self {
        Node::Leaf(leaf)
    }
}

impl Node {
    /// Number of leaves in this subtree
    pub fn leaf_count(&self) -> usize {
        match self {
            Node::And(children) | Node::Or(children) => {
                children.iter().map(Node::leaf_count).sum()
            }
            Node::Leaf(_) => 1,
        }
    }

    /// Appends the encoding of this subtree to `buf`.
    ///
    /// `path` locates this node from the root and is used in error reports. On failure, `buf`
    /// may hold a partially written subtree.
    pub fn write(
        &self,
        buf: &mut BytesMut,
        format: LeafFormat,
        path: &mut NodePath,
    ) -> Result<(), EncodeError> {
        match self {
            Node::And(children) => write_group(buf, GroupKind::And, children, format, path),
            Node::Or(children) => write_group(buf, GroupKind::Or, children, format, path),
            Node::Leaf(leaf) => leaf.write(buf, format, path),
        }
    }
}

fn write_group(
    buf: &mut BytesMut,
    kind: GroupKind,
    children: &[Node],
    format: LeafFormat,
    path: &mut NodePath,
) -> Result<(), EncodeError> {
    if children.is_empty() {
        return Err(EncodeError::InvalidInput {
            path: path.clone(),
            reason: InputError::EmptyGroup(kind),
        });
    }
    if children.len() > MAX_GROUP_CHILDREN {
        return Err(EncodeError::EncodingOverflow {
            path: path.clone(),
            field: Field::Children(kind),
            value: children.len(),
            max: MAX_GROUP_CHILDREN,
        });
    }

    let count = children.len() as u8;
    buf.put_u8(match kind {
        GroupKind::And => count,
        GroupKind::Or => OR_MARKER | count,
    });

    for (index, child) in children.iter().enumerate() {
        path.0.push(index);
        child.write(buf, format, path)?;
        path.0.pop();
    }

    Ok(())
}

/// Encodes a capability tree, depth-first, left to right
pub fn encode(node: &Node, format: LeafFormat) -> Result<Bytes, EncodeError> {
    let mut buf = BytesMut::new();
    node.write(&mut buf, format, &mut NodePath::root())?;
    log::trace!(
        "encoded {} leaves into {} bytes ({})",
        node.leaf_count(),
        buf.len(),
        format
    );
    Ok(buf.freeze())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupKind {
    And,
    Or,
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GroupKind::And => "AND",
            GroupKind::Or => "OR",
        })
    }
}

/// Child indices leading from the root to a node, displayed as `root/0/2`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodePath(pub Vec<usize>);

impl NodePath {
    pub fn root() -> Self {
        Self::default()
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("root")?;
        for index in &self.0 {
            write!(f, "/{index}")?;
        }
        Ok(())
    }
}

/// A count or length field with a bounded width
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Children(GroupKind),
    FunctionalDescriptorLength,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Children(kind) => write!(f, "{kind} group child count"),
            Field::FunctionalDescriptorLength => f.write_str("functional descriptor length"),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("{0} group has no children")]
    EmptyGroup(GroupKind),

    #[error("payload is {len} bytes, its length field holds at most 255")]
    PayloadTooLong { len: usize },

    #[error("flags 0x{flags:02x} can't be stored in the {format} leaf format")]
    FlagsUnsupported { flags: u8, format: LeafFormat },

    #[error("a {len} byte payload can't be stored in the {format} leaf format")]
    PayloadUnsupported { len: usize, format: LeafFormat },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    #[error("{path}: {field} is {value}, at most {max} fit")]
    EncodingOverflow {
        path: NodePath,
        field: Field,
        value: usize,
        max: usize,
    },

    #[error("{path}: {reason}")]
    InvalidInput { path: NodePath, reason: InputError },
}

#[cfg(test)]
mod test {
    use hex_literal::hex;

    use super::*;

    fn leaf_a() -> Leaf {
        Leaf::new(Uuid::nil(), 1, 8)
    }

    fn leaf_b() -> Leaf {
        Leaf::new(
            Uuid::from_u128(0x1d4738a0_fc34_4f71_aa73_57881b278cb1),
            10,
            1,
        )
    }

    #[test]
    fn plain_leaf() {
        let encoded = encode(&leaf_a().into(), LeafFormat::Plain).unwrap();
        assert_eq!(encoded.len(), 19);
        assert_eq!(
            encoded[..],
            hex!("00 00000000000000000000000000000000 01 08")
        );
    }

    #[test]
    fn flags_leaf() {
        let leaf = leaf_b().with_flags(0x03);
        let encoded = encode(&leaf.into(), LeafFormat::Flags).unwrap();
        assert_eq!(
            encoded[..],
            hex!("00 03 1d4738a0fc344f71aa7357881b278cb1 0a 01")
        );
    }

    #[test]
    fn payload_leaf() {
        let leaf = leaf_b()
            .with_flags(0x03)
            .with_payload(hex!("01 01b40200").to_vec());
        let encoded = encode(&leaf.into(), LeafFormat::FlagsPayload).unwrap();
        assert_eq!(
            encoded[..],
            hex!("00 03 1d4738a0fc344f71aa7357881b278cb1 0a 01 05 0101b40200")
        );

        // An empty payload still carries its length byte
        let encoded = encode(&leaf_a().into(), LeafFormat::FlagsPayload).unwrap();
        assert_eq!(encoded.len(), 21);
        assert_eq!(encoded[20], 0);
    }

    #[test]
    fn and_group() {
        let format = LeafFormat::Plain;
        let a = encode(&leaf_a().into(), format).unwrap();
        let b = encode(&leaf_b().into(), format).unwrap();
        let tree = Node::And(vec![leaf_a().into(), leaf_b().into()]);

        let encoded = encode(&tree, format).unwrap();
        assert_eq!(encoded[0], 0x02);
        assert_eq!(&encoded[1..20], &a[..]);
        assert_eq!(&encoded[20..], &b[..]);
    }

    #[test]
    fn or_group() {
        let format = LeafFormat::Plain;
        let a = encode(&leaf_a().into(), format).unwrap();
        let encoded = encode(&Node::Or(vec![leaf_a().into()]), format).unwrap();
        assert_eq!(encoded[0], 0x81);
        assert_eq!(&encoded[1..], &a[..]);
    }

    #[test]
    fn nested_groups_are_preorder() {
        let tree = Node::And(vec![
            Node::Or(vec![leaf_a().into(), leaf_a().into()]),
            leaf_b().into(),
        ]);
        let encoded = encode(&tree, LeafFormat::Plain).unwrap();
        assert_eq!(encoded.len(), 1 + 1 + 3 * 19);
        assert_eq!(encoded[0], 0x02);
        assert_eq!(encoded[1], 0x82);
        assert_eq!(encoded[2], LEAF_TAG);
        assert_eq!(encoded[40], LEAF_TAG);
        assert_eq!(encoded[41], 0x1d);
    }

    #[test]
    fn largest_groups_fit() {
        let children = vec![Node::from(leaf_a()); MAX_GROUP_CHILDREN];
        let encoded = encode(&Node::Or(children.clone()), LeafFormat::Plain).unwrap();
        assert_eq!(encoded[0], 0xff);
        let encoded = encode(&Node::And(children), LeafFormat::Plain).unwrap();
        assert_eq!(encoded[0], 0x7f);
    }

    #[test]
    fn oversized_group_reports_path() {
        let children = vec![Node::from(leaf_a()); 128];
        let tree = Node::And(vec![leaf_b().into(), Node::Or(children)]);
        let err = encode(&tree, LeafFormat::Plain).unwrap_err();
        assert_eq!(
            err,
            EncodeError::EncodingOverflow {
                path: NodePath(vec![1]),
                field: Field::Children(GroupKind::Or),
                value: 128,
                max: 127,
            }
        );
        assert_eq!(
            err.to_string(),
            "root/1: OR group child count is 128, at most 127 fit"
        );
    }

    #[test]
    fn and_group_above_seven_bits_is_rejected() {
        let children = vec![Node::from(leaf_a()); 200];
        let err = encode(&Node::And(children), LeafFormat::Plain).unwrap_err();
        assert!(matches!(
            err,
            EncodeError::EncodingOverflow {
                field: Field::Children(GroupKind::And),
                value: 200,
                ..
            }
        ));
    }

    #[test]
    fn empty_group_is_rejected() {
        let err = encode(&Node::And(vec![]), LeafFormat::Plain).unwrap_err();
        assert_eq!(
            err,
            EncodeError::InvalidInput {
                path: NodePath::root(),
                reason: InputError::EmptyGroup(GroupKind::And),
            }
        );
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let leaf = leaf_a().with_payload(vec![0u8; 256]);
        let tree = Node::Or(vec![leaf_b().into(), leaf.into()]);
        let err = encode(&tree, LeafFormat::FlagsPayload).unwrap_err();
        assert_eq!(
            err,
            EncodeError::InvalidInput {
                path: NodePath(vec![1]),
                reason: InputError::PayloadTooLong { len: 256 },
            }
        );

        let leaf = leaf_a().with_payload(vec![0u8; 255]);
        let encoded = encode(&leaf.into(), LeafFormat::FlagsPayload).unwrap();
        assert_eq!(encoded[20], 0xff);
    }

    #[test]
    fn fields_missing_from_format_are_rejected() {
        let err = encode(&leaf_a().with_flags(1).into(), LeafFormat::Plain).unwrap_err();
        assert!(matches!(
            err,
            EncodeError::InvalidInput {
                reason: InputError::FlagsUnsupported { flags: 1, .. },
                ..
            }
        ));

        let err = encode(&leaf_a().with_payload(vec![1]).into(), LeafFormat::Flags).unwrap_err();
        assert!(matches!(
            err,
            EncodeError::InvalidInput {
                reason: InputError::PayloadUnsupported { len: 1, .. },
                ..
            }
        ));
    }

    #[test]
    fn format_names() {
        assert_eq!(
            "flags_payload".parse::<LeafFormat>().unwrap(),
            LeafFormat::FlagsPayload
        );
        assert_eq!(LeafFormat::Plain.to_string(), "plain");
        assert_eq!(LeafFormat::default(), LeafFormat::FlagsPayload);
    }
}
