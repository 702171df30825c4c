//! Reference decoder for descriptor blobs
//!
//! Mirrors what the firmware does at boot: read a tag byte, then either the leaf fields or
//! the group's children. Used to inspect existing tables and to check the encoder against.

use bytes::{Buf, Bytes};
use thiserror::Error;

use crate::{
    checksum::{self, ChecksumError},
    tree::{LEAF_TAG, OR_MARKER},
    util::{TryBuf, TryBufError},
    Descriptor, Leaf, LeafFormat, Node,
};

/// Deepest nesting accepted from untrusted input
pub const MAX_DEPTH: usize = 64;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("truncated descriptor: {0}")]
    Truncated(#[from] TryBufError),

    #[error("{0}")]
    Checksum(#[from] ChecksumError),

    #[error("{count} trailing bytes after the capability tree")]
    TrailingBytes { count: usize },

    #[error("capability tree is nested deeper than 64 levels")]
    TooDeep,

    #[error("OR group has no children")]
    EmptyGroup,
}

/// Reads one node and its whole subtree from `buf`
pub fn decode_node(buf: &mut Bytes, format: LeafFormat) -> Result<Node, DecodeError> {
    decode_at_depth(buf, format, 0)
}

fn decode_at_depth(
    buf: &mut Bytes,
    format: LeafFormat,
    depth: usize,
) -> Result<Node, DecodeError> {
    if depth >= MAX_DEPTH {
        return Err(DecodeError::TooDeep);
    }

    let tag = buf.read_u8()?;
    if tag == LEAF_TAG {
        return Ok(Node::Leaf(decode_leaf(buf, format)?));
    }

    // Only 0x80 gets here, 0x00 is the leaf tag
    let count = (tag & !OR_MARKER) as usize;
    if count == 0 {
        return Err(DecodeError::EmptyGroup);
    }

    let children = (0..count)
        .map(|_| decode_at_depth(buf, format, depth + 1))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(if tag & OR_MARKER != 0 {
        Node::Or(children)
    } else {
        Node::And(children)
    })
}

fn decode_leaf(buf: &mut Bytes, format: LeafFormat) -> Result<Leaf, DecodeError> {
    let flags = if format.has_flags() {
        buf.read_u8()?
    } else {
        0
    };
    let capability_id = buf.read_uuid()?;
    let first_pipe = buf.read_u8()?;
    let pipe_count = buf.read_u8()?;
    let payload = if format.has_payload() {
        let len = buf.read_u8()? as usize;
        buf.read_bytes(len)?
    } else {
        Bytes::new()
    };

    Ok(Leaf {
        capability_id,
        first_pipe,
        pipe_count,
        flags,
        payload,
    })
}

impl Descriptor {
    /// Parses an unframed descriptor blob, the whole input must be consumed
    pub fn from_bytes(mut buf: Bytes, format: LeafFormat) -> Result<Self, DecodeError> {
        let version = buf.read_u8()?;
        let device_id = buf.read_uuid()?;
        let root = decode_node(&mut buf, format)?;

        if buf.has_remaining() {
            return Err(DecodeError::TrailingBytes {
                count: buf.remaining(),
            });
        }

        Ok(Self {
            version,
            device_id,
            format,
            root,
        })
    }

    /// Verifies the trailing checksum, then parses the descriptor
    pub fn from_framed_bytes(framed: Bytes, format: LeafFormat) -> Result<Self, DecodeError> {
        Self::from_bytes(checksum::unframe(framed)?, format)
    }
}
