//! Capability descriptor encoding for Shupito programmers.
//!
//! Firmware images carry a small table describing which capabilities the device offers and
//! which communication pipes each of them occupies. This crate builds that table from a
//! [`Node`] tree, frames it with its checksum and renders it as C source.
//!
//! It doesn't perform any I/O, file handling lives in the `shupito-tools` crate.

mod util;
pub use util::{TryBuf, TryBufError};

pub mod tree;
pub use tree::{encode, EncodeError, Leaf, LeafFormat, Node, NodePath};

pub mod descriptor;
pub use descriptor::{assemble, functional_descriptor, Descriptor};

pub mod checksum;
pub use checksum::ChecksumError;

pub mod decode;
pub use decode::DecodeError;

pub mod render;

pub mod dfu;

#[cfg(feature = "devices")]
pub mod device;
