//! Build-time tools for Shupito programmer firmwares.
//!
//! The byte level work (capability tree encoding, checksums, DFU framing) lives in
//! [`shupito_protocol`]. This crate adds what a build step needs around it: loading descriptor
//! files, reading Intel HEX and C source tables, and printing decoded descriptors.
//!
//! ```no_run
//! use shupito_tools::{config::DescriptorFile, protocol::render};
//!
//! fn main() -> anyhow::Result<()> {
//!     let descriptor = DescriptorFile::load("board.toml")?.to_descriptor()?;
//!     print!("{}", render::render(descriptor.to_framed_bytes()?));
//!     Ok(())
//! }
//! ```

pub use shupito_protocol as protocol;
pub use shupito_protocol::{Descriptor, Leaf, LeafFormat, Node};

pub mod config;
pub mod formats;
pub mod utils;
